/*
 * Timing, sizing and priority constants for the controller.
 *
 * Everything a board bring-up might want to tune lives here, so that the task
 * modules only ever talk about periods and intensities by name.
 */

use embassy_time::Duration;

use crate::runtime::{Priority, TaskConfig};

// The UI polls the operator roughly every 5 ms; motors run a 10 ms loop.
pub const UI_PERIOD: Duration = Duration::from_millis(5);
pub const MOTOR_PERIOD: Duration = Duration::from_millis(10);

// Motors wait once before their first iteration so the UI can print its
// banner undisturbed.
pub const MOTOR_SETTLE_DELAY: Duration = Duration::from_millis(10);

// PWM counts. The drive intensity is a fixed duty, never ramped.
pub const DRIVE_PERIOD: u16 = 1600;
pub const DRIVE_INTENSITY: u16 = 300;

pub const UI_PRIORITY: Priority = Priority::Interface;
pub const MOTOR_PRIORITY: Priority = Priority::Control;

// Per-task resource budget in bytes, carried for diagnostics.
pub const TASK_STACK_SIZE: usize = 260;

pub const MAX_TASKS: usize = 4;

pub const SERIAL_BAUD: u32 = 115_200;
pub const SERIAL_BUFFER_SIZE: usize = 32;

pub const WATCHDOG_TIMEOUT_US: u32 = 120_000;

pub const UI_TASK: TaskConfig = TaskConfig::new("UserInt", UI_PRIORITY, TASK_STACK_SIZE);
pub const BACK_MOTOR_TASK: TaskConfig =
    TaskConfig::new("BACK MOTOR", MOTOR_PRIORITY, TASK_STACK_SIZE);
pub const FRONT_MOTOR_TASK: TaskConfig =
    TaskConfig::new("FRONT MOTOR", MOTOR_PRIORITY, TASK_STACK_SIZE);

/*
 * Per-instance actuation settings for a motor task.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorConfig {
    pub drive_period: u16,
    pub drive_intensity: u16,
    pub period: Duration,
    pub settle_delay: Duration,
}

impl MotorConfig {
    pub const fn new() -> Self {
        MotorConfig {
            drive_period: DRIVE_PERIOD,
            drive_intensity: DRIVE_INTENSITY,
            period: MOTOR_PERIOD,
            settle_delay: MOTOR_SETTLE_DELAY,
        }
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self::new()
    }
}
