/*
 * Motor control task.
 *
 * One instance per motor. Each polls its own command slot every period and
 * drives its own actuator: stopped, pulling to port on channel A, or pulling to
 * starboard on channel B. Port and starboard never follow each other directly,
 * the command has to come back to neutral first, so the bridge is never asked
 * to reverse under load.
 */

use core::convert::Infallible;

use embassy_time::Timer;
use enum_ordinalize::Ordinalize;

use crate::command::Command;
use crate::config::MotorConfig;
use crate::io::ActuatorDriver;
use crate::runtime::{Period, TaskConfig, TaskCore, TaskStatus};
use crate::shared::CommandSlot;

#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum MotorState {
    Init,
    Stopped,
    Port,
    Starboard,
}

pub struct MotorTask<'a, A: ActuatorDriver> {
    core: TaskCore,
    config: MotorConfig,
    command: &'a CommandSlot,
    driver: A,
}

impl<'a, A: ActuatorDriver> MotorTask<'a, A> {
    pub fn new(task: TaskConfig, config: MotorConfig, command: &'a CommandSlot, driver: A) -> Self {
        MotorTask {
            core: TaskCore::new(task),
            config,
            command,
            driver,
        }
    }

    pub fn state(&self) -> Option<MotorState> {
        self.core.state()
    }

    pub fn status(&self) -> TaskStatus {
        self.core.status()
    }

    pub fn driver(&self) -> &A {
        &self.driver
    }

    #[cfg(any(test, feature = "mock"))]
    pub fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    /*
     * One pass of the state machine. Outputs are applied for the state we end
     * up in, so a drive channel is only ever non-zero while in `Port` or
     * `Starboard`.
     */
    pub fn step(&mut self) {
        let command = self.command.get();

        let next = match self.state() {
            Some(MotorState::Init) => {
                self.driver.setup(self.config.drive_period);
                self.driver.set_channel_a(0);
                self.driver.set_channel_b(0);
                self.driver.enable();
                Some(MotorState::Stopped)
            }
            Some(MotorState::Stopped) => match command {
                Command::SteerPort => Some(MotorState::Port),
                Command::SteerStarboard => Some(MotorState::Starboard),
                Command::Neutral => None,
            },
            Some(MotorState::Port | MotorState::Starboard) => {
                (command == Command::Neutral).then_some(MotorState::Stopped)
            }
            // Corrupted state: leave the outputs alone and carry on.
            None => None,
        };

        if let Some(next) = next {
            self.core.transition_to(next);
        }
        self.actuate();
        self.core.count_run();
    }

    fn actuate(&mut self) {
        let drive = self.config.drive_intensity;
        let (a, b) = match self.state() {
            Some(MotorState::Init | MotorState::Stopped) => (0, 0),
            Some(MotorState::Port) => (drive, 0),
            Some(MotorState::Starboard) => (0, drive),
            None => return,
        };
        self.driver.set_channel_a(a);
        self.driver.set_channel_b(b);
    }

    pub async fn run(mut self) -> Infallible {
        // Give the user interface a moment to greet the operator.
        Timer::after(self.config.settle_delay).await;

        // The schedule is anchored after settling, not at task entry. Anchored
        // at entry, the first wake would already be due when the first step
        // ends and would count as an overrun on every boot.
        let mut period = Period::starting_now(self.config.period);
        loop {
            self.step();
            period.delay_until().await;
        }
    }
}
