/*
 * The board side of the controller.
 *
 * This module is the only part of the crate that touches the HAL. It provides
 * the H-bridge actuators on TIM3, the operator's serial link on USART1, the
 * watchdog restart and the two executor tasks that every runtime unit ends up
 * running in. Tasks exchange serial bytes with the pump tasks through
 * channels, so the user interface never awaits the UART itself.
 */

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_executor::{SendSpawner, Spawner};
use embassy_stm32::gpio::Output;
use embassy_stm32::mode::Async;
use embassy_stm32::peripherals::{IWDG, TIM3};
use embassy_stm32::timer::simple_pwm::SimplePwmChannel;
use embassy_stm32::usart::{UartRx, UartTx};
use embassy_stm32::wdg::IndependentWatchdog;
use embassy_sync::{
    blocking_mutex::raw::ThreadModeRawMutex,
    channel::Channel,
    pipe::Pipe,
};
use embassy_time::{Duration, Timer};

use crate::config::{MOTOR_PRIORITY, SERIAL_BUFFER_SIZE, WATCHDOG_TIMEOUT_US};
use crate::io::{ActuatorDriver, CharacterChannel, Supervisor};
use crate::runtime::{Launcher, Priority, RestartReason, RuntimeError, Task, supervise};
use crate::{log_error, log_warn};

pub type SerialInput = Channel<ThreadModeRawMutex, u8, SERIAL_BUFFER_SIZE>;

// How often a flush re-checks whether the transmitter has gone idle.
const FLUSH_POLL: Duration = Duration::from_micros(100);

/*
 * Bytes waiting for the UART, plus whether the pump is in the middle of
 * sending a chunk it already took out of the pipe. Both are only touched from
 * thread mode.
 */
pub struct SerialOutput {
    pipe: Pipe<ThreadModeRawMutex, SERIAL_BUFFER_SIZE>,
    sending: AtomicBool,
}

impl SerialOutput {
    pub const fn new() -> Self {
        SerialOutput {
            pipe: Pipe::new(),
            sending: AtomicBool::new(false),
        }
    }

    fn is_idle(&self) -> bool {
        self.pipe.is_empty() && !self.sending.load(Ordering::Acquire)
    }
}

impl Default for SerialOutput {
    fn default() -> Self {
        Self::new()
    }
}

pub type BoardTask = Task<'static, SerialPort, HBridge>;

/*
 * Two PWM channels of one timer, one per steering direction, plus the
 * driver's enable line. Intensities are scaled from the drive period the
 * motor task configured onto whatever the timer actually runs at.
 */
pub struct HBridge {
    port: SimplePwmChannel<'static, TIM3>,
    starboard: SimplePwmChannel<'static, TIM3>,
    enable: Output<'static>,
    drive_period: u16,
}

impl HBridge {
    pub fn new(
        port: SimplePwmChannel<'static, TIM3>,
        starboard: SimplePwmChannel<'static, TIM3>,
        enable: Output<'static>,
    ) -> Self {
        HBridge {
            port,
            starboard,
            enable,
            drive_period: 1,
        }
    }
}

impl ActuatorDriver for HBridge {
    fn setup(&mut self, drive_period: u16) {
        self.drive_period = drive_period.max(1);
        self.port.set_duty_cycle(0);
        self.starboard.set_duty_cycle(0);
        self.port.enable();
        self.starboard.enable();
    }

    fn set_channel_a(&mut self, intensity: u16) {
        self.port
            .set_duty_cycle_fraction(intensity.min(self.drive_period), self.drive_period);
    }

    fn set_channel_b(&mut self, intensity: u16) {
        self.starboard
            .set_duty_cycle_fraction(intensity.min(self.drive_period), self.drive_period);
    }

    fn enable(&mut self) {
        self.enable.set_high();
    }
}

/*
 * The user interface's end of the serial link. Output that does not fit the
 * pipe is dropped: the operator loses some text, the control loop never
 * stalls on the UART.
 */
pub struct SerialPort {
    input: &'static SerialInput,
    output: &'static SerialOutput,
}

impl SerialPort {
    pub fn new(input: &'static SerialInput, output: &'static SerialOutput) -> Self {
        SerialPort { input, output }
    }
}

impl CharacterChannel for SerialPort {
    fn has_char(&self) -> bool {
        !self.input.is_empty()
    }

    fn read_char(&mut self) -> u8 {
        self.input.try_receive().unwrap_or(0)
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        while !rest.is_empty() {
            match self.output.pipe.try_write(rest) {
                Ok(written) => rest = &rest[written..],
                Err(_) => break,
            }
        }
    }

    // Wait for the pump to drain the pipe and finish its last chunk.
    async fn flush(&mut self) {
        while !self.output.is_idle() {
            Timer::after(FLUSH_POLL).await;
        }
    }
}

#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: UartRx<'static, Async>, input: &'static SerialInput) -> ! {
    let mut byte = [0u8; 1];
    loop {
        match rx.read(&mut byte).await {
            Ok(()) => input.send(byte[0]).await,
            Err(_) => log_warn!("serial receive error"),
        }
    }
}

#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: UartTx<'static, Async>, output: &'static SerialOutput) -> ! {
    let mut buffer = [0u8; SERIAL_BUFFER_SIZE];
    loop {
        let len = output.pipe.read(&mut buffer).await;
        // No await between taking the chunk and marking it in flight, so a
        // flush on this executor never sees the gap.
        output.sending.store(true, Ordering::Release);
        if tx.write(&buffer[..len]).await.is_err() {
            log_warn!("serial transmit error");
        }
        output.sending.store(false, Ordering::Release);
    }
}

/*
 * Arms the independent watchdog with a short timeout and waits for it to
 * bite. The watchdog is only ever touched on this path, so taking the
 * peripheral here cannot collide with anyone else. Whatever the task wanted
 * the operator to see has already been flushed by the time we get here.
 */
#[derive(Debug, Default, Clone, Copy)]
pub struct WatchdogSupervisor;

impl Supervisor for WatchdogSupervisor {
    fn restart(&mut self, reason: RestartReason) -> ! {
        log_error!("restarting: {:?}", reason);
        let iwdg = unsafe { IWDG::steal() };
        let mut watchdog = IndependentWatchdog::new(iwdg, WATCHDOG_TIMEOUT_US);
        watchdog.unleash();
        loop {
            cortex_m::asm::nop();
        }
    }
}

#[embassy_executor::task(pool_size = 2)]
async fn control_task(task: BoardTask) -> ! {
    match supervise(task, &mut WatchdogSupervisor).await {}
}

#[embassy_executor::task]
async fn interface_task(task: BoardTask) -> ! {
    match supervise(task, &mut WatchdogSupervisor).await {}
}

/*
 * Motor-priority units go to the interrupt executor and preempt whatever the
 * thread-mode executor is doing; the rest share thread mode.
 */
pub struct ExecutorLauncher {
    control: SendSpawner,
    interface: Spawner,
}

impl ExecutorLauncher {
    pub fn new(control: SendSpawner, interface: Spawner) -> Self {
        ExecutorLauncher { control, interface }
    }
}

impl Launcher<BoardTask> for ExecutorLauncher {
    fn launch(&mut self, unit: BoardTask, priority: Priority) -> Result<(), RuntimeError> {
        let spawned = if priority >= MOTOR_PRIORITY {
            self.control.spawn(control_task(unit))
        } else {
            self.interface.spawn(interface_task(unit))
        };
        spawned.map_err(|_| RuntimeError::Spawn)
    }
}
