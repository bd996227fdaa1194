#![no_std]
#![no_main]

// Firmware entry: bring up the board, build the three tasks around the two
// command slots and hand them to the runtime. The motors run on an interrupt
// executor so they preempt the user interface in thread mode.

use embassy_executor::{InterruptExecutor, Spawner};
use embassy_stm32::gpio::{Level, Output, OutputType, Speed};
use embassy_stm32::interrupt;
use embassy_stm32::interrupt::{InterruptExt, Priority as InterruptPriority};
use embassy_stm32::time::hz;
use embassy_stm32::timer::low_level::CountingMode;
use embassy_stm32::timer::simple_pwm::{PwmPin, SimplePwm};
use embassy_stm32::usart::{self, Uart};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_sync::channel::Channel;
use panic_halt as _;
#[cfg(feature = "defmt")]
use defmt_rtt as _;

use steerbot::board::{
    BoardTask, ExecutorLauncher, HBridge, SerialInput, SerialOutput, SerialPort, serial_rx_task,
    serial_tx_task,
};
use steerbot::config::{self, MotorConfig};
use steerbot::io::CharacterChannel;
use steerbot::shared::CommandSlot;
use steerbot::{Command, MotorTask, Runtime, UserInterfaceTask};

static CONTROL_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[allow(non_snake_case)]
#[interrupt]
unsafe fn UART4() {
    unsafe { CONTROL_EXECUTOR.on_interrupt() }
}

static FRONT_COMMAND: CommandSlot = CommandSlot::new(Command::Neutral);
static BACK_COMMAND: CommandSlot = CommandSlot::new(Command::Neutral);

static SERIAL_INPUT: SerialInput = Channel::new();
static SERIAL_OUTPUT: SerialOutput = SerialOutput::new();

bind_interrupts!(struct Irqs {
    USART1 => usart::InterruptHandler<peripherals::USART1>;
});

// TIM3 runs at 20 kHz; each bridge gets two of its four channels.
const PWM_FREQUENCY_HZ: u32 = 20_000;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_stm32::init(Default::default());

    let mut uart_config = usart::Config::default();
    uart_config.baudrate = config::SERIAL_BAUD;
    let uart = Uart::new(
        p.USART1,
        p.PA10,
        p.PA9,
        Irqs,
        p.DMA1_CH4,
        p.DMA1_CH5,
        uart_config,
    )
    .unwrap();
    let (tx, rx) = uart.split();
    spawner.spawn(serial_rx_task(rx, &SERIAL_INPUT)).unwrap();
    spawner.spawn(serial_tx_task(tx, &SERIAL_OUTPUT)).unwrap();

    let mut serial = SerialPort::new(&SERIAL_INPUT, &SERIAL_OUTPUT);
    serial.write_line("Steering controller");

    let pwm = SimplePwm::new(
        p.TIM3,
        Some(PwmPin::new_ch1(p.PA6, OutputType::PushPull)),
        Some(PwmPin::new_ch2(p.PA7, OutputType::PushPull)),
        Some(PwmPin::new_ch3(p.PB0, OutputType::PushPull)),
        Some(PwmPin::new_ch4(p.PB1, OutputType::PushPull)),
        hz(PWM_FREQUENCY_HZ),
        CountingMode::EdgeAlignedUp,
    );
    let channels = pwm.split();
    let front_bridge = HBridge::new(
        channels.ch1,
        channels.ch2,
        Output::new(p.PB13, Level::Low, Speed::Low),
    );
    let back_bridge = HBridge::new(
        channels.ch3,
        channels.ch4,
        Output::new(p.PB15, Level::Low, Speed::Low),
    );

    let ui = UserInterfaceTask::new(config::UI_TASK, serial, &FRONT_COMMAND, &BACK_COMMAND);
    let back = MotorTask::new(
        config::BACK_MOTOR_TASK,
        MotorConfig::default(),
        &BACK_COMMAND,
        back_bridge,
    );
    let front = MotorTask::new(
        config::FRONT_MOTOR_TASK,
        MotorConfig::default(),
        &FRONT_COMMAND,
        front_bridge,
    );

    let mut runtime: Runtime<BoardTask, { config::MAX_TASKS }> = Runtime::new();
    runtime.register(ui.into()).unwrap();
    runtime.register(back.into()).unwrap();
    runtime.register(front.into()).unwrap();

    interrupt::UART4.set_priority(InterruptPriority::P6);
    let control = CONTROL_EXECUTOR.start(interrupt::UART4);

    let mut launcher = ExecutorLauncher::new(control, spawner);
    runtime.start(&mut launcher).unwrap();
}
