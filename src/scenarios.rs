/*
 * End-to-end runs of the whole controller on the host: one user interface,
 * two motors, the two command slots between them. Tasks are stepped in the
 * order the board would run them after a keystroke: the interface first, then
 * both motors on their next period.
 */

use embassy_futures::join::join3;
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Timer};

use crate::command::Command;
use crate::config::{BACK_MOTOR_TASK, DRIVE_INTENSITY, FRONT_MOTOR_TASK, MotorConfig, UI_TASK};
use crate::mock::{MockActuator, MockSerial, MockSupervisor};
use crate::motor::{MotorState, MotorTask};
use crate::runtime::{
    Launcher, Priority, RestartReason, Runnable, Runtime, RuntimeError, Step, Task, TaskConfig,
};
use crate::shared::CommandSlot;
use crate::user_interface::{CTRL_C, UiState, UserInterfaceTask};

type Slot = CommandSlot;
type Motor<'a> = MotorTask<'a, MockActuator>;
type Ui<'a> = UserInterfaceTask<'a, MockSerial>;

struct Robot<'a> {
    ui: Ui<'a>,
    front: Motor<'a>,
    back: Motor<'a>,
}

fn motor(task: TaskConfig, slot: &Slot) -> Motor<'_> {
    MotorTask::new(task, MotorConfig::default(), slot, MockActuator::new())
}

impl<'a> Robot<'a> {
    fn new(front: &'a Slot, back: &'a Slot) -> Self {
        let mut robot = Robot {
            ui: UserInterfaceTask::new(UI_TASK, MockSerial::new(), front, back),
            front: motor(FRONT_MOTOR_TASK, front),
            back: motor(BACK_MOTOR_TASK, back),
        };
        robot.ui.greet();
        robot.tick_motors();
        robot
    }

    fn tick_motors(&mut self) {
        self.front.step();
        self.back.step();
    }

    fn press(&mut self, key: u8) -> Step {
        self.ui.serial_mut().inject(&[key]);
        let step = self.ui.step();
        self.tick_motors();
        step
    }

    fn type_keys(&mut self, keys: &[u8]) {
        for &key in keys {
            assert_eq!(self.press(key), Step::Continue);
        }
    }
}

#[test]
fn steering_the_front_motor_to_port() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut robot = Robot::new(&front, &back);

    robot.press(b'e');
    assert_eq!(robot.ui.state(), Some(UiState::MotorSelect));
    robot.press(b'w');
    assert_eq!(robot.ui.state(), Some(UiState::FrontControl));
    robot.press(b'a');

    assert_eq!(front.get(), Command::SteerPort);
    assert_eq!(back.get(), Command::Neutral);

    assert_eq!(robot.front.state(), Some(MotorState::Port));
    assert_eq!(robot.front.driver().channel_a(), DRIVE_INTENSITY);
    assert_eq!(robot.front.driver().channel_b(), 0);

    assert_eq!(robot.back.state(), Some(MotorState::Stopped));
    assert_eq!(robot.back.driver().channel_a(), 0);
    assert_eq!(robot.back.driver().channel_b(), 0);
}

#[test]
fn unmatched_key_returns_the_front_motor_to_stopped() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut robot = Robot::new(&front, &back);

    robot.type_keys(b"ewa");
    assert_eq!(robot.front.state(), Some(MotorState::Port));

    robot.press(b'z');
    assert_eq!(front.get(), Command::Neutral);
    assert_eq!(robot.front.state(), Some(MotorState::Stopped));
    assert_eq!(robot.front.driver().channel_a(), 0);
}

#[test]
fn steering_latches_until_the_next_key() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut robot = Robot::new(&front, &back);

    robot.type_keys(b"esd");
    for _ in 0..20 {
        robot.ui.step();
        robot.tick_motors();
    }
    assert_eq!(robot.back.state(), Some(MotorState::Starboard));
    assert_eq!(robot.back.driver().channel_b(), DRIVE_INTENSITY);
}

#[test]
fn reversing_passes_through_stopped() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut robot = Robot::new(&front, &back);

    robot.type_keys(b"ewa");
    robot.press(b'd');
    // The slot already says starboard, the motor is still pulling to port.
    assert_eq!(front.get(), Command::SteerStarboard);
    assert_eq!(robot.front.state(), Some(MotorState::Port));

    robot.type_keys(b"xd");
    assert_eq!(robot.front.state(), Some(MotorState::Starboard));
}

#[test]
fn returning_to_the_selector_stops_both_motors() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut robot = Robot::new(&front, &back);

    robot.type_keys(b"ewasd");
    assert_eq!(robot.front.state(), Some(MotorState::Port));
    assert_eq!(robot.back.state(), Some(MotorState::Starboard));

    robot.press(b'q');
    assert_eq!(robot.ui.state(), Some(UiState::MotorSelect));
    // The selector clears the slots on its next pass.
    robot.ui.step();
    robot.tick_motors();

    assert_eq!(robot.front.state(), Some(MotorState::Stopped));
    assert_eq!(robot.back.state(), Some(MotorState::Stopped));
}

#[test]
fn ctrl_c_stops_processing_and_asks_for_a_restart() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut robot = Robot::new(&front, &back);

    assert_eq!(
        robot.press(CTRL_C),
        Step::Restart(RestartReason::OperatorRequest)
    );
    assert!(robot.ui.serial().output().ends_with("Resetting\r\n"));
}

#[test]
#[should_panic(expected = "restart requested: OperatorRequest")]
fn supervised_interface_restarts_on_ctrl_c() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut serial = MockSerial::new();
    serial.inject(&[CTRL_C]);
    let ui = UserInterfaceTask::new(UI_TASK, serial, &front, &back);
    let task: Task<'_, _, MockActuator> = Task::UserInterface(ui);

    match embassy_futures::block_on(crate::runtime::supervise(task, &mut MockSupervisor)) {}
}

#[test]
fn running_tasks_steer_the_front_motor_in_real_time() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut serial = MockSerial::new();
    let mut front_bridge = MockActuator::new();
    let mut back_bridge = MockActuator::new();
    // One key per UI period.
    serial.inject(b"ewa");

    let ui = UserInterfaceTask::new(UI_TASK, &mut serial, &front, &back);
    let config = MotorConfig::default();
    let front_motor = MotorTask::new(FRONT_MOTOR_TASK, config, &front, &mut front_bridge);
    let back_motor = MotorTask::new(BACK_MOTOR_TASK, config, &back, &mut back_bridge);

    let everything = join3(ui.run(), front_motor.run(), back_motor.run());
    let deadline = Timer::after(Duration::from_millis(80));
    let outcome = embassy_futures::block_on(select(everything, deadline));
    assert!(matches!(outcome, Either::Second(())));

    assert_eq!(front.get(), Command::SteerPort);
    assert_eq!(front_bridge.channel_a(), DRIVE_INTENSITY);
    assert_eq!(front_bridge.channel_b(), 0);
    assert_eq!(front_bridge.setups(), 1);

    assert_eq!(back.get(), Command::Neutral);
    assert_eq!(back_bridge.channel_a(), 0);
    assert_eq!(back_bridge.channel_b(), 0);
    assert!(back_bridge.is_enabled());

    assert_eq!(
        serial.output(),
        "Press E for command mode\r\nMOTOR CONTROL\r\nMoving front motor\r\nSteering to port\r\n"
    );
}

type RobotTask<'a> = Task<'a, MockSerial, MockActuator>;

#[derive(Default)]
struct Placement {
    high: std::vec::Vec<&'static str>,
    low: std::vec::Vec<&'static str>,
}

impl<'a> Launcher<RobotTask<'a>> for Placement {
    fn launch(&mut self, unit: RobotTask<'a>, priority: Priority) -> Result<(), RuntimeError> {
        let name = unit.status().name;
        if priority >= Priority::Control {
            self.high.push(name);
        } else {
            self.low.push(name);
        }
        Ok(())
    }
}

#[test]
fn startup_places_motors_above_the_interface() {
    let (front, back) = (Slot::new(Command::Neutral), Slot::new(Command::Neutral));
    let mut runtime: Runtime<RobotTask<'_>, { crate::config::MAX_TASKS }> = Runtime::new();

    runtime
        .register(UserInterfaceTask::new(UI_TASK, MockSerial::new(), &front, &back).into())
        .unwrap();
    runtime.register(motor(BACK_MOTOR_TASK, &back).into()).unwrap();
    runtime.register(motor(FRONT_MOTOR_TASK, &front).into()).unwrap();

    let mut placement = Placement::default();
    runtime.start(&mut placement).unwrap();

    assert_eq!(placement.high, ["BACK MOTOR", "FRONT MOTOR"]);
    assert_eq!(placement.low, ["UserInt"]);
}
