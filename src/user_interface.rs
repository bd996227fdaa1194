/*
 * The operator's side of the controller.
 *
 * Keystrokes arrive one at a time over the character channel and drive a small
 * menu: relay mode ignores everything except the way into motor control and
 * the restart key; the motor selector picks which motor the steering keys
 * apply to; the two control states turn `a`/`d` into port/starboard commands.
 *
 * Commands are latched. In a control state the last steering command stays in
 * force until another key arrives; only a key that is not a steering key puts
 * the motor back to neutral. The selector, on the other hand, forces both
 * motors to neutral on every pass, whether or not a key came in.
 */

use enum_ordinalize::Ordinalize;

use crate::command::Command;
use crate::config::UI_PERIOD;
use crate::io::CharacterChannel;
use crate::runtime::{Period, RestartReason, Step, TaskConfig, TaskCore, TaskStatus};
use crate::log_error;
use crate::shared::CommandSlot;

pub const CTRL_C: u8 = 0x03;
pub const ESCAPE: u8 = 0x1B;

#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum UiState {
    Relay = 0,
    MotorSelect = 1,
    BackControl = 2,
    FrontControl = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Front,
    Back,
}

pub struct UserInterfaceTask<'a, C: CharacterChannel> {
    core: TaskCore,
    serial: C,
    front: &'a CommandSlot,
    back: &'a CommandSlot,
}

impl<'a, C: CharacterChannel> UserInterfaceTask<'a, C> {
    pub fn new(task: TaskConfig, serial: C, front: &'a CommandSlot, back: &'a CommandSlot) -> Self {
        UserInterfaceTask {
            core: TaskCore::new(task),
            serial,
            front,
            back,
        }
    }

    pub fn state(&self) -> Option<UiState> {
        self.core.state()
    }

    pub fn status(&self) -> TaskStatus {
        self.core.status()
    }

    pub fn serial(&self) -> &C {
        &self.serial
    }

    pub fn serial_mut(&mut self) -> &mut C {
        &mut self.serial
    }

    #[cfg(any(test, feature = "mock"))]
    pub fn core_mut(&mut self) -> &mut TaskCore {
        &mut self.core
    }

    pub fn greet(&mut self) {
        self.serial.write_line("Press E for command mode");
    }

    /*
     * One pass: at most one keystroke is consumed. A restart request is
     * returned rather than acted on; whoever runs the task owns the reset.
     */
    pub fn step(&mut self) -> Step {
        let Some(state) = self.state() else {
            let raw = self.core.raw_state();
            log_error!("{}: illegal state {}", self.core.name(), raw);
            self.serial.write_line("Illegal state! Resetting");
            return Step::Restart(RestartReason::IllegalState(raw));
        };

        if state == UiState::MotorSelect {
            self.front.put(Command::Neutral);
            self.back.put(Command::Neutral);
        }

        let step = if self.serial.has_char() {
            let key = self.serial.read_char();
            self.dispatch(state, key)
        } else {
            Step::Continue
        };

        self.core.count_run();
        step
    }

    fn dispatch(&mut self, state: UiState, key: u8) -> Step {
        match state {
            UiState::Relay => match key {
                CTRL_C => {
                    log_error!("{}: restart requested by operator", self.core.name());
                    self.serial.write_line("Resetting");
                    return Step::Restart(RestartReason::OperatorRequest);
                }
                b'e' => {
                    self.serial.write_line("MOTOR CONTROL");
                    self.core.transition_to(UiState::MotorSelect);
                }
                _ => {}
            },
            UiState::MotorSelect => match key {
                b's' => {
                    self.serial.write_line("Moving back motor");
                    self.core.transition_to(UiState::BackControl);
                }
                b'w' => {
                    self.serial.write_line("Moving front motor");
                    self.core.transition_to(UiState::FrontControl);
                }
                b'q' | ESCAPE => {
                    self.serial.write_line("Exit command mode");
                    self.core.transition_to(UiState::Relay);
                }
                _ => {
                    self.serial.write_bytes(&[key]);
                    self.serial.write_line(":WTF?");
                }
            },
            UiState::BackControl => self.steer(Side::Back, key),
            UiState::FrontControl => self.steer(Side::Front, key),
        }
        Step::Continue
    }

    fn steer(&mut self, side: Side, key: u8) {
        let (slot, other_key, other_state, other_message) = match side {
            Side::Back => (self.back, b'w', UiState::FrontControl, "Moving front motor"),
            Side::Front => (self.front, b's', UiState::BackControl, "Moving back motor"),
        };

        match key {
            b'q' => {
                self.serial.write_line("Back to motor selector");
                self.core.transition_to(UiState::MotorSelect);
            }
            b'a' => {
                self.serial.write_line("Steering to port");
                slot.put(Command::SteerPort);
            }
            b'd' => {
                self.serial.write_line("Steering to starboard");
                slot.put(Command::SteerStarboard);
            }
            key if key == other_key => {
                self.serial.write_line(other_message);
                self.core.transition_to(other_state);
            }
            _ => slot.put(Command::Neutral),
        }
    }

    pub async fn run(mut self) -> RestartReason {
        self.greet();

        let mut period = Period::starting_now(UI_PERIOD);
        loop {
            if let Step::Restart(reason) = self.step() {
                // The operator has to see why before the board goes down.
                self.serial.flush().await;
                return reason;
            }
            period.delay_until().await;
        }
    }
}
