/*
 * What every task carries around, and the closed set of tasks this controller
 * runs.
 */

use core::future::Future;

use enum_ordinalize::Ordinalize;

use super::{Priority, Runnable};
use crate::io::{ActuatorDriver, CharacterChannel};
use crate::log_debug;
use crate::motor::MotorTask;
use crate::user_interface::UserInterfaceTask;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    pub name: &'static str,
    pub priority: Priority,
    pub stack_size: usize,
}

impl TaskConfig {
    pub const fn new(name: &'static str, priority: Priority, stack_size: usize) -> Self {
        TaskConfig {
            name,
            priority,
            stack_size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TaskStatus {
    pub name: &'static str,
    pub priority: Priority,
    pub stack_size: usize,
    pub state: u8,
    pub runs: u32,
}

/*
 * Why a task asked for the whole system to come back from reset.
 */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RestartReason {
    OperatorRequest,
    IllegalState(u8),
}

// Outcome of one pass through a task's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Restart(RestartReason),
}

/*
 * The state a task keeps is a raw ordinal, decoded into the task's own state
 * enum on every pass. A value that decodes to nothing is a corrupted state
 * and each task decides what that means for it.
 */
#[derive(Debug)]
pub struct TaskCore {
    config: TaskConfig,
    state: u8,
    runs: u32,
}

impl TaskCore {
    pub const fn new(config: TaskConfig) -> Self {
        TaskCore {
            config,
            state: 0,
            runs: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.config.name
    }

    pub fn state<S: Ordinalize<VariantType = u8>>(&self) -> Option<S> {
        S::from_ordinal(self.state)
    }

    pub fn raw_state(&self) -> u8 {
        self.state
    }

    pub fn transition_to<S: Ordinalize<VariantType = u8>>(&mut self, next: S) {
        let next = next.ordinal();
        log_debug!("{}: state {} -> {}", self.config.name, self.state, next);
        self.state = next;
    }

    pub fn count_run(&mut self) {
        self.runs = self.runs.wrapping_add(1);
    }

    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn status(&self) -> TaskStatus {
        TaskStatus {
            name: self.config.name,
            priority: self.config.priority,
            stack_size: self.config.stack_size,
            state: self.state,
            runs: self.runs,
        }
    }

    // Lets tests reach the corrupted-state branches.
    #[cfg(any(test, feature = "mock"))]
    pub fn force_raw_state(&mut self, state: u8) {
        self.state = state;
    }
}

/*
 * Every task the controller knows how to run. The two motors are two
 * instances of the same variant.
 */
pub enum Task<'a, C: CharacterChannel, A: ActuatorDriver> {
    UserInterface(UserInterfaceTask<'a, C>),
    Motor(MotorTask<'a, A>),
}

impl<'a, C: CharacterChannel, A: ActuatorDriver> Runnable for Task<'a, C, A> {
    fn status(&self) -> TaskStatus {
        match self {
            Task::UserInterface(task) => task.status(),
            Task::Motor(task) => task.status(),
        }
    }

    fn run(self) -> impl Future<Output = RestartReason> {
        async move {
            match self {
                Task::UserInterface(task) => task.run().await,
                Task::Motor(task) => match task.run().await {},
            }
        }
    }
}

impl<'a, C: CharacterChannel, A: ActuatorDriver> From<UserInterfaceTask<'a, C>>
    for Task<'a, C, A>
{
    fn from(task: UserInterfaceTask<'a, C>) -> Self {
        Task::UserInterface(task)
    }
}

impl<'a, C: CharacterChannel, A: ActuatorDriver> From<MotorTask<'a, A>>
    for Task<'a, C, A>
{
    fn from(task: MotorTask<'a, A>) -> Self {
        Task::Motor(task)
    }
}
