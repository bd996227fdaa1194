/*
 * The periodic task runtime.
 *
 * A fixed set of long-lived tasks is registered before anything runs. Starting
 * the runtime hands every task to a `Launcher`, highest priority first; on the
 * board the launcher puts high-priority tasks on an interrupt executor so they
 * preempt the thread-mode executor that runs the rest. Nothing can be added
 * once the runtime has started, and no task is ever torn down: the only way
 * out is a full restart through the `Supervisor`.
 */

pub mod period;
pub mod task;

use core::convert::Infallible;
use core::fmt;
use core::future::Future;

use enum_ordinalize::Ordinalize;

pub use period::Period;
pub use task::{RestartReason, Step, Task, TaskConfig, TaskCore, TaskStatus};

use crate::io::Supervisor;
use crate::{log_debug, log_info};

/*
 * Scheduling priority; higher preempts lower, equal priorities share their
 * executor round-robin.
 */
#[derive(Ordinalize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Priority {
    Idle = 0,
    Interface = 1,
    Control = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RuntimeError {
    TooManyTasks,
    AlreadyStarted,
    Spawn,
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::TooManyTasks => write!(f, "task table is full"),
            RuntimeError::AlreadyStarted => write!(f, "runtime already started"),
            RuntimeError::Spawn => write!(f, "executor refused to spawn task"),
        }
    }
}

/*
 * A schedulable unit. `run` is entered exactly once and only comes back when
 * the unit wants the whole system restarted.
 */
pub trait Runnable {
    fn status(&self) -> TaskStatus;
    fn run(self) -> impl Future<Output = RestartReason>;
}

/*
 * Puts a unit onto something that will poll it. The firmware launcher maps
 * priorities to executors; tests just record what they were given.
 */
pub trait Launcher<T> {
    fn launch(&mut self, unit: T, priority: Priority) -> Result<(), RuntimeError>;
}

pub struct Runtime<T, const N: usize> {
    units: [Option<(T, Priority)>; N],
    registered: usize,
    started: bool,
}

impl<T: Runnable, const N: usize> Runtime<T, N> {
    pub fn new() -> Self {
        Runtime {
            units: core::array::from_fn(|_| None),
            registered: 0,
            started: false,
        }
    }

    /*
     * Adds a unit to the run set. Its priority is the one in its own task
     * configuration, so the table and the task can never disagree.
     */
    pub fn register(&mut self, unit: T) -> Result<(), RuntimeError> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        let slot = self
            .units
            .iter_mut()
            .find(|slot| slot.is_none())
            .ok_or(RuntimeError::TooManyTasks)?;

        let status = unit.status();
        log_debug!(
            "registered {} at priority {}",
            status.name,
            status.priority.ordinal()
        );
        *slot = Some((unit, status.priority));
        self.registered += 1;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.registered
    }

    pub fn is_empty(&self) -> bool {
        self.registered == 0
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /*
     * Launch every registered unit in descending priority, keeping
     * registration order among equals. On the board this is the last thing
     * `main` does before the executors take over for good.
     */
    pub fn start<L: Launcher<T>>(&mut self, launcher: &mut L) -> Result<(), RuntimeError> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.started = true;

        while let Some(index) = self.next_to_launch() {
            if let Some((unit, priority)) = self.units[index].take() {
                let status = unit.status();
                log_info!(
                    "starting {} (priority {}, stack {})",
                    status.name,
                    priority.ordinal(),
                    status.stack_size
                );
                launcher.launch(unit, priority)?;
            }
        }
        Ok(())
    }

    fn next_to_launch(&self) -> Option<usize> {
        let mut best: Option<(usize, Priority)> = None;
        for (index, slot) in self.units.iter().enumerate() {
            if let Some((_, priority)) = slot {
                match best {
                    Some((_, best_priority)) if *priority <= best_priority => {}
                    _ => best = Some((index, *priority)),
                }
            }
        }
        best.map(|(index, _)| index)
    }
}

impl<T: Runnable, const N: usize> Default for Runtime<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/*
 * Poll a unit for as long as it runs and turn its exit into a restart. This
 * is the body of every executor task on the board.
 */
pub async fn supervise<T: Runnable, S: Supervisor>(unit: T, supervisor: &mut S) -> Infallible {
    let name = unit.status().name;
    let reason = unit.run().await;
    log_info!("{} gave up, restarting", name);
    supervisor.restart(reason)
}
