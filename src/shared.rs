/*
 * A single-slot mailbox shared between tasks.
 *
 * The producer overwrites the slot, consumers poll it. There is no queue and
 * no notification: a consumer that polls less often than the producer writes
 * only ever sees the most recent value. Every access goes through a blocking
 * critical-section mutex, so it is safe across executors of different
 * priority.
 */

use core::cell::Cell;

use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

use crate::command::Command;

pub struct SharedValue<T: Copy> {
    slot: Mutex<CriticalSectionRawMutex, Cell<Option<T>>>,
    default: T,
}

// The slot each motor polls for its steering command.
pub type CommandSlot = SharedValue<Command>;

impl<T: Copy> SharedValue<T> {
    /*
     * `default` is what `get` returns until the first `put`. Being `const`
     * lets the channels live in statics for the lifetime of the firmware.
     */
    pub const fn new(default: T) -> Self {
        SharedValue {
            slot: Mutex::new(Cell::new(None)),
            default,
        }
    }

    pub fn put(&self, value: T) {
        self.slot.lock(|slot| slot.set(Some(value)));
    }

    pub fn get(&self) -> T {
        self.slot.lock(|slot| slot.get()).unwrap_or(self.default)
    }

    // True once any producer has written, for diagnostics only.
    pub fn is_written(&self) -> bool {
        self.slot.lock(|slot| slot.get().is_some())
    }
}
