/*
 * Drift-free periodic delay.
 *
 * A task sleeps until an absolute instant, `reference + period`, rather than
 * for `period` from whenever it happens to finish. How long the loop body took
 * therefore never shifts the schedule. If the body overran and the next wake
 * instant is already gone, the reference is re-anchored to now: the task runs
 * again straight away, once, instead of firing every missed period back to
 * back.
 */

use embassy_time::{Duration, Instant, Timer};

use crate::log_warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    reference: Instant,
    period: Duration,
    overruns: u32,
}

impl Period {
    pub const fn new(reference: Instant, period: Duration) -> Self {
        Period {
            reference,
            period,
            overruns: 0,
        }
    }

    pub fn starting_now(period: Duration) -> Self {
        Self::new(Instant::now(), period)
    }

    pub fn reference(&self) -> Instant {
        self.reference
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn overruns(&self) -> u32 {
        self.overruns
    }

    /*
     * Advances the reference and returns the instant to sleep until. Pure in
     * `now`, so the schedule can be checked without a clock.
     */
    pub fn next_wake(&mut self, now: Instant) -> Instant {
        let wake = self.reference + self.period;
        if wake < now {
            self.overruns = self.overruns.wrapping_add(1);
            log_warn!("period overrun by {} us", (now - wake).as_micros());
            self.reference = now;
        } else {
            self.reference = wake;
        }
        self.reference
    }

    // Sleep until the next absolute wake instant and return it.
    pub async fn delay_until(&mut self) -> Instant {
        let wake = self.next_wake(Instant::now());
        Timer::at(wake).await;
        wake
    }
}
