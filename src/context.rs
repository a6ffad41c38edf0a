//! Capabilities for the nondeterministic builtins.
//!
//! `time()`, `formatTime()` and `random()` read the clock and the random
//! source through these traits instead of ambient global state, so tests
//! can pin them down.

use chrono::{FixedOffset, Local, Offset, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

pub trait Clock {
    /// Seconds since the Unix epoch.
    fn now(&self) -> i64;

    /// Offset used when formatting times as local time.
    fn local_offset(&self) -> FixedOffset;
}

pub trait RandomSource {
    /// Uniform in `[0, 1)`.
    fn next_f64(&self) -> f64;

    /// Uniform in `[0, bound)`; `bound` is positive.
    fn next_below(&self, bound: i64) -> i64;
}

/// The wall clock, formatting in the host's local time zone.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    fn local_offset(&self) -> FixedOffset {
        Local::now().offset().fix()
    }
}

/// A clock frozen at a given instant.
pub struct FixedClock {
    pub epoch_seconds: i64,
    pub offset: FixedOffset,
}

impl FixedClock {
    /// A frozen clock that formats in UTC.
    pub fn utc(epoch_seconds: i64) -> Self {
        FixedClock {
            epoch_seconds,
            offset: Utc.fix(),
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.epoch_seconds
    }

    fn local_offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Thread-local entropy from `rand`.
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }

    fn next_below(&self, bound: i64) -> i64 {
        rand::thread_rng().gen_range(0..bound)
    }
}

/// A reproducible random stream.
pub struct SeededRandom {
    rng: RefCell<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        SeededRandom {
            rng: RefCell::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&self) -> f64 {
        self.rng.borrow_mut().gen::<f64>()
    }

    fn next_below(&self, bound: i64) -> i64 {
        self.rng.borrow_mut().gen_range(0..bound)
    }
}

/// What builtins may observe beyond their arguments.
pub struct EvalContext {
    pub clock: Box<dyn Clock>,
    pub random: Box<dyn RandomSource>,
}

impl EvalContext {
    pub fn new(clock: impl Clock + 'static, random: impl RandomSource + 'static) -> Self {
        EvalContext {
            clock: Box::new(clock),
            random: Box::new(random),
        }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        EvalContext::new(SystemClock, ThreadRandom)
    }
}
