//! The single pseudo-random source shared by all clients
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SimulationConfig;
use crate::service::TaskId;

/// One client iteration's worth of randomness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Draw {
    pub delay: Duration,
    pub task: TaskId,
}

/// Where clients get their delays and task ids from
///
/// Implementations must hand out each pair as a unit, even when called
/// from many threads at once.
pub trait DrawSource: Send + Sync {
    fn draw_delay_and_task(&self) -> Draw;
}

/// A `StdRng` behind one lock
///
/// Delays are drawn in whole milliseconds from the closed interval
/// `[min_delay, max_delay]`, task ids from `[0, number_of_tasks)`.
pub struct SharedRandomSource {
    engine: Mutex<StdRng>,
    min_delay_ms: u64,
    max_delay_ms: u64,
    number_of_tasks: u32,
}

impl SharedRandomSource {
    /// Seeded from the wall clock
    pub fn from_time(min_delay: Duration, max_delay: Duration, number_of_tasks: u32) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since_epoch| since_epoch.as_secs())
            .unwrap_or_default();

        Self::with_seed(seed, min_delay, max_delay, number_of_tasks)
    }

    pub fn with_seed(
        seed: u64,
        min_delay: Duration,
        max_delay: Duration,
        number_of_tasks: u32,
    ) -> Self {
        // Round inwards so no draw falls outside the configured bounds
        let min_delay_ms = millis_ceil(min_delay);
        let max_delay_ms = millis_floor(max_delay);

        assert!(number_of_tasks > 0, "task universe must not be empty");
        assert!(
            min_delay_ms <= max_delay_ms,
            "delay range holds no whole millisecond"
        );

        log::debug!("Seeding shared random source with {seed}");

        Self {
            engine: Mutex::new(StdRng::seed_from_u64(seed)),
            min_delay_ms,
            max_delay_ms,
            number_of_tasks,
        }
    }

    /// Build the source a configuration asks for
    ///
    /// The configuration must have been validated.
    pub fn from_config(config: &SimulationConfig) -> Self {
        match config.seed {
            Some(seed) => Self::with_seed(
                seed,
                config.min_delay,
                config.max_delay,
                config.number_of_tasks,
            ),
            None => Self::from_time(config.min_delay, config.max_delay, config.number_of_tasks),
        }
    }
}

impl DrawSource for SharedRandomSource {
    fn draw_delay_and_task(&self) -> Draw {
        let (delay_ms, task) = {
            let mut engine = self.engine.lock();
            let delay_ms = engine.random_range(self.min_delay_ms..=self.max_delay_ms);
            let task = engine.random_range(0..self.number_of_tasks);
            (delay_ms, task)
        };

        Draw {
            delay: Duration::from_millis(delay_ms),
            task: TaskId::new(task),
        }
    }
}

/// Always the same delay, task ids cycling through `[0, number_of_tasks)`
///
/// Useful to replay a run with known timing.
pub struct FixedDraws {
    delay: Duration,
    number_of_tasks: u32,
    next_task: AtomicU32,
}

impl FixedDraws {
    pub fn new(delay: Duration, number_of_tasks: u32) -> Self {
        assert!(number_of_tasks > 0, "task universe must not be empty");

        Self {
            delay,
            number_of_tasks,
            next_task: AtomicU32::new(0),
        }
    }
}

impl DrawSource for FixedDraws {
    fn draw_delay_and_task(&self) -> Draw {
        let counter = self.next_task.fetch_add(1, Ordering::SeqCst);

        Draw {
            delay: self.delay,
            task: TaskId::new(counter % self.number_of_tasks),
        }
    }
}

fn millis_floor(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn millis_ceil(duration: Duration) -> u64 {
    let floor = millis_floor(duration);
    if duration.subsec_nanos() % 1_000_000 == 0 {
        floor
    } else {
        floor.saturating_add(1)
    }
}
