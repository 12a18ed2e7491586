use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const DEFAULT_NUMBER_OF_TASKS: u32 = 10;
pub const DEFAULT_NUMBER_OF_CLIENTS: u32 = 5;
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(100);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(10_000);
pub const DEFAULT_SERVER_PERIOD: Duration = Duration::from_millis(1000);
pub const DEFAULT_LOG_PATH: &str = "log.txt";

/// Parameters of a single simulation run
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Task ids are drawn from `0..number_of_tasks`
    pub number_of_tasks: u32,
    pub number_of_clients: u32,
    /// Bounds (inclusive) of a client's pause between two requests
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// How often the server drains pending requests
    pub server_period: Duration,
    pub log_path: PathBuf,
    /// Fixed seed for the shared generator; wall-clock time if unset
    pub seed: Option<u64>,
    /// Wake sleeping actors as soon as a stop is requested
    pub cancellable_sleep: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            number_of_tasks: DEFAULT_NUMBER_OF_TASKS,
            number_of_clients: DEFAULT_NUMBER_OF_CLIENTS,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            server_period: DEFAULT_SERVER_PERIOD,
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            seed: None,
            cancellable_sleep: true,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number_of_tasks(mut self, number_of_tasks: u32) -> Self {
        self.number_of_tasks = number_of_tasks;
        self
    }

    pub fn with_number_of_clients(mut self, number_of_clients: u32) -> Self {
        self.number_of_clients = number_of_clients;
        self
    }

    pub fn with_delay_range(mut self, min_delay: Duration, max_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self.max_delay = max_delay;
        self
    }

    pub fn with_server_period(mut self, server_period: Duration) -> Self {
        self.server_period = server_period;
        self
    }

    pub fn with_log_path(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.log_path = log_path.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_cancellable_sleep(mut self, cancellable_sleep: bool) -> Self {
        self.cancellable_sleep = cancellable_sleep;
        self
    }

    /// Total number of actors a run spawns (one server plus the clients)
    pub fn number_of_actors(&self) -> usize {
        1 + self.number_of_clients as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.number_of_tasks == 0 {
            return Err(Error::InvalidConfig(
                "number_of_tasks must be at least one".to_string(),
            ));
        }

        for (name, delay) in [("min_delay", self.min_delay), ("max_delay", self.max_delay)] {
            if delay.subsec_nanos() % 1_000_000 != 0 {
                return Err(Error::InvalidConfig(format!(
                    "{name} ({delay:?}) is not a whole number of milliseconds"
                )));
            }
        }

        if self.min_delay > self.max_delay {
            return Err(Error::InvalidConfig(format!(
                "min_delay ({:?}) exceeds max_delay ({:?})",
                self.min_delay, self.max_delay
            )));
        }

        if self.server_period.is_zero() {
            return Err(Error::InvalidConfig(
                "server_period must not be zero".to_string(),
            ));
        }

        Ok(())
    }
}
