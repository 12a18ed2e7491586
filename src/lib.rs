//! tasksim runs a server and a group of clients on their own threads
//!
//! Clients submit randomly timed task requests, the server drains them
//! periodically, and every step is written to a shared, timestamped log.
//! A single stop request winds all actors down and the main thread waits
//! until every one of them has exited.

pub mod actor;
pub use actor::{ActorLabel, ActorState, Event};

pub mod config;
pub use config::SimulationConfig;

mod error;
pub use error::{Error, Result};

pub mod log_sink;
pub use log_sink::{LogBuffer, LogLine, LogSink};

pub mod logging;

pub mod random;
pub use random::{Draw, DrawSource, FixedDraws, SharedRandomSource};

pub mod service;
pub use service::{NoopTaskService, QueuedTaskService, TaskId, TaskService};

pub mod shutdown;
pub use shutdown::{ActorGuard, ShutdownCoordinator};

pub mod simulation;
pub use simulation::{RunningSimulation, Simulation, SimulationContext};

pub mod time;

pub use tasksim_macros::test;
