use std::any::Any;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::actor::{run_client, run_server, ActorLabel, Event};
use crate::config::SimulationConfig;
use crate::error::{Error, Result};
use crate::log_sink::LogSink;
use crate::random::{DrawSource, SharedRandomSource};
use crate::service::{QueuedTaskService, TaskService};
use crate::shutdown::ShutdownCoordinator;
use crate::time::ClockReference;

type ActorHandle = (ActorLabel, JoinHandle<Result<()>>);

/// Everything the actors of one run share
///
/// Built once by [`Simulation::start`] and handed to every actor thread.
pub struct SimulationContext {
    config: SimulationConfig,
    clock: ClockReference,
    draws: Arc<dyn DrawSource>,
    log: Arc<LogSink>,
    service: Arc<dyn TaskService>,
    shutdown: Arc<ShutdownCoordinator>,
}

impl SimulationContext {
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock(&self) -> &ClockReference {
        &self.clock
    }

    pub fn draw_source(&self) -> &dyn DrawSource {
        self.draws.as_ref()
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    pub fn task_service(&self) -> &dyn TaskService {
        self.service.as_ref()
    }

    pub fn shutdown(&self) -> &ShutdownCoordinator {
        &self.shutdown
    }

    /// Append a line stamped with the current elapsed time
    pub fn log_event(&self, label: ActorLabel, event: Event) -> Result<()> {
        self.log.append(self.clock.elapsed(), label, event)
    }
}

/// Sets up a run: one server and `number_of_clients` clients
///
/// Any collaborator not supplied explicitly is created from the
/// configuration when the simulation starts.
pub struct Simulation {
    config: SimulationConfig,
    clock: ClockReference,
    draws: Option<Arc<dyn DrawSource>>,
    service: Option<Arc<dyn TaskService>>,
    log: Option<Arc<LogSink>>,
}

impl Simulation {
    /// Captures the clock reference all timestamps of the run are relative to
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            clock: ClockReference::start(),
            draws: None,
            service: None,
            log: None,
        }
    }

    pub fn with_draw_source(mut self, draws: Arc<dyn DrawSource>) -> Self {
        self.draws = Some(draws);
        self
    }

    pub fn with_task_service(mut self, service: Arc<dyn TaskService>) -> Self {
        self.service = Some(service);
        self
    }

    /// Write to this sink instead of opening `config.log_path`
    pub fn with_log_sink(mut self, log: Arc<LogSink>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn clock(&self) -> ClockReference {
        self.clock
    }

    /// Open the log and spawn all actors
    ///
    /// Configuration and log errors are reported before any thread exists.
    pub fn start(self) -> Result<RunningSimulation> {
        let Self {
            config,
            clock,
            draws,
            service,
            log: log_sink,
        } = self;

        config.validate()?;

        let log_sink = match log_sink {
            Some(log_sink) => log_sink,
            None => Arc::new(LogSink::open(&config.log_path)?),
        };

        let draws: Arc<dyn DrawSource> = match draws {
            Some(draws) => draws,
            None => Arc::new(SharedRandomSource::from_config(&config)),
        };

        let service: Arc<dyn TaskService> = match service {
            Some(service) => service,
            None => Arc::new(QueuedTaskService::new(log_sink.clone(), clock)),
        };

        let shutdown = Arc::new(ShutdownCoordinator::new(config.cancellable_sleep));

        let ctx = Arc::new(SimulationContext {
            config,
            clock,
            draws,
            log: log_sink,
            service,
            shutdown,
        });

        let mut running = RunningSimulation {
            ctx: ctx.clone(),
            handles: Vec::with_capacity(ctx.config.number_of_actors()),
        };

        if let Err(err) = running.spawn_actors() {
            // Bring down whatever did start before reporting
            if let Err(shutdown_err) = running.shutdown() {
                log::warn!("Partial startup did not shut down cleanly: {shutdown_err}");
            }
            return Err(err);
        }

        log::info!(
            "Server and {} client(s) started",
            ctx.config.number_of_clients
        );
        Ok(running)
    }
}

/// Handle to a simulation whose actors are running
///
/// Dropping it without calling [`Self::shutdown`] raises the stop flag but
/// does not wait for the actors.
pub struct RunningSimulation {
    ctx: Arc<SimulationContext>,
    handles: Vec<ActorHandle>,
}

impl RunningSimulation {
    fn spawn_actors(&mut self) -> Result<()> {
        self.spawn(ActorLabel::Server, run_server)?;

        for client_id in 0..self.ctx.config.number_of_clients {
            self.spawn(ActorLabel::Client(client_id), move |ctx| {
                run_client(ctx, client_id)
            })?;
        }

        Ok(())
    }

    fn spawn<F>(&mut self, label: ActorLabel, body: F) -> Result<()>
    where
        F: FnOnce(&SimulationContext) -> Result<()> + Send + 'static,
    {
        let guard = self.ctx.shutdown.register_actor(label);
        let ctx = self.ctx.clone();

        log::debug!("Spawning {label}");
        let handle = thread::Builder::new()
            .name(label.thread_name())
            .spawn(move || {
                let _guard = guard;
                let result = body(&ctx);

                if let Err(err) = &result {
                    log::error!("{label} stopped with an error: {err}");
                }

                result
            })
            .map_err(|source| Error::Spawn { label, source })?;

        self.handles.push((label, handle));
        Ok(())
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn request_stop(&self) {
        self.ctx.shutdown.request_stop();
    }

    pub fn active_actors(&self) -> usize {
        self.ctx.shutdown.active_actors()
    }

    pub fn await_quiescence(&self) {
        self.ctx.shutdown.await_quiescence();
    }

    /// Stop every actor, wait for all of them, and close the log
    ///
    /// Returns the first actor failure, if any, after the log is closed.
    pub fn shutdown(mut self) -> Result<()> {
        self.request_stop();
        self.await_quiescence();

        let mut first_error = None;
        for (label, handle) in std::mem::take(&mut self.handles) {
            let outcome = match handle.join() {
                Ok(result) => result.map_err(|err| Error::ActorError {
                    label,
                    source: Box::new(err),
                }),
                Err(panic) => Err(Error::ActorFailed {
                    label,
                    reason: panic_message(panic.as_ref()),
                }),
            };

            if let Err(err) = outcome {
                first_error.get_or_insert(err);
            }
        }

        self.ctx.log.close()?;

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl Drop for RunningSimulation {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            log::warn!("Simulation dropped while actors are running");
            self.ctx.shutdown.request_stop();
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked".to_string()
    }
}
