//! The server and client loops, and how their activity is labelled
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::service::TaskId;
use crate::simulation::SimulationContext;

const SERVER_LABEL: &str = "Сервер";
const CLIENT_PREFIX: &str = "Клиент";

/// Who wrote a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ActorLabel {
    Server,
    Client(u32),
}

impl ActorLabel {
    /// Name for the OS thread running this actor
    pub fn thread_name(&self) -> String {
        match self {
            Self::Server => "tasksim-server".to_string(),
            Self::Client(id) => format!("tasksim-client-{id}"),
        }
    }
}

impl std::fmt::Display for ActorLabel {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server => write!(fmt, "{SERVER_LABEL}"),
            Self::Client(id) => write!(fmt, "{CLIENT_PREFIX}{id}"),
        }
    }
}

impl FromStr for ActorLabel {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();

        if s == SERVER_LABEL {
            return Ok(Self::Server);
        }

        s.strip_prefix(CLIENT_PREFIX)
            .and_then(|id| id.parse().ok())
            .map(Self::Client)
            .ok_or_else(|| Error::ParseLine(format!("unknown actor `{s}`")))
    }
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Start,
    /// A client submitted a task
    Request(TaskId),
    /// The server ran a task
    Executed(TaskId),
    Stop,
}

impl Event {
    pub fn task(&self) -> Option<TaskId> {
        match self {
            Self::Request(task) | Self::Executed(task) => Some(*task),
            Self::Start | Self::Stop => None,
        }
    }

    pub(crate) fn parse(label: ActorLabel, payload: &str) -> Result<Self> {
        match payload.trim() {
            "запуск" => Ok(Self::Start),
            "завершение" => Ok(Self::Stop),
            other => {
                let task = other
                    .parse()
                    .map(TaskId::new)
                    .map_err(|_| Error::ParseLine(format!("unknown event `{other}`")))?;

                match label {
                    ActorLabel::Server => Ok(Self::Executed(task)),
                    ActorLabel::Client(_) => Ok(Self::Request(task)),
                }
            }
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => write!(fmt, "запуск"),
            Self::Request(task) | Self::Executed(task) => write!(fmt, "{task}"),
            Self::Stop => write!(fmt, "завершение"),
        }
    }
}

/// Lifecycle of a single actor
///
/// Clients skip `Stopping`; they exit straight from `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorState {
    Starting,
    Running,
    Stopping,
    Terminated,
}

fn transition(label: ActorLabel, state: &mut ActorState, next: ActorState) {
    log::trace!("{label}: {state:?} -> {next:?}");
    *state = next;
}

/// Drain the task service once per server period until a stop is requested
///
/// The drain after each sleep happens even if the stop flag was raised
/// during that sleep.
pub fn run_server(ctx: &SimulationContext) -> Result<()> {
    let label = ActorLabel::Server;
    let mut state = ActorState::Starting;

    ctx.log_event(label, Event::Start)?;
    transition(label, &mut state, ActorState::Running);

    let period = ctx.config().server_period;
    loop {
        ctx.shutdown().sleep(period);
        ctx.task_service().run_task_manager();

        if ctx.shutdown().is_stop_requested() {
            break;
        }
    }

    transition(label, &mut state, ActorState::Stopping);
    ctx.log_event(label, Event::Stop)?;
    transition(label, &mut state, ActorState::Terminated);

    Ok(())
}

/// Submit randomly timed requests until a stop is requested
///
/// A client that wakes up to find the stop flag set drops the task it drew
/// before sleeping instead of submitting it.
pub fn run_client(ctx: &SimulationContext, client_id: u32) -> Result<()> {
    let label = ActorLabel::Client(client_id);
    let mut state = ActorState::Starting;

    ctx.log_event(label, Event::Start)?;
    transition(label, &mut state, ActorState::Running);

    loop {
        let draw = ctx.draw_source().draw_delay_and_task();

        if ctx.shutdown().sleep(draw.delay) {
            log::trace!("{label} discards task {} drawn before stop", draw.task);
            break;
        }

        ctx.task_service().request_task(draw.task);
        ctx.log_event(label, Event::Request(draw.task))?;
    }

    ctx.log_event(label, Event::Stop)?;
    transition(label, &mut state, ActorState::Terminated);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip() {
        assert_eq!("Сервер", ActorLabel::Server.to_string());
        assert_eq!("Клиент4", ActorLabel::Client(4).to_string());

        assert_eq!(ActorLabel::Server, "Сервер".parse().unwrap());
        assert_eq!(ActorLabel::Client(12), "Клиент12".parse().unwrap());
        assert!("Клиент".parse::<ActorLabel>().is_err());
        assert!("Client1".parse::<ActorLabel>().is_err());
    }

    #[test]
    fn bare_task_id_depends_on_actor() {
        let task = TaskId::new(6);

        assert_eq!(
            Event::Executed(task),
            Event::parse(ActorLabel::Server, "6").unwrap()
        );
        assert_eq!(
            Event::Request(task),
            Event::parse(ActorLabel::Client(0), "6").unwrap()
        );
        assert_eq!(Some(task), Event::Request(task).task());
        assert_eq!(None, Event::Stop.task());
    }

    #[test]
    fn thread_names() {
        assert_eq!("tasksim-server", ActorLabel::Server.thread_name());
        assert_eq!("tasksim-client-2", ActorLabel::Client(2).thread_name());
    }
}
