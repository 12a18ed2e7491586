//! The boundary to whatever actually executes tasks
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::actor::{ActorLabel, Event};
use crate::log_sink::LogSink;
use crate::time::ClockReference;

/// Identifies a task within the fixed task universe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u32);

impl TaskId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

/// Implement this trait to plug task processing into the simulation
///
/// Both calls are fire-and-forget; actors never look at a result.
pub trait TaskService: Send + Sync {
    /// Submit a request (called by clients)
    fn request_task(&self, task: TaskId);

    /// Process whatever is pending (called by the server once per period)
    fn run_task_manager(&self);
}

/// Ignores everything
#[derive(Default)]
pub struct NoopTaskService {}

impl TaskService for NoopTaskService {
    fn request_task(&self, _task: TaskId) {}
    fn run_task_manager(&self) {}
}

/// Queues requests and executes them when the server drains
///
/// Executing a task writes a `Сервер | <id>` line to the log.
pub struct QueuedTaskService {
    pending: Mutex<Vec<TaskId>>,
    log: Arc<LogSink>,
    clock: ClockReference,
    executed: AtomicU64,
}

impl QueuedTaskService {
    pub fn new(log: Arc<LogSink>, clock: ClockReference) -> Self {
        Self {
            pending: Mutex::new(vec![]),
            log,
            clock,
            executed: AtomicU64::new(0),
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Number of tasks run so far
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::SeqCst)
    }

    fn execute(&self, task: TaskId) {
        if let Err(err) = self
            .log
            .append(self.clock.elapsed(), ActorLabel::Server, Event::Executed(task))
        {
            log::warn!("Could not record execution of task {task}: {err}");
        }

        self.executed.fetch_add(1, Ordering::SeqCst);
    }
}

impl TaskService for QueuedTaskService {
    fn request_task(&self, task: TaskId) {
        self.pending.lock().push(task);
    }

    fn run_task_manager(&self) {
        // Take the batch first so clients are not blocked while tasks run
        let batch = std::mem::take(&mut *self.pending.lock());

        if !batch.is_empty() {
            log::trace!("Draining {} pending task(s)", batch.len());
        }

        for task in batch {
            self.execute(task);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_executes_pending_tasks() {
        let (sink, buffer) = LogSink::in_memory();
        let service = QueuedTaskService::new(Arc::new(sink), ClockReference::start());

        service.request_task(TaskId::new(2));
        service.request_task(TaskId::new(9));
        assert_eq!(2, service.pending());
        assert_eq!(0, service.executed());

        service.run_task_manager();
        assert_eq!(0, service.pending());
        assert_eq!(2, service.executed());

        let events: Vec<Event> = buffer
            .lines()
            .unwrap()
            .into_iter()
            .map(|line| {
                assert_eq!(ActorLabel::Server, line.label);
                line.event
            })
            .collect();

        assert_eq!(
            vec![Event::Executed(TaskId::new(2)), Event::Executed(TaskId::new(9))],
            events
        );
    }

    #[test]
    fn noop_service_accepts_everything() {
        let service = NoopTaskService::default();
        service.request_task(TaskId::new(0));
        service.run_task_manager();
    }

    #[test]
    fn empty_drain_is_silent() {
        let (sink, buffer) = LogSink::in_memory();
        let service = QueuedTaskService::new(Arc::new(sink), ClockReference::start());

        service.run_task_manager();

        assert_eq!(0, service.executed());
        assert!(buffer.contents().is_empty());
    }

    #[test]
    fn closed_log_does_not_stop_execution() {
        let (sink, _buffer) = LogSink::in_memory();
        let sink = Arc::new(sink);
        let service = QueuedTaskService::new(sink.clone(), ClockReference::start());

        sink.close().unwrap();
        service.request_task(TaskId::new(1));
        service.run_task_manager();

        assert_eq!(1, service.executed());
    }
}
