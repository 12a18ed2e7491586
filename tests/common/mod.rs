#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use tasksim::time::{ClockReference, Timestamp};
use tasksim::{
    ActorLabel, DrawSource, Event, FixedDraws, LogBuffer, LogLine, LogSink, Simulation,
    SimulationConfig, TaskId, TaskService,
};

/// Remembers every request and when each drain happened
pub struct RecordingService {
    pub requests: Mutex<Vec<TaskId>>,
    pub drains: AtomicUsize,
    drain_stamps: Mutex<Vec<Timestamp>>,
    clock: ClockReference,
}

impl RecordingService {
    pub fn new(clock: ClockReference) -> Self {
        Self {
            requests: Mutex::new(vec![]),
            drains: AtomicUsize::new(0),
            drain_stamps: Mutex::new(vec![]),
            clock,
        }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn drain_count(&self) -> usize {
        self.drains.load(Ordering::SeqCst)
    }

    pub fn drain_stamps(&self) -> Vec<Timestamp> {
        self.drain_stamps.lock().clone()
    }
}

impl TaskService for RecordingService {
    fn request_task(&self, task: TaskId) {
        self.requests.lock().push(task);
    }

    fn run_task_manager(&self) {
        self.drain_stamps.lock().push(self.clock.elapsed());
        self.drains.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn config(clients: u32, server_period: Duration, cancellable_sleep: bool) -> SimulationConfig {
    SimulationConfig::new()
        .with_number_of_clients(clients)
        .with_server_period(server_period)
        .with_cancellable_sleep(cancellable_sleep)
}

/// A simulation writing to memory with a recording service
pub fn simulation(
    config: SimulationConfig,
    draws: Arc<dyn DrawSource>,
) -> (Simulation, Arc<RecordingService>, LogBuffer) {
    let (sink, buffer) = LogSink::in_memory();
    let simulation = Simulation::new(config);
    let service = Arc::new(RecordingService::new(simulation.clock()));

    let simulation = simulation
        .with_log_sink(Arc::new(sink))
        .with_draw_source(draws)
        .with_task_service(service.clone());

    (simulation, service, buffer)
}

pub fn fixed(delay_ms: u64) -> Arc<dyn DrawSource> {
    Arc::new(FixedDraws::new(Duration::from_millis(delay_ms), 10))
}

pub fn lines_of(buffer: &LogBuffer, label: ActorLabel) -> Vec<LogLine> {
    buffer
        .lines()
        .unwrap()
        .into_iter()
        .filter(|line| line.label == label)
        .collect()
}

pub fn requests_of(buffer: &LogBuffer, label: ActorLabel) -> Vec<LogLine> {
    lines_of(buffer, label)
        .into_iter()
        .filter(|line| matches!(line.event, Event::Request(_)))
        .collect()
}

/// Every actor logged exactly one start followed (eventually) by one stop
pub fn assert_clean_lifecycle(buffer: &LogBuffer, label: ActorLabel) {
    let lines = lines_of(buffer, label);

    let starts: Vec<_> = lines.iter().filter(|line| line.event == Event::Start).collect();
    let stops: Vec<_> = lines.iter().filter(|line| line.event == Event::Stop).collect();

    assert_eq!(1, starts.len(), "{label} should start exactly once");
    assert_eq!(1, stops.len(), "{label} should stop exactly once");
    assert!(stops[0].timestamp >= starts[0].timestamp);

    assert_eq!(Some(&Event::Start), lines.first().map(|line| &line.event));
    assert_eq!(Some(&Event::Stop), lines.last().map(|line| &line.event));
}
