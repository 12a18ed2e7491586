//! Broadcasting the stop signal and waiting for every actor to acknowledge it
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::actor::ActorLabel;

/// A one-shot stop flag plus a count of live actors
///
/// The flag only ever goes from `false` to `true`. The count goes up once
/// per registered actor and down once per [`ActorGuard`] drop, so it never
/// drops below zero and is zero exactly when all registered actors are gone.
pub struct ShutdownCoordinator {
    stop: AtomicBool,
    active: AtomicUsize,
    cancellable_sleep: bool,
    // Woken on stop requests and on the last actor exiting
    lock: Mutex<()>,
    changed: Condvar,
}

impl ShutdownCoordinator {
    pub fn new(cancellable_sleep: bool) -> Self {
        Self {
            stop: AtomicBool::new(false),
            active: AtomicUsize::new(0),
            cancellable_sleep,
            lock: Mutex::new(()),
            changed: Condvar::new(),
        }
    }

    /// Tell every actor to wind down at its next check
    ///
    /// Calling this more than once has no further effect.
    pub fn request_stop(&self) {
        if !self.stop.swap(true, Ordering::SeqCst) {
            log::info!("Stop requested");
        }

        let _lock = self.lock.lock();
        self.changed.notify_all();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Count a new actor as live
    ///
    /// Must be called before the actor's thread starts. The returned guard
    /// calls [`Self::actor_exiting`] when dropped, including on panic.
    pub fn register_actor(self: &Arc<Self>, label: ActorLabel) -> ActorGuard {
        let previous = self.active.fetch_add(1, Ordering::SeqCst);
        log::trace!("Registered {label}, {} actor(s) live", previous + 1);

        ActorGuard {
            coordinator: self.clone(),
            label,
        }
    }

    /// Mark one actor as gone and return how many remain
    ///
    /// Never goes below zero; a surplus call is logged and ignored.
    pub fn actor_exiting(&self) -> usize {
        let result = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| {
                count.checked_sub(1)
            });

        match result {
            Ok(1) => {
                log::debug!("Last actor exited");
                let _lock = self.lock.lock();
                self.changed.notify_all();
                0
            }
            Ok(previous) => previous - 1,
            Err(_) => {
                log::warn!("actor_exiting called with no live actors");
                0
            }
        }
    }

    pub fn active_actors(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Block until no actor is live
    ///
    /// There is no timeout: an actor that never checks the stop flag
    /// keeps this waiting forever.
    pub fn await_quiescence(&self) {
        let mut lock = self.lock.lock();

        while self.active.load(Ordering::SeqCst) > 0 {
            self.changed.wait(&mut lock);
        }

        log::info!("All actors have exited");
    }

    /// Sleep for `duration` and report whether a stop has been requested
    ///
    /// With cancellable sleep enabled a stop request cuts the wait short;
    /// otherwise the full duration always elapses.
    pub fn sleep(&self, duration: Duration) -> bool {
        if !self.cancellable_sleep {
            std::thread::sleep(duration);
            return self.is_stop_requested();
        }

        let deadline = Instant::now() + duration;
        let mut lock = self.lock.lock();

        while !self.is_stop_requested() {
            if self.changed.wait_until(&mut lock, deadline).timed_out() {
                break;
            }
        }

        self.is_stop_requested()
    }
}

/// Keeps an actor counted as live for as long as it exists
pub struct ActorGuard {
    coordinator: Arc<ShutdownCoordinator>,
    label: ActorLabel,
}

impl ActorGuard {
    pub fn label(&self) -> ActorLabel {
        self.label
    }
}

impl Drop for ActorGuard {
    fn drop(&mut self) {
        if std::thread::panicking() {
            log::error!("{} is exiting due to a panic", self.label);
        }

        let remaining = self.coordinator.actor_exiting();
        log::trace!("{} exited, {remaining} actor(s) live", self.label);
    }
}
