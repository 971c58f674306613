#![forbid(unsafe_code)]

//! Background timer driver.
//!
//! Hosts without their own event loop can hand a [`Coordinator`] to a
//! [`TimerDriver`], which sleeps until the next pending deadline and fires
//! it. Any transition wakes the driver so a newly armed timer is picked up
//! immediately.
//!
//! The driver sleeps on wall time, so it is meant for coordinators built on
//! [`SystemClock`](hovertip_core::clock::SystemClock). Tests drive timers
//! with [`Simulator`](crate::simulator::Simulator) instead.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::coordinator::Coordinator;
use crate::lock;

/// Edge-triggered wakeup shared by a coordinator and its driver.
///
/// Each [`notify`](Wakeup::notify) bumps an epoch. A waiter records the epoch
/// before checking for work and sleeps only while it is unchanged, so a
/// notification between the check and the wait is never lost.
#[derive(Clone)]
pub(crate) struct Wakeup {
    inner: Arc<(Mutex<u64>, Condvar)>,
}

impl Wakeup {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(0), Condvar::new())),
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        *lock(&self.inner.0)
    }

    pub(crate) fn notify(&self) {
        let (epoch, cvar) = &*self.inner;
        *lock(epoch) += 1;
        cvar.notify_all();
    }

    /// Block until the epoch moves past `seen` or `timeout` elapses.
    ///
    /// `None` waits without a deadline. Returns `true` if woken by a notify.
    pub(crate) fn wait(&self, seen: u64, timeout: Option<Duration>) -> bool {
        let (epoch, cvar) = &*self.inner;
        let mut current = lock(epoch);
        let deadline = timeout.map(|t| Instant::now() + t);

        // Loop to absorb spurious wakeups.
        while *current == seen {
            match deadline {
                None => {
                    current = cvar.wait(current).unwrap_or_else(|e| e.into_inner());
                }
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return false;
                    }
                    let (guard, result) = cvar
                        .wait_timeout(current, remaining)
                        .unwrap_or_else(|e| e.into_inner());
                    current = guard;
                    if result.timed_out() && *current == seen {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Thread that fires a coordinator's timers on wall time.
///
/// Dropping the driver signals the thread to stop without waiting for it;
/// call [`stop`](Self::stop) to join.
pub struct TimerDriver {
    stopped: Arc<AtomicBool>,
    wakeup: Wakeup,
    thread: Option<JoinHandle<()>>,
}

impl TimerDriver {
    /// Spawn the driver thread for `coordinator`.
    pub fn spawn(coordinator: Coordinator) -> io::Result<Self> {
        let stopped = Arc::new(AtomicBool::new(false));
        let wakeup = coordinator.wakeup().clone();

        let thread = {
            let stopped = Arc::clone(&stopped);
            thread::Builder::new()
                .name("hovertip-timers".into())
                .spawn(move || run(&coordinator, &stopped))?
        };

        tracing::debug!("timer driver started");
        Ok(Self {
            stopped,
            wakeup,
            thread: Some(thread),
        })
    }

    /// Whether the driver thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the driver and wait for its thread to exit.
    pub fn stop(mut self) {
        self.signal_stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    fn signal_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.wakeup.notify();
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.signal_stop();
        // Don't join on drop; a listener may still be running on the driver thread.
    }
}

fn run(coordinator: &Coordinator, stopped: &AtomicBool) {
    let mut fired_total: u64 = 0;
    crate::debug_trace!("timer driver loop started");
    while !stopped.load(Ordering::SeqCst) {
        let seen = coordinator.wakeup().epoch();
        let fired = coordinator.fire_due_timers();
        fired_total += fired as u64;
        if fired > 0 {
            // Firing notified the wakeup; don't sleep on our own notification.
            continue;
        }
        let timeout = coordinator.time_until_next_timer();
        coordinator.wakeup().wait(seen, timeout);
    }
    crate::debug_trace!("timer driver loop stopped: fired={}", fired_total);
    tracing::debug!(fired = fired_total, "timer driver stopped");
}
