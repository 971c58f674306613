#![forbid(unsafe_code)]

//! One-shot timers with generation-checked handles.
//!
//! The queue holds at most one pending timer per [`TimerKind`]. Starting a
//! timer of a kind that is already pending cancels the old one first.
//! Cancellation bumps the slot's generation, so a handle that was canceled
//! can never match a later timer that reuses the same slot.
//!
//! # Invariants
//!
//! 1. At most one pending timer per kind.
//! 2. A canceled or fired handle is never reported as pending again.
//! 3. [`TimerQueue::pop_due`] yields timers in deadline order.

use std::time::Duration;

/// The two delays the tooltip machine schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Pointer has rested on a trigger long enough to show the tooltip.
    Rest,
    /// Grace period after leaving has elapsed.
    Linger,
}

impl TimerKind {
    /// Every timer kind.
    pub const ALL: [TimerKind; 2] = [TimerKind::Rest, TimerKind::Linger];

    #[inline]
    const fn index(self) -> usize {
        match self {
            TimerKind::Rest => 0,
            TimerKind::Linger => 1,
        }
    }
}

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    slot: u32,
    generation: u32,
}

#[derive(Debug, Clone, Copy)]
struct Entry {
    kind: TimerKind,
    deadline: Duration,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// Arena of pending one-shot timers.
#[derive(Debug, Default)]
pub struct TimerQueue {
    slots: Vec<Slot>,
    free: Vec<u32>,
    armed: [Option<TimerHandle>; 2],
    started: u64,
    fired: u64,
    canceled: u64,
}

impl TimerQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer of `kind` to fire at `deadline`.
    ///
    /// Any pending timer of the same kind is canceled first.
    pub fn start(&mut self, kind: TimerKind, deadline: Duration) -> TimerHandle {
        if let Some(previous) = self.armed[kind.index()] {
            self.cancel(previous);
        }

        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot::default());
                (self.slots.len() - 1) as u32
            }
        };
        let entry = &mut self.slots[slot as usize];
        entry.entry = Some(Entry { kind, deadline });
        let handle = TimerHandle {
            slot,
            generation: entry.generation,
        };
        self.armed[kind.index()] = Some(handle);
        self.started += 1;

        tracing::trace!(?kind, deadline_ms = deadline.as_millis() as u64, "timer armed");
        handle
    }

    /// Cancel a pending timer. Returns `false` if the handle is stale.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let Some(entry) = self.release(handle) else {
            return false;
        };
        self.canceled += 1;
        tracing::trace!(kind = ?entry.kind, "timer canceled");
        true
    }

    /// Cancel the pending timer of `kind`, if any.
    pub fn cancel_kind(&mut self, kind: TimerKind) -> bool {
        match self.armed[kind.index()] {
            Some(handle) => self.cancel(handle),
            None => false,
        }
    }

    /// Cancel every pending timer. Returns how many were canceled.
    pub fn cancel_all(&mut self) -> usize {
        TimerKind::ALL
            .into_iter()
            .filter(|&kind| self.cancel_kind(kind))
            .count()
    }

    /// Whether `handle` still refers to a pending timer.
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entry(handle).is_some()
    }

    /// The pending timer of `kind`, if any.
    #[inline]
    #[must_use]
    pub fn pending(&self, kind: TimerKind) -> Option<TimerHandle> {
        self.armed[kind.index()]
    }

    /// Deadline of a pending timer.
    #[must_use]
    pub fn deadline(&self, handle: TimerHandle) -> Option<Duration> {
        self.entry(handle).map(|e| e.deadline)
    }

    /// Earliest deadline among pending timers.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.armed
            .iter()
            .flatten()
            .filter_map(|&h| self.deadline(h))
            .min()
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, TimerKind)> {
        let handle = self
            .armed
            .iter()
            .flatten()
            .copied()
            .filter_map(|h| self.entry(h).map(|e| (h, e.deadline)))
            .filter(|&(_, deadline)| deadline <= now)
            .min_by_key(|&(_, deadline)| deadline)
            .map(|(h, _)| h)?;

        let entry = self.release(handle)?;
        self.fired += 1;
        tracing::trace!(kind = ?entry.kind, "timer fired");
        Some((handle, entry.kind))
    }

    /// Number of pending timers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.armed.iter().flatten().count()
    }

    /// Whether no timer is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Diagnostic counters: `(started, fired, canceled)`.
    #[must_use]
    pub fn stats(&self) -> (u64, u64, u64) {
        (self.started, self.fired, self.canceled)
    }

    fn entry(&self, handle: TimerHandle) -> Option<&Entry> {
        self.slots
            .get(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    /// Invalidate a live handle and return its slot to the free list.
    fn release(&mut self, handle: TimerHandle) -> Option<Entry> {
        let slot = self.slots.get_mut(handle.slot as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.slot);
        if self.armed[entry.kind.index()] == Some(handle) {
            self.armed[entry.kind.index()] = None;
        }
        Some(entry)
    }
}
