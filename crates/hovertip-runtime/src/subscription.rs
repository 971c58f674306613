#![forbid(unsafe_code)]

//! Subscription registry for state-change listeners.
//!
//! Trigger bindings register a listener when they mount and drop their
//! [`Subscription`] guard when they unmount. Every taken transition
//! notifies all registered listeners with the new [`Snapshot`].
//!
//! # Notification safety
//!
//! A notification pass works on a copy of the listener list taken under the
//! registry lock, and the lock is released before any listener runs. A
//! listener may therefore subscribe or unsubscribe (itself or others) while
//! being notified. A listener removed mid-pass is skipped if it has not run
//! yet.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use crate::lock;
use crate::machine::Snapshot;

/// Callback invoked with every post-transition snapshot.
pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

/// Identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// The set of registered listeners. Order is not significant.
#[derive(Default)]
pub struct Registry {
    next: u64,
    listeners: HashMap<SubscriptionId, Listener>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn insert(&mut self, listener: Listener) -> SubscriptionId {
        self.next += 1;
        let id = SubscriptionId(self.next);
        self.listeners.insert(id, listener);
        tracing::debug!(sub_id = id.0, total = self.listeners.len(), "listener subscribed");
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let removed = self.listeners.remove(&id).is_some();
        if removed {
            tracing::debug!(sub_id = id.0, total = self.listeners.len(), "listener unsubscribed");
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.listeners.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    fn entries(&self) -> Vec<(SubscriptionId, Listener)> {
        self.listeners
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

/// Deliver `snapshot` to every listener registered in `registry`.
///
/// Returns how many listeners ran.
pub(crate) fn notify(registry: &Mutex<Registry>, snapshot: &Snapshot) -> usize {
    let entries = lock(registry).entries();
    let mut delivered = 0;
    for (id, listener) in entries {
        if !lock(registry).contains(id) {
            continue;
        }
        listener(snapshot);
        delivered += 1;
    }
    delivered
}

/// Registration guard. Unsubscribes when dropped.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, registry: &Arc<Mutex<Registry>>) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
        }
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unsubscribe now. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry).remove(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::State;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn shared() -> Arc<Mutex<Registry>> {
        Arc::new(Mutex::new(Registry::new()))
    }

    fn counter_listener(count: &Arc<AtomicUsize>) -> Listener {
        let count = Arc::clone(count);
        Arc::new(move |_: &Snapshot| {
            count.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn notify_reaches_every_listener() {
        let registry = shared();
        let count = Arc::new(AtomicUsize::new(0));
        lock(&registry).insert(counter_listener(&count));
        lock(&registry).insert(counter_listener(&count));

        assert_eq!(notify(&registry, &Snapshot::default()), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_guard_unsubscribes() {
        let registry = shared();
        let count = Arc::new(AtomicUsize::new(0));
        let id = lock(&registry).insert(counter_listener(&count));
        let guard = Subscription::new(id, &registry);

        drop(guard);
        assert!(lock(&registry).is_empty());
        notify(&registry, &Snapshot::default());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn guard_outliving_registry_is_harmless() {
        let registry = shared();
        let id = lock(&registry).insert(Arc::new(|_: &Snapshot| {}));
        let guard = Subscription::new(id, &registry);
        drop(registry);
        guard.unsubscribe();
    }

    #[test]
    fn listener_may_unsubscribe_itself_during_notify() {
        let registry = shared();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let listener: Listener = {
            let slot = Arc::clone(&slot);
            let calls = Arc::clone(&calls);
            Arc::new(move |_: &Snapshot| {
                calls.fetch_add(1, Ordering::SeqCst);
                lock(&slot).take();
            })
        };
        let id = lock(&registry).insert(listener);
        *lock(&slot) = Some(Subscription::new(id, &registry));

        notify(&registry, &Snapshot::default());
        notify(&registry, &Snapshot::default());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(lock(&registry).is_empty());
    }

    #[test]
    fn listener_removed_mid_pass_is_skipped() {
        let registry = shared();
        let victim_calls = Arc::new(AtomicUsize::new(0));
        let victim_id = lock(&registry).insert(counter_listener(&victim_calls));

        let killer: Listener = {
            let registry = Arc::clone(&registry);
            Arc::new(move |_: &Snapshot| {
                lock(&registry).remove(victim_id);
            })
        };
        lock(&registry).insert(killer);

        notify(&registry, &Snapshot::default());
        // Either the victim ran before the killer, or it was skipped.
        assert!(victim_calls.load(Ordering::SeqCst) <= 1);
        assert!(!lock(&registry).contains(victim_id));
        notify(&registry, &Snapshot::default());
        assert!(victim_calls.load(Ordering::SeqCst) <= 1);
    }

    #[test]
    fn listeners_see_the_snapshot() {
        let registry = shared();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = Arc::clone(&seen);
            lock(&registry).insert(Arc::new(move |s: &Snapshot| lock(&seen).push(s.state)));
        }
        let snapshot = Snapshot {
            state: State::Visible,
            ..Snapshot::default()
        };
        notify(&registry, &snapshot);
        assert_eq!(*lock(&seen), vec![State::Visible]);
    }
}
