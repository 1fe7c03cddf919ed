//! Observer/observable contract for fore.
//!
//! Models (counters, wallets, fetchers...) implement [`Observable`]. Views and
//! tests implement [`Observer`] and are told that *something changed*; they
//! then re-read whatever model state they care about.
//!
//! # Notification Contract
//!
//! [`Observable::notify_observers`] calls every registered observer
//! synchronously, on the calling thread. There is **no** guarantee about how
//! many notifications a given sequence of mutations produces, only that at
//! least one notification follows any change a consumer has to react to.
//! Consumers must re-sync from current state rather than count callbacks.
//!
//! Notifications do not fire retroactively: a view has to sync once right
//! after registering (see [`LifecycleSyncer`](crate::LifecycleSyncer)).
//!
//! # Ownership
//!
//! [`ObservableImp`] holds observers weakly. Registering an observer never
//! extends its lifetime; entries whose owner has gone away are pruned on the
//! next notification. Owners should still remove their observers on teardown,
//! [`ObserverGuard`] does that automatically.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use fore_core::{Observable, ObservableImp, Observer};
//!
//! let observable = ObservableImp::new();
//! let calls = Arc::new(AtomicUsize::new(0));
//!
//! let calls_clone = calls.clone();
//! let observer: Arc<dyn Observer> = Arc::new(move || {
//!     calls_clone.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! observable.add_observer(&observer);
//! observable.notify_observers();
//! observable.remove_observer(&observer);
//! observable.notify_observers();
//!
//! assert_eq!(calls.load(Ordering::SeqCst), 1);
//! ```

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::{ForeError, Result};

const TARGET: &str = crate::logging::targets::OBSERVABLE;

new_key_type! {
    /// Identifies one registration inside an [`ObservableImp`].
    pub struct ObserverId;
}

/// Something that can be told that state it watches has changed.
///
/// Any `Fn() + Send + Sync` closure is an observer.
pub trait Observer: Send + Sync {
    /// Called after the observed state changed. Re-read state here.
    fn something_changed(&self);
}

impl<F> Observer for F
where
    F: Fn() + Send + Sync,
{
    fn something_changed(&self) {
        self()
    }
}

/// Something that can be watched for changes.
///
/// Observer identity is the identity of the shared handle: adding the same
/// `Arc` twice has no additional effect.
pub trait Observable: Send + Sync {
    /// Register an observer. Re-adding a registered observer is a no-op.
    fn add_observer(&self, observer: &Arc<dyn Observer>);

    /// Unregister an observer. Removing an unknown observer is a no-op.
    fn remove_observer(&self, observer: &Arc<dyn Observer>);

    /// Call `something_changed()` on every registered observer, on this thread.
    fn notify_observers(&self);

    /// Whether any live observer is registered.
    fn has_observers(&self) -> bool;

    /// Register an observer through a weak reference.
    ///
    /// Fails with [`ForeError::NullObserver`] if the reference is dangling.
    fn add_weak_observer(&self, observer: &Weak<dyn Observer>) -> Result<()> {
        let observer = observer.upgrade().ok_or(ForeError::NullObserver)?;
        self.add_observer(&observer);
        Ok(())
    }
}

/// Internal storage for a single registration.
struct ObserverEntry {
    observer: Weak<dyn Observer>,
    /// Address of the observer allocation, used for identity.
    addr: usize,
}

impl ObserverEntry {
    fn is_alive(&self) -> bool {
        self.observer.strong_count() > 0
    }
}

fn identity(observer: &Arc<dyn Observer>) -> usize {
    Arc::as_ptr(observer) as *const () as usize
}

/// Reference [`Observable`] implementation, meant to be embedded in models.
///
/// The observer set is guarded by a mutex. Notification works on a snapshot
/// and calls observers with the lock released, so an observer may add or
/// remove observers (itself included) from inside `something_changed()`.
/// An observer removed during a notification cycle receives no further
/// callbacks from that cycle; one added during a cycle is first notified on
/// the next cycle.
pub struct ObservableImp {
    observers: Mutex<SlotMap<ObserverId, ObserverEntry>>,
}

impl Default for ObservableImp {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservableImp {
    /// Create an observable with no observers.
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(SlotMap::with_key()),
        }
    }

    /// Number of live registered observers.
    pub fn observer_count(&self) -> usize {
        self.observers.lock().values().filter(|e| e.is_alive()).count()
    }

    /// Register an observer and return its registration id.
    ///
    /// If the observer is already registered, the existing id is returned.
    pub fn register(&self, observer: &Arc<dyn Observer>) -> ObserverId {
        let addr = identity(observer);
        let mut observers = self.observers.lock();
        if let Some((id, _)) = observers
            .iter()
            .find(|(_, e)| e.addr == addr && e.is_alive())
        {
            return id;
        }
        let id = observers.insert(ObserverEntry {
            observer: Arc::downgrade(observer),
            addr,
        });
        tracing::trace!(target: TARGET, count = observers.len(), "observer added");
        id
    }

    /// Remove a registration by id. Returns `true` if it was registered.
    pub fn unregister(&self, id: ObserverId) -> bool {
        self.observers.lock().remove(id).is_some()
    }

    /// Remove every observer.
    pub fn clear(&self) {
        self.observers.lock().clear();
    }
}

impl Observable for ObservableImp {
    fn add_observer(&self, observer: &Arc<dyn Observer>) {
        self.register(observer);
    }

    fn remove_observer(&self, observer: &Arc<dyn Observer>) {
        let addr = identity(observer);
        let mut observers = self.observers.lock();
        observers.retain(|_, e| e.addr != addr);
        tracing::trace!(target: TARGET, count = observers.len(), "observer removed");
    }

    #[tracing::instrument(skip_all, target = "fore_core::observable", level = "trace")]
    fn notify_observers(&self) {
        let snapshot: Vec<(ObserverId, Weak<dyn Observer>)> = {
            let mut observers = self.observers.lock();
            observers.retain(|_, e| e.is_alive());
            observers
                .iter()
                .map(|(id, e)| (id, e.observer.clone()))
                .collect()
        };
        tracing::trace!(target: TARGET, observer_count = snapshot.len(), "notifying observers");

        for (id, weak) in snapshot {
            // Skip anything removed by an earlier observer in this cycle.
            if !self.observers.lock().contains_key(id) {
                continue;
            }
            if let Some(observer) = weak.upgrade() {
                observer.something_changed();
            }
        }
    }

    fn has_observers(&self) -> bool {
        self.observers.lock().values().any(|e| e.is_alive())
    }
}

/// Registration that removes its observer when dropped.
///
/// The guard holds the observable weakly, so it never keeps a model alive.
///
/// ```
/// use std::sync::Arc;
/// use fore_core::{Observable, ObservableImp, Observer, ObserverGuard};
///
/// let observable = Arc::new(ObservableImp::new());
/// let observer: Arc<dyn Observer> = Arc::new(|| {});
/// {
///     let _guard = ObserverGuard::new(&observable, observer);
///     assert!(observable.has_observers());
/// }
/// assert!(!observable.has_observers());
/// ```
pub struct ObserverGuard {
    observable: Weak<dyn Observable>,
    observer: Arc<dyn Observer>,
}

impl ObserverGuard {
    /// Add `observer` to `observable` for the lifetime of the guard.
    pub fn new<O>(observable: &Arc<O>, observer: Arc<dyn Observer>) -> Self
    where
        O: Observable + 'static,
    {
        observable.add_observer(&observer);
        let observable: Weak<dyn Observable> = Arc::downgrade(observable) as Weak<dyn Observable>;
        Self {
            observable,
            observer,
        }
    }

    /// The guarded observer.
    pub fn observer(&self) -> &Arc<dyn Observer> {
        &self.observer
    }
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        if let Some(observable) = self.observable.upgrade() {
            observable.remove_observer(&self.observer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_observer() -> (Arc<dyn Observer>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let observer: Arc<dyn Observer> = Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        (observer, calls)
    }

    #[test]
    fn test_add_and_notify() {
        let observable = ObservableImp::new();
        let (observer, calls) = counting_observer();

        assert!(!observable.has_observers());
        observable.add_observer(&observer);
        assert!(observable.has_observers());

        observable.notify_observers();
        observable.notify_observers();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_adding_twice_notifies_once() {
        let observable = ObservableImp::new();
        let (observer, calls) = counting_observer();

        let first = observable.register(&observer);
        let second = observable.register(&observer);
        assert_eq!(first, second);
        assert_eq!(observable.observer_count(), 1);

        observable.notify_observers();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_remove_stops_notifications() {
        let observable = ObservableImp::new();
        let (observer, calls) = counting_observer();

        observable.add_observer(&observer);
        observable.notify_observers();
        observable.remove_observer(&observer);
        observable.notify_observers();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!observable.has_observers());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let observable = ObservableImp::new();
        let (registered, calls) = counting_observer();
        let (stranger, _) = counting_observer();

        observable.add_observer(&registered);
        observable.remove_observer(&stranger);
        observable.notify_observers();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let observable = ObservableImp::new();
        let (observer, _) = counting_observer();

        observable.add_observer(&observer);
        drop(observer);

        assert!(!observable.has_observers());
        observable.notify_observers();
        assert_eq!(observable.observer_count(), 0);
    }

    #[test]
    fn test_weak_observer_must_be_alive() {
        let observable = ObservableImp::new();
        let (observer, calls) = counting_observer();

        let weak = Arc::downgrade(&observer);
        assert!(observable.add_weak_observer(&weak).is_ok());
        observable.notify_observers();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(observer);
        assert_eq!(
            observable.add_weak_observer(&weak),
            Err(ForeError::NullObserver)
        );
    }

    #[test]
    fn test_observer_removes_itself_during_notify() {
        let observable = Arc::new(ObservableImp::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Arc<dyn Observer>>>> = Arc::new(Mutex::new(None));

        let observable_clone = observable.clone();
        let calls_clone = calls.clone();
        let slot_clone = slot.clone();
        let observer: Arc<dyn Observer> = Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = slot_clone.lock().take() {
                observable_clone.remove_observer(&me);
            }
        });
        *slot.lock() = Some(observer.clone());

        observable.add_observer(&observer);
        observable.notify_observers();
        observable.notify_observers();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!observable.has_observers());
    }

    #[test]
    fn test_observer_removed_by_earlier_observer_is_skipped() {
        let observable = Arc::new(ObservableImp::new());
        let (victim, victim_calls) = counting_observer();

        let observable_clone = observable.clone();
        let victim_clone = victim.clone();
        let remover: Arc<dyn Observer> = Arc::new(move || {
            observable_clone.remove_observer(&victim_clone);
        });

        // Registration order is iteration order for a fresh slotmap.
        observable.add_observer(&remover);
        observable.add_observer(&victim);
        observable.notify_observers();

        assert_eq!(victim_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_observer_added_during_notify_waits_for_next_cycle() {
        let observable = Arc::new(ObservableImp::new());
        let (late, late_calls) = counting_observer();

        let observable_clone = observable.clone();
        let late_clone = late.clone();
        let adder: Arc<dyn Observer> = Arc::new(move || {
            observable_clone.add_observer(&late_clone);
        });

        observable.add_observer(&adder);
        observable.notify_observers();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        observable.notify_observers();
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_notify_from_other_thread() {
        let observable = Arc::new(ObservableImp::new());
        let (observer, calls) = counting_observer();
        observable.add_observer(&observer);

        let observable_clone = observable.clone();
        std::thread::spawn(move || observable_clone.notify_observers())
            .join()
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_removes_on_drop() {
        let observable = Arc::new(ObservableImp::new());
        let (observer, calls) = counting_observer();

        {
            let guard = ObserverGuard::new(&observable, observer.clone());
            assert!(Arc::ptr_eq(guard.observer(), &observer));
            observable.notify_observers();
        }
        observable.notify_observers();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!observable.has_observers());
    }

    #[test]
    fn test_guard_outliving_observable() {
        let observable = Arc::new(ObservableImp::new());
        let (observer, _) = counting_observer();
        let guard = ObserverGuard::new(&observable, observer);
        drop(observable);
        drop(guard);
    }
}
