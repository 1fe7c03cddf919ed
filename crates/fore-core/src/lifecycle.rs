//! Binding a view's observer registration to its visible lifetime.
//!
//! The pattern every view follows is the same: when it becomes visible it
//! registers with the models it shows and syncs once straight away, and when
//! it is hidden it unregisters. [`LifecycleSyncer`] does that bookkeeping.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::observer::{Observable, Observer};

const TARGET: &str = crate::logging::targets::OBSERVABLE;

/// A view that can redraw itself from the current model state.
pub trait SyncableView: Send + Sync {
    /// Read model state and update the view. Must be idempotent.
    fn sync_view(&self);
}

/// Adapts a [`SyncableView`] to [`Observer`].
struct SyncObserver<V: SyncableView>(Arc<V>);

impl<V: SyncableView> Observer for SyncObserver<V> {
    fn something_changed(&self) {
        self.0.sync_view();
    }
}

/// Registers one view with a list of observables between `on_start` and
/// `on_stop`.
pub struct LifecycleSyncer {
    observables: Vec<Arc<dyn Observable>>,
    observer: Arc<dyn Observer>,
    view: Arc<dyn SyncableView>,
    started: AtomicBool,
}

impl std::fmt::Debug for LifecycleSyncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleSyncer")
            .field("observables", &self.observables.len())
            .field("started", &self.is_started())
            .finish()
    }
}

impl LifecycleSyncer {
    pub fn new<V>(view: Arc<V>, observables: Vec<Arc<dyn Observable>>) -> Self
    where
        V: SyncableView + 'static,
    {
        let observer: Arc<dyn Observer> = Arc::new(SyncObserver(view.clone()));
        Self {
            observables,
            observer,
            view,
            started: AtomicBool::new(false),
        }
    }

    /// Whether the view is currently registered.
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Register with every observable, then sync the view once.
    ///
    /// Calling it again while started only syncs.
    pub fn on_start(&self) {
        if !self.started.swap(true, Ordering::AcqRel) {
            for observable in &self.observables {
                observable.add_observer(&self.observer);
            }
            tracing::trace!(target: TARGET, observables = self.observables.len(), "view started");
        }
        self.view.sync_view();
    }

    /// Unregister from every observable.
    pub fn on_stop(&self) {
        if self.started.swap(false, Ordering::AcqRel) {
            for observable in &self.observables {
                observable.remove_observer(&self.observer);
            }
            tracing::trace!(target: TARGET, "view stopped");
        }
    }
}

impl Drop for LifecycleSyncer {
    fn drop(&mut self) {
        self.on_stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::ObservableImp;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingView {
        syncs: AtomicUsize,
    }

    impl SyncableView for CountingView {
        fn sync_view(&self) {
            self.syncs.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup() -> (Arc<CountingView>, Arc<ObservableImp>, Arc<ObservableImp>, LifecycleSyncer) {
        let view = Arc::new(CountingView::default());
        let first = Arc::new(ObservableImp::new());
        let second = Arc::new(ObservableImp::new());
        let observables: Vec<Arc<dyn Observable>> = vec![first.clone(), second.clone()];
        let syncer = LifecycleSyncer::new(view.clone(), observables);
        (view, first, second, syncer)
    }

    #[test]
    fn test_start_registers_and_syncs_immediately() {
        let (view, first, second, syncer) = setup();

        syncer.on_start();
        assert_eq!(view.syncs.load(Ordering::SeqCst), 1);
        assert!(first.has_observers());
        assert!(second.has_observers());

        first.notify_observers();
        second.notify_observers();
        assert_eq!(view.syncs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_stop_unregisters() {
        let (view, first, second, syncer) = setup();

        syncer.on_start();
        syncer.on_stop();
        assert!(!first.has_observers());
        assert!(!second.has_observers());

        first.notify_observers();
        assert_eq!(view.syncs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_restart_does_not_double_register() {
        let (view, first, _second, syncer) = setup();

        syncer.on_start();
        syncer.on_start();
        assert_eq!(first.observer_count(), 1);
        assert_eq!(view.syncs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_unregisters() {
        let (_view, first, _second, syncer) = setup();
        syncer.on_start();
        drop(syncer);
        assert!(!first.has_observers());
    }
}
