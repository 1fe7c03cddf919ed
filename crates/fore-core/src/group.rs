//! Grouping several observables behind one [`Observable`].
//!
//! Views that depend on more than one model register a single observer with
//! an [`ObservableGroup`] instead of with each model in turn.

use std::sync::Arc;

use crate::observer::{Observable, Observer};

/// A fixed set of observables treated as one.
///
/// Adding or removing an observer applies it to every member.
/// `notify_observers` notifies through every member, so an observer that is
/// registered with several members may be called more than once; that is
/// within the at-least-once notification contract.
#[derive(Clone)]
pub struct ObservableGroup {
    members: Vec<Arc<dyn Observable>>,
}

impl ObservableGroup {
    /// Create a group from its members.
    pub fn new(members: Vec<Arc<dyn Observable>>) -> Self {
        Self { members }
    }

    /// Number of members in the group.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl Observable for ObservableGroup {
    fn add_observer(&self, observer: &Arc<dyn Observer>) {
        for member in &self.members {
            member.add_observer(observer);
        }
    }

    fn remove_observer(&self, observer: &Arc<dyn Observer>) {
        for member in &self.members {
            member.remove_observer(observer);
        }
    }

    fn notify_observers(&self) {
        for member in &self.members {
            member.notify_observers();
        }
    }

    fn has_observers(&self) -> bool {
        self.members.iter().any(|m| m.has_observers())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::ObservableImp;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_group_registers_with_every_member() {
        let first = Arc::new(ObservableImp::new());
        let second = Arc::new(ObservableImp::new());
        let members: Vec<Arc<dyn Observable>> = vec![first.clone(), second.clone()];
        let group = ObservableGroup::new(members);
        assert_eq!(group.len(), 2);

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let observer: Arc<dyn Observer> = Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        group.add_observer(&observer);
        assert!(first.has_observers());
        assert!(second.has_observers());

        second.notify_observers();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        group.remove_observer(&observer);
        assert!(!group.has_observers());
        first.notify_observers();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_group() {
        let group = ObservableGroup::new(Vec::new());
        assert!(group.is_empty());
        assert!(!group.has_observers());
        group.notify_observers();
    }
}
