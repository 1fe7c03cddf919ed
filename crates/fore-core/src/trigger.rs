//! One-shot triggers for transient feedback during a view sync.
//!
//! Views sync from state, and with at-least-once notification a sync can run
//! many times for the same state. A [`SyncTrigger`] turns "the condition is
//! true" into "the condition just became true", so an action such as showing
//! a message fires once per state change instead of once per sync.

use std::sync::atomic::{AtomicBool, Ordering};

/// When a fired trigger may fire again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResetRule {
    /// Re-arm only after a check sees the condition false.
    #[default]
    OnlyAfterReversion,
    /// Re-arm right after firing: every check that sees the condition true fires.
    Immediately,
}

type Condition = Box<dyn Fn() -> bool + Send + Sync>;
type Action = Box<dyn Fn() + Send + Sync>;

/// Fires an action when a condition becomes true.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
/// use fore_core::SyncTrigger;
///
/// let busy = Arc::new(AtomicBool::new(false));
/// let fired = Arc::new(AtomicUsize::new(0));
///
/// let busy_clone = busy.clone();
/// let fired_clone = fired.clone();
/// let trigger = SyncTrigger::new(
///     move || busy_clone.load(Ordering::SeqCst),
///     move || { fired_clone.fetch_add(1, Ordering::SeqCst); },
/// );
///
/// trigger.check();
/// busy.store(true, Ordering::SeqCst);
/// trigger.check();
/// trigger.check();
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// ```
pub struct SyncTrigger {
    condition: Condition,
    action: Action,
    reset_rule: ResetRule,
    armed: AtomicBool,
    checked_once: AtomicBool,
}

impl std::fmt::Debug for SyncTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncTrigger")
            .field("reset_rule", &self.reset_rule)
            .field("armed", &self.is_armed())
            .finish()
    }
}

impl SyncTrigger {
    /// A trigger with [`ResetRule::OnlyAfterReversion`].
    pub fn new<C, A>(condition: C, action: A) -> Self
    where
        C: Fn() -> bool + Send + Sync + 'static,
        A: Fn() + Send + Sync + 'static,
    {
        Self::with_reset_rule(condition, action, ResetRule::default())
    }

    /// A trigger with an explicit reset rule.
    pub fn with_reset_rule<C, A>(condition: C, action: A, reset_rule: ResetRule) -> Self
    where
        C: Fn() -> bool + Send + Sync + 'static,
        A: Fn() + Send + Sync + 'static,
    {
        Self {
            condition: Box::new(condition),
            action: Box::new(action),
            reset_rule,
            armed: AtomicBool::new(true),
            checked_once: AtomicBool::new(false),
        }
    }

    pub fn reset_rule(&self) -> ResetRule {
        self.reset_rule
    }

    /// Whether the next check that sees the condition true will fire.
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Evaluate the condition and fire if it became true.
    ///
    /// Returns `true` if the action ran.
    pub fn check(&self) -> bool {
        self.checked_once.store(true, Ordering::Release);
        if !(self.condition)() {
            self.armed.store(true, Ordering::Release);
            return false;
        }
        if self.reset_rule == ResetRule::OnlyAfterReversion
            && !self.armed.swap(false, Ordering::AcqRel)
        {
            return false;
        }
        (self.action)();
        true
    }

    /// Like [`check`](Self::check), except that the very first check never
    /// fires: it only records whether the condition already holds.
    ///
    /// Use this when a view is recreated over existing state and must not
    /// repeat feedback that was already shown.
    pub fn check_lazy(&self) -> bool {
        if self.checked_once.swap(true, Ordering::AcqRel) {
            return self.check();
        }
        let holds = (self.condition)();
        self.armed.store(!holds, Ordering::Release);
        false
    }
}

static_assertions::assert_impl_all!(SyncTrigger: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    fn trigger(rule: ResetRule) -> (SyncTrigger, Arc<AtomicBool>, Arc<AtomicUsize>) {
        let flag = Arc::new(AtomicBool::new(false));
        let fired = Arc::new(AtomicUsize::new(0));
        let flag_clone = flag.clone();
        let fired_clone = fired.clone();
        let trigger = SyncTrigger::with_reset_rule(
            move || flag_clone.load(Ordering::SeqCst),
            move || {
                fired_clone.fetch_add(1, Ordering::SeqCst);
            },
            rule,
        );
        (trigger, flag, fired)
    }

    #[test]
    fn test_fires_once_until_reversion() {
        let (trigger, flag, fired) = trigger(ResetRule::OnlyAfterReversion);

        assert!(!trigger.check());
        flag.store(true, Ordering::SeqCst);
        assert!(trigger.check());
        assert!(!trigger.check());
        assert!(!trigger.check());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        flag.store(false, Ordering::SeqCst);
        trigger.check();
        flag.store(true, Ordering::SeqCst);
        assert!(trigger.check());
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_immediately_fires_every_true_check() {
        let (trigger, flag, fired) = trigger(ResetRule::Immediately);

        flag.store(true, Ordering::SeqCst);
        trigger.check();
        trigger.check();
        trigger.check();
        assert_eq!(fired.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_check_lazy_skips_existing_state() {
        let (trigger, flag, fired) = trigger(ResetRule::OnlyAfterReversion);

        flag.store(true, Ordering::SeqCst);
        assert!(!trigger.check_lazy());
        assert!(!trigger.check_lazy());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        flag.store(false, Ordering::SeqCst);
        trigger.check_lazy();
        flag.store(true, Ordering::SeqCst);
        assert!(trigger.check_lazy());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_check_lazy_first_check_false_stays_armed() {
        let (trigger, flag, fired) = trigger(ResetRule::OnlyAfterReversion);

        assert!(!trigger.check_lazy());
        assert!(trigger.is_armed());
        flag.store(true, Ordering::SeqCst);
        assert!(trigger.check_lazy());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
