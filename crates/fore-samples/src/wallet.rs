//! Two wallets sharing a fixed total.

use std::sync::Arc;

use fore_core::{Observable, ObservableImp, Observer};
use parking_lot::Mutex;

const TARGET: &str = "fore_samples::wallet";

/// Total dollars available when none is configured.
pub const DEFAULT_TOTAL_DOLLARS: u32 = 10;

struct WalletInner {
    total: u32,
    mobile: Mutex<u32>,
    observable: ObservableImp,
}

/// Dollars split between a mobile wallet and a savings wallet.
///
/// Whatever is not in the mobile wallet is in savings.
#[derive(Clone)]
pub struct Wallet {
    inner: Arc<WalletInner>,
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("total", &self.inner.total)
            .field("mobile", &self.mobile_wallet_amount())
            .finish()
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new(DEFAULT_TOTAL_DOLLARS)
    }
}

impl Wallet {
    /// A wallet with everything in savings.
    pub fn new(total_dollars: u32) -> Self {
        Self {
            inner: Arc::new(WalletInner {
                total: total_dollars,
                mobile: Mutex::new(0),
                observable: ObservableImp::new(),
            }),
        }
    }

    /// Dollars across both wallets. Fixed at construction.
    pub fn total_dollars(&self) -> u32 {
        self.inner.total
    }

    /// Dollars in the mobile wallet.
    pub fn mobile_wallet_amount(&self) -> u32 {
        *self.inner.mobile.lock()
    }

    /// Dollars in the savings wallet.
    pub fn savings_wallet_amount(&self) -> u32 {
        self.inner.total - self.mobile_wallet_amount()
    }

    /// Whether savings has a dollar to move to mobile.
    pub fn can_increase(&self) -> bool {
        self.mobile_wallet_amount() < self.inner.total
    }

    /// Whether mobile has a dollar to move back to savings.
    pub fn can_decrease(&self) -> bool {
        self.mobile_wallet_amount() > 0
    }

    /// Move one dollar from savings to mobile. Returns whether it moved.
    pub fn increase_mobile_wallet(&self) -> bool {
        self.transfer(|mobile, total| (mobile < total).then(|| mobile + 1))
    }

    /// Move one dollar from mobile to savings. Returns whether it moved.
    pub fn decrease_mobile_wallet(&self) -> bool {
        self.transfer(|mobile, _| mobile.checked_sub(1))
    }

    fn transfer(&self, next: impl FnOnce(u32, u32) -> Option<u32>) -> bool {
        let changed = {
            let mut mobile = self.inner.mobile.lock();
            match next(*mobile, self.inner.total) {
                Some(amount) => {
                    *mobile = amount;
                    tracing::debug!(target: TARGET, mobile = amount, "wallet changed");
                    true
                }
                None => false,
            }
        };
        if changed {
            self.notify_observers();
        }
        changed
    }
}

impl Observable for Wallet {
    fn add_observer(&self, observer: &Arc<dyn Observer>) {
        self.inner.observable.add_observer(observer);
    }

    fn remove_observer(&self, observer: &Arc<dyn Observer>) {
        self.inner.observable.remove_observer(observer);
    }

    fn notify_observers(&self) {
        self.inner.observable.notify_observers();
    }

    fn has_observers(&self) -> bool {
        self.inner.observable.has_observers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_starts_all_in_savings() {
        let wallet = Wallet::default();
        assert_eq!(wallet.total_dollars(), 10);
        assert_eq!(wallet.mobile_wallet_amount(), 0);
        assert_eq!(wallet.savings_wallet_amount(), 10);
    }

    #[test]
    fn test_cannot_go_below_zero() {
        let wallet = Wallet::new(3);
        assert!(!wallet.decrease_mobile_wallet());
        assert_eq!(wallet.mobile_wallet_amount(), 0);
    }

    #[test]
    fn test_cannot_exceed_total() {
        let wallet = Wallet::new(2);
        assert!(wallet.increase_mobile_wallet());
        assert!(wallet.increase_mobile_wallet());
        assert!(!wallet.increase_mobile_wallet());
        assert_eq!(wallet.mobile_wallet_amount(), 2);
        assert_eq!(wallet.savings_wallet_amount(), 0);
    }

    #[test]
    fn test_notifies_only_on_change() {
        let wallet = Wallet::new(1);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let observer: Arc<dyn Observer> = Arc::new(move || {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });
        wallet.add_observer(&observer);

        wallet.increase_mobile_wallet();
        wallet.increase_mobile_wallet();
        wallet.decrease_mobile_wallet();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
