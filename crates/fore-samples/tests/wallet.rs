//! Wallet scenario.

use fore_samples::Wallet;

#[test]
fn test_wallet_fills_mobile_from_savings() {
    let wallet = Wallet::new(10);
    assert_eq!(wallet.mobile_wallet_amount(), 0);
    assert!(wallet.can_increase());
    assert!(!wallet.can_decrease());

    for _ in 0..10 {
        assert!(wallet.increase_mobile_wallet());
    }

    assert!(!wallet.can_increase());
    assert!(wallet.can_decrease());
    assert_eq!(wallet.savings_wallet_amount(), 0);
    assert_eq!(wallet.mobile_wallet_amount(), 10);

    assert!(wallet.decrease_mobile_wallet());
    assert_eq!(wallet.savings_wallet_amount(), 1);
}
