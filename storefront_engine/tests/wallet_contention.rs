use futures_util::future::join_all;
use storefront_engine::{
    db_types::{Kobo, NewLedgerEntry, TransactionType},
    traits::{AccountManagement, WalletManagement},
    StorefrontError,
    WalletApi,
};
use support::Shop;

mod support;

fn adjustment(owner_id: i64, n: usize) -> NewLedgerEntry {
    NewLedgerEntry::wallet(owner_id, TransactionType::Adjustment, Kobo::default(), format!("ADJ-{owner_id}-{n}"))
}

#[tokio::test]
async fn concurrent_debits_never_overdraw() {
    let shop = Shop::with_buyer_balance(Kobo::from_naira(10_000)).await;
    let wallet = WalletApi::new(shop.db.clone());
    let debits = (0..10).map(|n| wallet.debit(Kobo::from_naira(3_000), adjustment(shop.buyer_id, n)));
    let results = join_all(debits).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 3, "{results:?}");
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, StorefrontError::InsufficientBalance { .. })));

    let buyer = shop.db.fetch_user(shop.buyer_id).await.unwrap().unwrap();
    assert_eq!(buyer.wallet_balance, Kobo::from_naira(1_000));
    let audit = wallet.audit(shop.buyer_id).await.unwrap();
    assert!(audit.is_consistent(), "{audit:?}");
    assert_eq!(audit.ledger_sum, Kobo::from_naira(1_000));
    shop.tear_down().await;
}

#[tokio::test]
async fn ledger_tracks_mixed_traffic() {
    let shop = Shop::with_buyer_balance(Kobo::from_naira(500)).await;
    let wallet = WalletApi::new(shop.db.clone());
    let credits = join_all((0..8).map(|n| wallet.credit(Kobo::from(12_345), adjustment(shop.buyer_id, n)))).await;
    assert!(credits.iter().all(|r| r.is_ok()));
    let debits = join_all((8..20).map(|n| wallet.debit(Kobo::from(10_000), adjustment(shop.buyer_id, n)))).await;
    let debited = debits.iter().filter(|r| r.is_ok()).count() as i64;

    let expected = Kobo::from_naira(500) + Kobo::from(12_345 * 8) - Kobo::from(10_000 * debited);
    let audit = shop.db.wallet_audit(shop.buyer_id).await.unwrap();
    assert_eq!(audit.balance, expected);
    assert!(audit.is_consistent(), "{audit:?}");
    assert!(!audit.balance.is_negative());
    shop.tear_down().await;
}

#[tokio::test]
async fn invalid_amounts_are_rejected() {
    let shop = Shop::with_buyer_balance(Kobo::from_naira(500)).await;
    let wallet = WalletApi::new(shop.db.clone());
    let err = wallet.debit(Kobo::default(), adjustment(shop.buyer_id, 0)).await.unwrap_err();
    assert!(matches!(err, StorefrontError::InvalidAmount(_)));
    let err = wallet.credit(Kobo::from(-1), adjustment(shop.buyer_id, 1)).await.unwrap_err();
    assert!(matches!(err, StorefrontError::InvalidAmount(_)));
    // References are unique across the ledger
    wallet.credit(Kobo::from(100), adjustment(shop.buyer_id, 2)).await.unwrap();
    assert!(wallet.credit(Kobo::from(100), adjustment(shop.buyer_id, 2)).await.is_err());
    let audit = wallet.audit(shop.buyer_id).await.unwrap();
    assert_eq!(audit.balance, Kobo::from(50_100));
    assert!(audit.is_consistent());
    shop.tear_down().await;
}
