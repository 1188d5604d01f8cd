//! `SqliteDatabase` is the concrete SQLite implementation of a storefront engine backend.
//!
//! It implements all the traits defined in the [`crate::traits`] module. Every multi-statement operation runs in its
//! own transaction, obtained with `self.pool.begin()`.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{accounts, catalog, db_url, inventory, new_pool, orders, settlement, wallet};
use crate::{
    db_types::{
        CommissionRates,
        Kobo,
        LedgerAccount,
        LedgerEntry,
        NewDiscrepancy,
        NewLedgerEntry,
        NewOrder,
        NewReferral,
        Order,
        OrderLine,
        OrderStatus,
        PricingSettings,
        Referral,
        SettlementDiscrepancy,
        ShippingInfo,
        Sku,
        TransactionType,
        UserAccount,
        WalletAudit,
    },
    helpers::wallet_reference,
    traits::{
        AccountManagement,
        CatalogManagement,
        InventoryManagement,
        StockCommit,
        StoreDbError,
        StorefrontDatabase,
        WalletManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `SF_DATABASE_URL` environment variable, or the default URL.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool for {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    /// Applies any outstanding schema migrations.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    /// Returns a reference to the database connection pool. Used by tests to seed data.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn fetch_skus(&self, sku_ids: &[i64]) -> Result<Vec<Sku>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let skus = catalog::fetch_skus(sku_ids, &mut conn).await?;
        Ok(skus)
    }

    async fn fetch_pricing_settings(&self) -> Result<PricingSettings, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_pricing_settings(&mut conn).await
    }

    async fn fetch_commission_rates(&self) -> Result<CommissionRates, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        catalog::fetch_commission_rates(&mut conn).await
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<UserAccount>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let user = accounts::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_affiliate_by_code(&self, code: &str) -> Result<Option<UserAccount>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let user = accounts::fetch_affiliate_by_code(code, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_orders_for_user(
        &self,
        user_id: i64,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::fetch_orders_for_user(user_id, status, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_lines(&self, order_id: i64) -> Result<Vec<OrderLine>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let lines = orders::fetch_order_lines(order_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_shipping_info(&self, shipping_id: i64) -> Result<Option<ShippingInfo>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let info = orders::fetch_shipping_info(shipping_id, &mut conn).await?;
        Ok(info)
    }

    async fn fetch_referrals(&self, affiliate_id: i64) -> Result<Vec<Referral>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let referrals = accounts::fetch_referrals(affiliate_id, &mut conn).await?;
        Ok(referrals)
    }

    async fn fetch_ledger_entries(
        &self,
        owner_id: i64,
        types: &[TransactionType],
        limit: i64,
    ) -> Result<Vec<LedgerEntry>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let entries = accounts::fetch_ledger_entries(owner_id, types, limit, &mut conn).await?;
        Ok(entries)
    }

    async fn fetch_discrepancies(&self, order_id: i64) -> Result<Vec<SettlementDiscrepancy>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let rows = settlement::fetch_discrepancies(order_id, &mut conn).await?;
        Ok(rows)
    }

    async fn register_affiliate(&self, user_id: i64, code: &str) -> Result<Option<UserAccount>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let user = accounts::register_affiliate(user_id, code, &mut conn).await?;
        Ok(user)
    }
}

impl InventoryManagement for SqliteDatabase {
    async fn decrement_if_available(&self, sku_id: i64, quantity: i64) -> Result<i64, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        inventory::decrement_if_available(sku_id, quantity, &mut conn).await
    }

    async fn commit_line_stock(&self, line: &OrderLine) -> Result<StockCommit, StoreDbError> {
        let mut tx = self.pool.begin().await?;
        if !inventory::mark_line_committed(line, &mut tx).await? {
            trace!("📦️ Stock for line #{} of order #{} was committed earlier", line.id, line.order_id);
            return Ok(StockCommit::AlreadyCommitted);
        }
        // Dropping the transaction on error rolls the marker back
        let remaining = inventory::decrement_if_available(line.sku_id, line.quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(StockCommit::Committed { remaining })
    }
}

impl WalletManagement for SqliteDatabase {
    async fn debit_wallet(&self, entry: NewLedgerEntry) -> Result<Kobo, StoreDbError> {
        let mut tx = self.pool.begin().await?;
        let balance = wallet::debit(entry, &mut tx).await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn credit_wallet(&self, entry: NewLedgerEntry) -> Result<Kobo, StoreDbError> {
        let mut tx = self.pool.begin().await?;
        let balance = wallet::credit(entry, &mut tx).await?;
        tx.commit().await?;
        Ok(balance)
    }

    async fn wallet_audit(&self, owner_id: i64) -> Result<WalletAudit, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        wallet::wallet_audit(owner_id, &mut conn).await
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_order(&self, order: NewOrder) -> Result<(Order, Vec<OrderLine>), StoreDbError> {
        let user_id = order.user_id;
        let wallet_deduction = order.wallet_deduction;
        let mut tx = self.pool.begin().await?;
        let (order, lines) = orders::insert_order(order, &mut tx).await?;
        if wallet_deduction.is_positive() {
            let entry = NewLedgerEntry::wallet(
                user_id,
                TransactionType::Payment,
                -wallet_deduction,
                wallet_reference(&order.order_number),
            )
            .for_order(order.id)
            .with_metadata(serde_json::json!({ "payment_method": "wallet", "order_number": order.order_number }));
            wallet::debit(entry, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {} committed", order.order_number);
        Ok((order, lines))
    }

    async fn attach_payment_reference(&self, order_id: i64, reference: &str) -> Result<Option<Order>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::attach_payment_reference(order_id, reference, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_payment_reference(
        &self,
        order_id: i64,
        reference: &str,
    ) -> Result<Option<Order>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_payment_reference(order_id, reference, &mut conn).await?;
        Ok(order)
    }

    async fn mark_order_paid(&self, order_id: i64, reference: &str) -> Result<Option<Order>, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let order = settlement::mark_order_paid(order_id, reference, &mut conn).await?;
        Ok(order)
    }

    async fn record_discrepancy(&self, discrepancy: NewDiscrepancy) -> Result<bool, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let inserted = settlement::insert_discrepancy(discrepancy, &mut conn).await?;
        Ok(inserted)
    }

    async fn record_gateway_payment(&self, entry: NewLedgerEntry) -> Result<bool, StoreDbError> {
        let entry = entry.with_account(LedgerAccount::Gateway);
        let mut conn = self.pool.acquire().await?;
        match wallet::insert_ledger_entry(entry, &mut conn).await.map_err(StoreDbError::from) {
            Ok(e) => {
                debug!("🗃️ Gateway payment {} of {} recorded", e.reference, e.amount);
                Ok(true)
            },
            Err(StoreDbError::DuplicateEntry(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn award_commission(
        &self,
        referral: NewReferral,
        entry: NewLedgerEntry,
    ) -> Result<Option<Referral>, StoreDbError> {
        let mut tx = self.pool.begin().await?;
        let Some(referral) = settlement::insert_referral(referral, &mut tx).await? else {
            return Ok(None);
        };
        wallet::credit(entry, &mut tx).await?;
        tx.commit().await?;
        Ok(Some(referral))
    }

    async fn complete_settlement(&self, order_id: i64) -> Result<bool, StoreDbError> {
        let mut conn = self.pool.acquire().await?;
        let completed = settlement::complete_settlement(order_id, &mut conn).await?;
        Ok(completed)
    }
}
