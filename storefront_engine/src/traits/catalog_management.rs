use crate::{
    db_types::{CommissionRates, PricingSettings, Sku},
    traits::StoreDbError,
};

/// Read access to the product catalog and the store-wide pricing settings.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches all the SKUs in `sku_ids` that exist. SKUs of inactive products are returned too, with `is_active`
    /// unset. Missing ids are silently skipped, so callers must check.
    async fn fetch_skus(&self, sku_ids: &[i64]) -> Result<Vec<Sku>, StoreDbError>;

    /// Current affiliate discount percentage and delivery fee table. Missing settings take their defaults.
    async fn fetch_pricing_settings(&self) -> Result<PricingSettings, StoreDbError>;

    async fn fetch_commission_rates(&self) -> Result<CommissionRates, StoreDbError>;
}
