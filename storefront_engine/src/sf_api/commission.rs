//! Affiliate commission arithmetic.
//!
//! A line earns `size_value × quantity × amount / per_unit`, using the rate for the SKU's product category. For
//! example, 3 × 2kg tubs of a category paying ₦500 per 1kg earn ₦3,000. Line contributions are summed in fractional
//! kobo and the total is rounded once, to the nearest whole kobo.
use log::*;

use crate::{
    db_types::{CommissionRates, Kobo, OrderLine, Sku},
    sf_api::errors::StorefrontError,
};

pub fn calculate_commission(
    lines: &[OrderLine],
    skus: &[Sku],
    rates: &CommissionRates,
) -> Result<Kobo, StorefrontError> {
    let mut total = 0.0f64;
    for line in lines {
        let Some(sku) = skus.iter().find(|s| s.id == line.sku_id) else {
            warn!("🤝️ SKU #{} on order #{} no longer exists. It earns no commission.", line.sku_id, line.order_id);
            continue;
        };
        let Some(rate) = rates.rate_for(&sku.category) else {
            warn!("🤝️ No commission rate is configured for category {}. SKU #{} earns no commission.", sku.category, sku.id);
            continue;
        };
        let contribution = sku.size_value * line.quantity as f64 * rate.amount.value() as f64 / rate.per_unit;
        trace!("🤝️ SKU #{} x {} earns {contribution} kobo", sku.id, line.quantity);
        total += contribution;
    }
    Kobo::from_fractional(total).map_err(|e| StorefrontError::InvalidAmount(e.to_string()))
}
