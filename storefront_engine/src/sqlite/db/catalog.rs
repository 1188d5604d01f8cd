use std::collections::HashMap;

use log::{trace, warn};
use serde::de::DeserializeOwned;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{CommissionRate, CommissionRates, DeliveryFees, Kobo, PricingSettings, Sku},
    traits::StoreDbError,
};

pub const DISCOUNT_PERCENTAGE_KEY: &str = "affiliate_discount_percentage";
pub const DELIVERY_FEES_KEY: &str = "delivery_fees";
pub const COMMISSION_RATES_KEY: &str = "affiliate_commission_rates";

const SKU_SELECT: &str = r#"
    SELECT
        skus.id AS id,
        skus.product_id AS product_id,
        products.name AS product_name,
        products.category AS category,
        skus.size_label AS size_label,
        skus.size_value AS size_value,
        skus.price AS price,
        skus.stock AS stock,
        products.is_active AS is_active
    FROM skus JOIN products ON products.id = skus.product_id
"#;

pub async fn fetch_skus(sku_ids: &[i64], conn: &mut SqliteConnection) -> Result<Vec<Sku>, sqlx::Error> {
    if sku_ids.is_empty() {
        return Ok(vec![]);
    }
    let mut builder = QueryBuilder::new(SKU_SELECT);
    builder.push(" WHERE skus.id IN (");
    let mut ids = builder.separated(", ");
    for id in sku_ids {
        ids.push_bind(*id);
    }
    builder.push(") ORDER BY skus.id");
    trace!("🗃️ Executing query: {}", builder.sql());
    let skus = builder.build_query_as::<Sku>().fetch_all(conn).await?;
    Ok(skus)
}

/// Returns the raw JSON value of a store setting, if it is set.
pub async fn fetch_setting(key: &str, conn: &mut SqliteConnection) -> Result<Option<String>, sqlx::Error> {
    let value: Option<(String,)> =
        sqlx::query_as("SELECT value FROM settings WHERE key = $1").bind(key).fetch_optional(conn).await?;
    Ok(value.map(|(v,)| v))
}

/// Upserts a store setting. Settings are owned by the admin surface; the engine only writes them in tests and seeds.
pub async fn upsert_setting(key: &str, value: &str, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"INSERT INTO settings (key, value) VALUES ($1, $2)
        ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP"#,
    )
    .bind(key)
    .bind(value)
    .execute(conn)
    .await?;
    Ok(())
}

fn parse_setting<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T, StoreDbError> {
    serde_json::from_str(raw).map_err(|e| StoreDbError::InvalidSetting { key: key.to_string(), reason: e.to_string() })
}

/// The discount percentage may be stored as a JSON number or as a numeric string.
fn parse_percentage(raw: &str) -> Result<f64, StoreDbError> {
    let value: serde_json::Value = parse_setting(DISCOUNT_PERCENTAGE_KEY, raw)?;
    let percentage = match &value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match percentage {
        Some(p) if p.is_finite() && (0.0..=100.0).contains(&p) => Ok(p),
        _ => Err(StoreDbError::InvalidSetting {
            key: DISCOUNT_PERCENTAGE_KEY.to_string(),
            reason: format!("{value} is not a percentage between 0 and 100"),
        }),
    }
}

pub async fn fetch_pricing_settings(conn: &mut SqliteConnection) -> Result<PricingSettings, StoreDbError> {
    let mut settings = PricingSettings::default();
    match fetch_setting(DISCOUNT_PERCENTAGE_KEY, conn).await? {
        Some(raw) => settings.discount_percentage = parse_percentage(&raw)?,
        None => warn!("🗃️ {DISCOUNT_PERCENTAGE_KEY} is not set. Using {}%", settings.discount_percentage),
    }
    if let Some(raw) = fetch_setting(DELIVERY_FEES_KEY, conn).await? {
        let table: HashMap<String, HashMap<String, Kobo>> = parse_setting(DELIVERY_FEES_KEY, &raw)?;
        settings.delivery_fees = DeliveryFees::new(table);
    }
    Ok(settings)
}

pub async fn fetch_commission_rates(conn: &mut SqliteConnection) -> Result<CommissionRates, StoreDbError> {
    let rates = match fetch_setting(COMMISSION_RATES_KEY, conn).await? {
        Some(raw) => {
            let rates: HashMap<String, CommissionRate> = parse_setting(COMMISSION_RATES_KEY, &raw)?;
            CommissionRates::new(rates)
        },
        None => {
            warn!("🗃️ {COMMISSION_RATES_KEY} is not set. No commission will be paid on new orders.");
            CommissionRates::default()
        },
    };
    Ok(rates)
}
