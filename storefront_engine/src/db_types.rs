//! Data types shared between the storefront backends and the public API.
//!
//! Everything that is stored in, or read from, the database lives here. Monetary amounts are always [`Kobo`].
use std::{collections::HashMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
pub use sf_common::Kobo;
use sqlx::{types::Json, FromRow, Type};
use thiserror::Error;

/// Delivery fee charged when neither the city nor the state has a configured fee (₦2,000).
pub const DEFAULT_DELIVERY_FEE: Kobo = Kobo::from_naira(2_000);
/// Affiliate discount applied when the setting is missing.
pub const DEFAULT_DISCOUNT_PERCENTAGE: f64 = 5.0;

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind} value: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

/// Implements `Display` and `FromStr` for the fieldless enums that are stored as TEXT columns.
macro_rules! text_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, stringify!($variant)),)+
                }
            }
        }

        impl FromStr for $name {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    s => Err(ConversionError { kind: stringify!($name), value: s.to_string() }),
                }
            }
        }
    };
}

//--------------------------------------   PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// No successful charge has been reconciled yet
    Pending,
    /// The order has been settled
    Paid,
    Failed,
}

text_enum!(PaymentStatus { Pending, Paid, Failed });

//--------------------------------------    OrderStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    /// Settled and waiting for fulfilment
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Completed,
}

text_enum!(OrderStatus { Pending, Processing, Shipped, Delivered, Cancelled, Completed });

//--------------------------------------  TransactionType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Payment,
    Refund,
    Commission,
    Withdrawal,
    Adjustment,
}

text_enum!(TransactionType { Payment, Refund, Commission, Withdrawal, Adjustment });

//-------------------------------------- TransactionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

text_enum!(TransactionStatus { Pending, Completed, Failed });

//--------------------------------------   LedgerAccount     ---------------------------------------------------------
/// Which balance a ledger entry describes. Only `Wallet` entries move `users.wallet_balance`; `Gateway` entries record
/// money captured by the payment gateway on the owner's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerAccount {
    Wallet,
    Gateway,
}

text_enum!(LedgerAccount { Wallet, Gateway });

//--------------------------------------    UserAccount      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub is_affiliate: bool,
    pub affiliate_code: Option<String>,
    pub affiliate_approved: bool,
    pub wallet_balance: Kobo,
    pub bank_account_name: Option<String>,
    pub bank_account_number: Option<String>,
    pub bank_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn is_approved_affiliate(&self) -> bool {
        self.is_affiliate && self.affiliate_approved
    }

    pub fn bank_details(&self) -> Option<BankDetails> {
        let non_blank = |s: &Option<String>| s.as_ref().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        Some(BankDetails {
            account_name: non_blank(&self.bank_account_name)?,
            account_number: non_blank(&self.bank_account_number)?,
            bank_name: non_blank(&self.bank_name)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    pub account_name: String,
    pub account_number: String,
    pub bank_name: String,
}

//--------------------------------------        Sku          ---------------------------------------------------------
/// A purchasable SKU joined with its product. `size_value` is the physical quantity (e.g. kg or litres) that
/// commission rates are expressed against.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Sku {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub category: String,
    pub size_label: String,
    pub size_value: f64,
    pub price: Kobo,
    pub stock: i64,
    /// Inactive products can no longer be bought, but their SKUs still resolve for orders placed earlier.
    pub is_active: bool,
}

//--------------------------------------   ShippingInfo      ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub full_name: String,
    pub phone: String,
    pub email: String,
    pub state: String,
    pub city: String,
    pub address: String,
}

//--------------------------------------       Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub user_id: i64,
    pub shipping_id: i64,
    pub subtotal: Kobo,
    pub discount: Kobo,
    pub delivery_fee: Kobo,
    pub wallet_deduction: Kobo,
    pub total: Kobo,
    pub affiliate_code: Option<String>,
    pub affiliate_id: Option<i64>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub payment_reference: Option<String>,
    pub settlement_complete: bool,
    #[serde(skip)]
    pub commission_rates: Json<CommissionRates>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// The amount the payment gateway is expected to capture.
    pub fn amount_due(&self) -> Kobo {
        self.total
    }
}

//--------------------------------------      OrderLine      ---------------------------------------------------------
/// Price snapshot of one cart line at the time of purchase. Never modified after creation, apart from the
/// `stock_committed` marker that settlement sets when the line's stock has been taken out of inventory.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub sku_id: i64,
    pub quantity: i64,
    pub unit_price: Kobo,
    pub line_total: Kobo,
    pub stock_committed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub sku_id: i64,
    pub quantity: i64,
    pub unit_price: Kobo,
    pub line_total: Kobo,
}

//--------------------------------------      NewOrder       ---------------------------------------------------------
/// A fully priced order, ready to be persisted. Built from a [`crate::sf_api::pricing::PriceBreakdown`], never from
/// client-supplied amounts.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: i64,
    pub shipping: ShippingInfo,
    pub subtotal: Kobo,
    pub discount: Kobo,
    pub delivery_fee: Kobo,
    pub wallet_deduction: Kobo,
    pub total: Kobo,
    pub affiliate_code: Option<String>,
    pub affiliate_id: Option<i64>,
    pub lines: Vec<NewOrderLine>,
    pub commission_rates: CommissionRates,
}

//--------------------------------------     LedgerEntry     ---------------------------------------------------------
/// A row of the append-only `transactions` ledger.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub owner_id: i64,
    pub order_id: Option<i64>,
    pub tx_type: TransactionType,
    pub account: LedgerAccount,
    pub amount: Kobo,
    pub reference: String,
    pub status: TransactionStatus,
    pub metadata: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewLedgerEntry {
    pub owner_id: i64,
    pub order_id: Option<i64>,
    pub tx_type: TransactionType,
    pub account: LedgerAccount,
    /// Signed amount. Debits are negative.
    pub amount: Kobo,
    pub reference: String,
    pub status: TransactionStatus,
    pub metadata: serde_json::Value,
}

impl NewLedgerEntry {
    /// A completed wallet entry with empty metadata.
    pub fn wallet(owner_id: i64, tx_type: TransactionType, amount: Kobo, reference: String) -> Self {
        Self {
            owner_id,
            order_id: None,
            tx_type,
            account: LedgerAccount::Wallet,
            amount,
            reference,
            status: TransactionStatus::Completed,
            metadata: serde_json::json!({}),
        }
    }

    pub fn for_order(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_account(mut self, account: LedgerAccount) -> Self {
        self.account = account;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

//--------------------------------------      Referral       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Referral {
    pub id: i64,
    pub affiliate_id: i64,
    pub order_id: i64,
    pub buyer_id: i64,
    pub commission_amount: Kobo,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReferral {
    pub affiliate_id: i64,
    pub order_id: i64,
    pub buyer_id: i64,
    pub commission_amount: Kobo,
}

//-------------------------------------- SettlementDiscrepancy -------------------------------------------------------
/// A line whose stock could not be taken out of inventory while settling a paid order.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SettlementDiscrepancy {
    pub id: i64,
    pub order_id: i64,
    pub sku_id: i64,
    pub requested: i64,
    pub available: i64,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDiscrepancy {
    pub order_id: i64,
    pub sku_id: i64,
    pub requested: i64,
    pub available: i64,
    pub reason: String,
}

//--------------------------------------   Store settings    ---------------------------------------------------------
/// Delivery fees keyed by upper-cased state, then by upper-cased city. The city key `DEFAULT` holds the state-wide
/// fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryFees(HashMap<String, HashMap<String, Kobo>>);

impl DeliveryFees {
    pub const STATE_DEFAULT_KEY: &'static str = "DEFAULT";

    /// Builds a fee table, normalising all keys so that lookups are case-insensitive.
    pub fn new(table: HashMap<String, HashMap<String, Kobo>>) -> Self {
        let normalised = table
            .into_iter()
            .map(|(state, cities)| {
                let cities = cities.into_iter().map(|(city, fee)| (normalise_key(&city), fee)).collect();
                (normalise_key(&state), cities)
            })
            .collect();
        Self(normalised)
    }

    /// City fee, else the state's default, else [`DEFAULT_DELIVERY_FEE`].
    pub fn fee_for(&self, state: &str, city: &str) -> Kobo {
        self.0
            .get(&normalise_key(state))
            .and_then(|cities| cities.get(&normalise_key(city)).or_else(|| cities.get(Self::STATE_DEFAULT_KEY)))
            .copied()
            .unwrap_or(DEFAULT_DELIVERY_FEE)
    }
}

fn normalise_key(s: &str) -> String {
    s.trim().to_uppercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingSettings {
    pub discount_percentage: f64,
    pub delivery_fees: DeliveryFees,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self { discount_percentage: DEFAULT_DISCOUNT_PERCENTAGE, delivery_fees: DeliveryFees::default() }
    }
}

/// Commission paid per `per_unit` of SKU size, e.g. ₦500 per 1 kg.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CommissionRate {
    pub amount: Kobo,
    pub per_unit: f64,
}

/// Commission rates keyed by upper-cased product category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommissionRates(HashMap<String, CommissionRate>);

impl CommissionRates {
    pub fn new(rates: HashMap<String, CommissionRate>) -> Self {
        Self(rates.into_iter().map(|(k, v)| (normalise_key(&k), v)).collect())
    }

    pub fn rate_for(&self, category: &str) -> Option<CommissionRate> {
        self.0.get(&normalise_key(category)).copied().filter(|r| r.per_unit > 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//--------------------------------------     WalletAudit     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAudit {
    pub owner_id: i64,
    /// The cached `users.wallet_balance`
    pub balance: Kobo,
    /// Signed sum of the owner's wallet ledger entries that have not failed
    pub ledger_sum: Kobo,
}

impl WalletAudit {
    pub fn is_consistent(&self) -> bool {
        self.balance == self.ledger_sum
    }
}
