//! # Pricing engine
//!
//! [`price_cart`] is the single, deterministic pricing function of the storefront. The checkout preview and order
//! creation both call it in-process, so a buyer is always charged exactly what they were quoted for the same inputs.
//!
//! It is a pure function of the cart, the current catalog rows, the buyer, the resolved affiliate and the store
//! settings. [`CheckoutApi`] gathers those inputs from a backend.
//!
//! ## Rules
//! * Duplicate SKUs in a cart are merged before any checks are made.
//! * Unit prices and stock always come from the catalog. Client-supplied prices are never trusted.
//! * The affiliate discount is a percentage of the subtotal, rounded to whole naira. It only applies for an approved
//!   affiliate who is not the buyer.
//! * The delivery fee is looked up by city, then by the state default, then falls back to the global default.
//! * The wallet deduction is `min(balance, subtotal - discount)`, and only applies when requested.
use std::fmt::Debug;

use log::*;
use serde::{Deserialize, Serialize};
use sf_common::helpers::normalize_code;

use crate::{
    db_types::{Kobo, PricingSettings, Sku, UserAccount},
    sf_api::{
        errors::StorefrontError,
        order_objects::{CartItem, CheckoutRequest},
    },
    traits::{AccountManagement, CatalogManagement},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub sku_id: i64,
    pub product_name: String,
    pub size_label: String,
    pub quantity: i64,
    pub unit_price: Kobo,
    pub line_total: Kobo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Kobo,
    pub discount: Kobo,
    pub wallet_deduction: Kobo,
    pub delivery_fee: Kobo,
    pub total: Kobo,
    pub items: Vec<PricedLine>,
    pub affiliate_id: Option<i64>,
    /// The normalised code of the affiliate that earned the discount
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affiliate_code: Option<String>,
}

/// Everything [`price_cart`] needs. All of it must be read fresh from the backend for every quote.
#[derive(Debug, Clone, Copy)]
pub struct PricingInputs<'a> {
    pub cart: &'a [CartItem],
    /// Catalog rows for (at least) every SKU in the cart
    pub skus: &'a [Sku],
    pub state: &'a str,
    pub city: &'a str,
    pub buyer: &'a UserAccount,
    /// The user that the submitted affiliate code resolved to, if any
    pub affiliate: Option<&'a UserAccount>,
    pub use_wallet_balance: bool,
    pub settings: &'a PricingSettings,
}

/// Sums the quantities of repeated SKUs. Lines keep the order in which each SKU first appears.
pub fn merge_cart(cart: &[CartItem]) -> Result<Vec<CartItem>, StorefrontError> {
    if cart.is_empty() {
        return Err(StorefrontError::EmptyCart);
    }
    let mut merged: Vec<CartItem> = Vec::with_capacity(cart.len());
    for item in cart {
        if item.quantity <= 0 {
            return Err(StorefrontError::InvalidAmount(format!(
                "Quantity for SKU {} must be positive, but was {}",
                item.sku_id, item.quantity
            )));
        }
        match merged.iter_mut().find(|m| m.sku_id == item.sku_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.checked_add(item.quantity).ok_or_else(|| {
                    StorefrontError::InvalidAmount(format!("Total quantity for SKU {} is too large", item.sku_id))
                })?;
            },
            None => merged.push(*item),
        }
    }
    if let Some(item) = merged.iter().find(|m| m.quantity <= 0) {
        return Err(StorefrontError::InvalidAmount(format!(
            "Quantity for SKU {} must be positive, but was {}",
            item.sku_id, item.quantity
        )));
    }
    Ok(merged)
}

pub fn price_cart(inputs: PricingInputs<'_>) -> Result<PriceBreakdown, StorefrontError> {
    let cart = merge_cart(inputs.cart)?;
    let mut items = Vec::with_capacity(cart.len());
    for item in &cart {
        let sku = inputs
            .skus
            .iter()
            .find(|s| s.id == item.sku_id && s.is_active)
            .ok_or(StorefrontError::UnknownSku(item.sku_id))?;
        if item.quantity > sku.stock {
            return Err(StorefrontError::InsufficientStock {
                sku_id: sku.id,
                requested: item.quantity,
                available: sku.stock,
            });
        }
        items.push(PricedLine {
            sku_id: sku.id,
            product_name: sku.product_name.clone(),
            size_label: sku.size_label.clone(),
            quantity: item.quantity,
            unit_price: sku.price,
            line_total: sku.price.checked_mul(item.quantity).ok_or_else(|| too_large(sku.id))?,
        });
    }
    let subtotal = items
        .iter()
        .try_fold(Kobo::default(), |acc, l| acc.checked_add(l.line_total).ok_or_else(|| too_large(l.sku_id)))?;

    let affiliate = inputs.affiliate.filter(|a| {
        if !a.is_approved_affiliate() {
            debug!("🔄️ Affiliate #{} is not approved. No discount applied.", a.id);
            return false;
        }
        if a.id == inputs.buyer.id {
            debug!("🔄️ User #{} tried to use their own affiliate code. No discount applied.", a.id);
            return false;
        }
        true
    });
    let discount = match affiliate {
        Some(_) => subtotal
            .percentage_in_whole_naira(inputs.settings.discount_percentage)
            .map_err(|e| StorefrontError::InvalidAmount(e.to_string()))?
            .min(subtotal),
        None => Kobo::default(),
    };

    let delivery_fee = inputs.settings.delivery_fees.fee_for(inputs.state, inputs.city);

    let wallet_deduction = if inputs.use_wallet_balance {
        inputs.buyer.wallet_balance.min(subtotal - discount).max(Kobo::default())
    } else {
        Kobo::default()
    };

    let total = (subtotal - discount - wallet_deduction)
        .checked_add(delivery_fee)
        .ok_or_else(|| StorefrontError::InvalidAmount("Order total is too large".into()))?;
    trace!(
        "🔄️ Priced cart for user #{}: subtotal {subtotal}, discount {discount}, wallet {wallet_deduction}, delivery \
         {delivery_fee}, total {total}",
        inputs.buyer.id
    );
    Ok(PriceBreakdown {
        subtotal,
        discount,
        wallet_deduction,
        delivery_fee,
        total,
        items,
        affiliate_id: affiliate.map(|a| a.id),
        affiliate_code: affiliate.and_then(|a| a.affiliate_code.clone()),
    })
}

fn too_large(sku_id: i64) -> StorefrontError {
    StorefrontError::InvalidAmount(format!("Order amount for SKU {sku_id} is too large"))
}

/// Quotes checkout requests against live catalog, account and settings data.
pub struct CheckoutApi<B> {
    db: B,
}

impl<B> Debug for CheckoutApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B> CheckoutApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CheckoutApi<B>
where B: CatalogManagement + AccountManagement
{
    /// Prices the request for the given buyer. Nothing is written.
    pub async fn quote(&self, buyer_id: i64, request: &CheckoutRequest) -> Result<PriceBreakdown, StorefrontError> {
        let buyer = self.db.fetch_user(buyer_id).await?.ok_or(StorefrontError::UserNotFound(buyer_id))?;
        self.quote_for(&buyer, request).await
    }

    pub async fn quote_for(
        &self,
        buyer: &UserAccount,
        request: &CheckoutRequest,
    ) -> Result<PriceBreakdown, StorefrontError> {
        let cart = merge_cart(&request.items)?;
        let sku_ids = cart.iter().map(|i| i.sku_id).collect::<Vec<_>>();
        let skus = self.db.fetch_skus(&sku_ids).await?;
        let affiliate = match request.affiliate_code.as_deref().and_then(normalize_code) {
            Some(code) => {
                let affiliate = self.db.fetch_affiliate_by_code(&code).await?;
                if affiliate.is_none() {
                    debug!("🔄️ Affiliate code {code} is unknown. No discount applied.");
                }
                affiliate
            },
            None => None,
        };
        let settings = self.db.fetch_pricing_settings().await?;
        let inputs = PricingInputs {
            cart: &cart,
            skus: &skus,
            state: &request.shipping_info.state,
            city: &request.shipping_info.city,
            buyer,
            affiliate: affiliate.as_ref(),
            use_wallet_balance: request.use_wallet_balance,
            settings: &settings,
        };
        price_cart(inputs)
    }
}
