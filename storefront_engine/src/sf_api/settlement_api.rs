//! # Settlement reconciler
//!
//! Turns payment gateway notifications into internal state changes. Notifications arrive at least once, in any order,
//! and possibly concurrently, so every step is idempotent and the pipeline can resume from any point:
//!
//! 1. The notification's signature is verified against the raw body.
//! 2. Anything but `charge.success` is acknowledged and ignored.
//! 3. The order is looked up by `(order_id, reference)`. A fully settled order is acknowledged without changes.
//! 4. The order is claimed with a conditional `Pending → Paid` update. A caller that loses the race resumes the
//!    remaining steps instead.
//! 5. Each line's stock is committed exactly once. A line that cannot be committed is recorded as a discrepancy.
//! 6. The gateway payment is appended to the ledger under its unique reference.
//! 7. Affiliate commission is credited, guarded by the referral's uniqueness on the order.
//! 8. The order is marked as fully settled, and the caller that does so publishes the `OrderPaidEvent`.
//!
//! If any of steps 5 to 7 fail, the order stays incomplete and the next delivery of the notification picks up from
//! step 5.
use std::fmt::Debug;

use log::*;
use sf_common::Secret;

use crate::{
    db_types::{
        Kobo,
        NewDiscrepancy,
        NewLedgerEntry,
        NewReferral,
        Order,
        OrderLine,
        PaymentStatus,
        SettlementDiscrepancy,
        TransactionType,
    },
    events::{EventProducers, OrderPaidEvent, SettlementDiscrepancyEvent},
    helpers::{commission_reference, verify_webhook_signature},
    sf_api::{
        commission::calculate_commission,
        errors::StorefrontError,
        settlement_objects::{ChargeSuccess, GatewayNotification, SettlementOutcome},
    },
    traits::{StockCommit, StoreDbError, StorefrontDatabase},
};

pub struct SettlementApi<B> {
    db: B,
    producers: EventProducers,
    secret: Secret<String>,
}

impl<B> Debug for SettlementApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B> SettlementApi<B> {
    /// `secret` is the gateway secret key that notifications are signed with.
    pub fn new(db: B, producers: EventProducers, secret: Secret<String>) -> Self {
        Self { db, producers, secret }
    }
}

impl<B> SettlementApi<B>
where B: StorefrontDatabase
{
    /// Verifies, parses and applies a gateway notification.
    ///
    /// `body` must be the raw request body, exactly as received. A missing or invalid signature is rejected with
    /// [`StorefrontError::Authorization`] before the body is even parsed.
    pub async fn process_notification(
        &self,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<SettlementOutcome, StorefrontError> {
        let Some(signature) = signature else {
            warn!("🔐️ Gateway notification has no signature. Rejecting it.");
            return Err(StorefrontError::Authorization("Missing notification signature".into()));
        };
        if self.secret.is_empty() || !verify_webhook_signature(self.secret.reveal(), body, signature) {
            warn!("🔐️ Gateway notification has an invalid signature. Rejecting it.");
            return Err(StorefrontError::Authorization("Invalid notification signature".into()));
        }
        trace!("🔐️ Gateway notification signature is valid");
        match GatewayNotification::from_body(body)? {
            GatewayNotification::Other(event) => {
                debug!("🧾️ Ignoring gateway event {event}");
                Ok(SettlementOutcome::Ignored { event })
            },
            GatewayNotification::ChargeSuccess(charge) => self.process_charge(charge).await,
        }
    }

    async fn process_charge(&self, charge: ChargeSuccess) -> Result<SettlementOutcome, StorefrontError> {
        let ChargeSuccess { reference, order_id, amount } = charge;
        let order = self
            .db
            .fetch_order_by_payment_reference(order_id, &reference)
            .await?
            .ok_or_else(|| {
                warn!("🧾️ No order #{order_id} with payment reference {reference}");
                StorefrontError::OrderNotFound(order_id)
            })?;
        if let Some(amount) = amount {
            if amount != order.total {
                warn!(
                    "🧾️ Gateway reports {amount} captured for order {}, but the order total is {}",
                    order.order_number, order.total
                );
            }
        }
        settle_order(&self.db, &self.producers, order, &reference).await
    }
}

/// Runs settlement steps 4 to 8 for an order whose payment has been confirmed under `reference`.
///
/// Also used directly for orders that the buyer's wallet covered in full.
pub(crate) async fn settle_order<B: StorefrontDatabase>(
    db: &B,
    producers: &EventProducers,
    order: Order,
    reference: &str,
) -> Result<SettlementOutcome, StorefrontError> {
    if order.is_paid() && order.settlement_complete {
        debug!("🧾️ Order {} is already settled", order.order_number);
        return Ok(SettlementOutcome::AlreadySettled { order });
    }
    let order = claim_order(db, order, reference).await?;
    let lines = db.fetch_order_lines(order.id).await?;
    let discrepancies = commit_stock(db, producers, &order, &lines).await?;
    record_payment(db, &order, reference).await?;
    award_commission(db, &order, &lines).await?;
    if !db.complete_settlement(order.id).await? {
        debug!("🧾️ A concurrent settlement of order {} finished first", order.order_number);
        let order = db.fetch_order(order.id).await?.ok_or(StorefrontError::OrderNotFound(order.id))?;
        return Ok(SettlementOutcome::AlreadySettled { order });
    }
    let order = db.fetch_order(order.id).await?.ok_or(StorefrontError::OrderNotFound(order.id))?;
    info!("🧾️ Order {} is settled", order.order_number);
    producers.publish_order_paid(OrderPaidEvent::new(order.clone())).await;
    Ok(SettlementOutcome::Settled { order, discrepancies })
}

/// Step 4. Returns the paid order, whether this call claimed it or an earlier one did.
async fn claim_order<B: StorefrontDatabase>(db: &B, order: Order, reference: &str) -> Result<Order, StorefrontError> {
    if order.payment_status == PaymentStatus::Pending {
        if let Some(claimed) = db.mark_order_paid(order.id, reference).await? {
            return Ok(claimed);
        }
    }
    let current = db.fetch_order(order.id).await?.ok_or(StorefrontError::OrderNotFound(order.id))?;
    if current.is_paid() {
        debug!("🧾️ Order {} was claimed earlier. Resuming its settlement.", current.order_number);
        Ok(current)
    } else {
        error!(
            "🧾️ Order {} cannot be settled. Its payment status is {}.",
            current.order_number, current.payment_status
        );
        Err(StorefrontError::Consistency(format!(
            "Order {} has payment status {} and cannot be settled",
            current.order_number, current.payment_status
        )))
    }
}

/// Step 5. Returns the discrepancies recorded by this call.
async fn commit_stock<B: StorefrontDatabase>(
    db: &B,
    producers: &EventProducers,
    order: &Order,
    lines: &[OrderLine],
) -> Result<Vec<SettlementDiscrepancy>, StorefrontError> {
    let mut recorded = Vec::new();
    for line in lines.iter().filter(|l| !l.stock_committed) {
        let (requested, available) = match db.commit_line_stock(line).await {
            Ok(StockCommit::Committed { remaining }) => {
                trace!("📦️ Line #{} of order {} committed. {remaining} left", line.id, order.order_number);
                continue;
            },
            Ok(StockCommit::AlreadyCommitted) => continue,
            Err(StoreDbError::InsufficientStock { requested, available, .. }) => (requested, available),
            Err(e) => return Err(e.into()),
        };
        let consistency = StorefrontError::Consistency(format!(
            "Order {} is paid, but only {available} of the {requested} units of SKU #{} are in stock",
            order.order_number, line.sku_id
        ));
        error!("📦️ {consistency}");
        let discrepancy = NewDiscrepancy {
            order_id: order.id,
            sku_id: line.sku_id,
            requested,
            available,
            reason: consistency.to_string(),
        };
        if db.record_discrepancy(discrepancy).await? {
            let saved = db.fetch_discrepancies(order.id).await?.into_iter().find(|d| d.sku_id == line.sku_id);
            if let Some(d) = saved {
                let event = SettlementDiscrepancyEvent::new(order.order_number.clone(), d.clone());
                producers.publish_discrepancy(event).await;
                recorded.push(d);
            }
        }
    }
    Ok(recorded)
}

/// Step 6. Orders that the wallet paid for in full were already recorded when the wallet was debited.
async fn record_payment<B: StorefrontDatabase>(db: &B, order: &Order, reference: &str) -> Result<(), StorefrontError> {
    if order.total.is_zero() {
        return Ok(());
    }
    let entry = NewLedgerEntry::wallet(order.user_id, TransactionType::Payment, order.total, reference.to_string())
        .for_order(order.id)
        .with_metadata(serde_json::json!({ "payment_method": "paystack", "order_number": order.order_number }));
    if db.record_gateway_payment(entry).await? {
        debug!("🧾️ Payment {reference} of {} recorded for order {}", order.total, order.order_number);
    }
    Ok(())
}

/// Step 7. Uses the commission rates that were captured when the order was created.
async fn award_commission<B: StorefrontDatabase>(
    db: &B,
    order: &Order,
    lines: &[OrderLine],
) -> Result<(), StorefrontError> {
    let Some(affiliate_id) = order.affiliate_id else {
        return Ok(());
    };
    let sku_ids = lines.iter().map(|l| l.sku_id).collect::<Vec<_>>();
    let skus = db.fetch_skus(&sku_ids).await?;
    let commission = calculate_commission(lines, &skus, &order.commission_rates.0)?;
    if commission <= Kobo::default() {
        debug!("🤝️ Order {} earns no commission for affiliate #{affiliate_id}", order.order_number);
        return Ok(());
    }
    let referral =
        NewReferral { affiliate_id, order_id: order.id, buyer_id: order.user_id, commission_amount: commission };
    let entry = NewLedgerEntry::wallet(
        affiliate_id,
        TransactionType::Commission,
        commission,
        commission_reference(&order.order_number),
    )
    .for_order(order.id)
    .with_metadata(serde_json::json!({ "order_number": order.order_number, "buyer_id": order.user_id }));
    match db.award_commission(referral, entry).await? {
        Some(_) => info!("🤝️ Affiliate #{affiliate_id} earned {commission} on order {}", order.order_number),
        None => debug!("🤝️ Commission for order {} was awarded earlier", order.order_number),
    }
    Ok(())
}
