use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CommissionRates, NewOrder, NewOrderLine, Order, OrderStatus, ShippingInfo, UserAccount},
    events::EventProducers,
    helpers::{gateway_reference, wallet_reference},
    sf_api::{
        errors::StorefrontError,
        order_objects::{CheckoutRequest, OrderCreated, OrderDetails, PaymentLink, PaymentRetry},
        pricing::{CheckoutApi, PriceBreakdown},
        settlement_api::settle_order,
        settlement_objects::SettlementOutcome,
    },
    traits::{PaymentGateway, PaymentRequest, StorefrontDatabase},
};

/// `OrderFlowApi` drives an order from checkout to the point where the payment gateway takes over.
///
/// Orders are always priced in-process with the same function that serves checkout previews. Orders that the buyer's
/// wallet covers in full never reach the gateway and are settled immediately.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: StorefrontDatabase,
    G: PaymentGateway,
{
    /// Prices, persists and (where needed) opens a payment for a new order.
    ///
    /// Pricing, stock and balance errors are returned before anything is written. If the payment gateway fails, the
    /// order has already been saved: the error says whether it is worth retrying with [`Self::retry_payment`].
    pub async fn create_order(&self, buyer_id: i64, request: CheckoutRequest) -> Result<OrderCreated, StorefrontError> {
        let buyer = self.db.fetch_user(buyer_id).await?.ok_or(StorefrontError::UserNotFound(buyer_id))?;
        validate_shipping_info(&request.shipping_info)?;
        let quote = CheckoutApi::new(self.db.clone()).quote_for(&buyer, &request).await?;
        let commission_rates = match quote.affiliate_id {
            Some(_) => self.db.fetch_commission_rates().await?,
            None => CommissionRates::default(),
        };
        let new_order = new_order(&buyer, request.shipping_info, quote, commission_rates);
        let (order, lines) = self.db.insert_order(new_order).await?;
        info!(
            "🔄️ Order {} created for user #{buyer_id} with {} lines. Total due: {}",
            order.order_number,
            lines.len(),
            order.total
        );
        if order.total.is_zero() {
            return self.settle_wallet_order(order).await;
        }
        let link = self.request_payment(&order, &buyer.email).await?;
        Ok(OrderCreated {
            order_id: order.id,
            order_number: order.order_number,
            total: order.total,
            payment_url: Some(link.payment_url),
        })
    }

    /// Opens a fresh gateway transaction for an order that has not been paid yet.
    ///
    /// Orders that the wallet covers in full never go to the gateway. If the settlement of such an order was
    /// interrupted, it is resumed under the order's wallet reference instead.
    pub async fn retry_payment(&self, buyer_id: i64, order_id: i64) -> Result<PaymentRetry, StorefrontError> {
        let order = self.owned_order(buyer_id, order_id).await?;
        if order.total.is_zero() {
            if order.settlement_complete {
                return Err(StorefrontError::Validation(format!(
                    "Order {} was paid from the wallet and is already settled",
                    order.order_number
                )));
            }
            info!("🔄️ Resuming the settlement of wallet order {}", order.order_number);
            return self.settle_wallet_order(order).await.map(PaymentRetry::Settled);
        }
        if order.is_paid() {
            return Err(StorefrontError::Validation(format!("Order {} has already been paid", order.order_number)));
        }
        let buyer = self.db.fetch_user(buyer_id).await?.ok_or(StorefrontError::UserNotFound(buyer_id))?;
        self.request_payment(&order, &buyer.email).await.map(PaymentRetry::Link)
    }

    /// The buyer's orders, newest first, optionally only those with the given order status.
    pub async fn orders_for_user(
        &self,
        buyer_id: i64,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, StorefrontError> {
        let orders = self.db.fetch_orders_for_user(buyer_id, status).await?;
        Ok(orders)
    }

    /// The order with its lines, shipping snapshot and any settlement discrepancies. Orders belonging to someone else
    /// are reported as not found.
    pub async fn order_for_user(&self, buyer_id: i64, order_id: i64) -> Result<OrderDetails, StorefrontError> {
        let order = self.owned_order(buyer_id, order_id).await?;
        let lines = self.db.fetch_order_lines(order.id).await?;
        let shipping_info = self.db.fetch_shipping_info(order.shipping_id).await?;
        let discrepancies = self.db.fetch_discrepancies(order.id).await?;
        Ok(OrderDetails { order, lines, shipping_info, discrepancies })
    }

    async fn owned_order(&self, buyer_id: i64, order_id: i64) -> Result<Order, StorefrontError> {
        match self.db.fetch_order(order_id).await? {
            Some(order) if order.user_id == buyer_id => Ok(order),
            Some(_) => {
                warn!("🔄️ User #{buyer_id} requested order #{order_id}, which belongs to someone else");
                Err(StorefrontError::OrderNotFound(order_id))
            },
            None => Err(StorefrontError::OrderNotFound(order_id)),
        }
    }

    async fn request_payment(&self, order: &Order, email: &str) -> Result<PaymentLink, StorefrontError> {
        let request = PaymentRequest {
            order_id: order.id,
            order_number: order.order_number.clone(),
            email: email.to_string(),
            amount: order.total,
            reference: gateway_reference(&order.order_number),
        };
        let session = self.gateway.initialize_payment(request).await.map_err(|e| {
            warn!("🔄️ Could not open a payment for order {}. {e}", order.order_number);
            StorefrontError::from(e)
        })?;
        let updated = self.db.attach_payment_reference(order.id, &session.reference).await?;
        if updated.is_none() {
            warn!("🔄️ Order {} was paid while a new payment was being opened for it", order.order_number);
            return Err(StorefrontError::Validation(format!("Order {} has already been paid", order.order_number)));
        }
        debug!("🔄️ Payment {} opened for order {}", session.reference, order.order_number);
        Ok(PaymentLink {
            order_id: order.id,
            order_number: order.order_number.clone(),
            reference: session.reference,
            payment_url: session.authorization_url,
        })
    }

    async fn settle_wallet_order(&self, order: Order) -> Result<OrderCreated, StorefrontError> {
        let reference = wallet_reference(&order.order_number);
        debug!("🔄️ Order {} is covered by the wallet. Settling it now.", order.order_number);
        let (order_id, order_number, total) = (order.id, order.order_number.clone(), order.total);
        match settle_order(&self.db, &self.producers, order, &reference).await? {
            SettlementOutcome::Settled { discrepancies, .. } if !discrepancies.is_empty() => {
                warn!("🔄️ Order {order_number} settled with {} stock discrepancies", discrepancies.len());
            },
            _ => {},
        }
        Ok(OrderCreated { order_id, order_number, total, payment_url: None })
    }
}

fn validate_shipping_info(info: &ShippingInfo) -> Result<(), StorefrontError> {
    let required = [
        ("full_name", &info.full_name),
        ("phone", &info.phone),
        ("state", &info.state),
        ("city", &info.city),
        ("address", &info.address),
    ];
    let missing = required.iter().filter(|(_, v)| v.trim().is_empty()).map(|(k, _)| *k).collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(StorefrontError::Validation(format!("Shipping info is missing: {}", missing.join(", "))))
    }
}

fn new_order(
    buyer: &UserAccount,
    shipping: ShippingInfo,
    quote: PriceBreakdown,
    commission_rates: CommissionRates,
) -> NewOrder {
    let lines = quote
        .items
        .iter()
        .map(|l| NewOrderLine {
            sku_id: l.sku_id,
            quantity: l.quantity,
            unit_price: l.unit_price,
            line_total: l.line_total,
        })
        .collect();
    NewOrder {
        user_id: buyer.id,
        shipping,
        subtotal: quote.subtotal,
        discount: quote.discount,
        delivery_fee: quote.delivery_fee,
        wallet_deduction: quote.wallet_deduction,
        total: quote.total,
        affiliate_code: quote.affiliate_code,
        affiliate_id: quote.affiliate_id,
        lines,
        commission_rates,
    }
}
