use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderPaidEvent, SettlementDiscrepancyEvent};

/// The publishing ends of every registered hook. Cloned into each API that emits events.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_paid_producer: Vec<EventProducer<OrderPaidEvent>>,
    pub discrepancy_producer: Vec<EventProducer<SettlementDiscrepancyEvent>>,
}

impl EventProducers {
    pub async fn publish_order_paid(&self, event: OrderPaidEvent) {
        for producer in &self.order_paid_producer {
            producer.publish_event(event.clone()).await;
        }
    }

    pub async fn publish_discrepancy(&self, event: SettlementDiscrepancyEvent) {
        for producer in &self.discrepancy_producer {
            producer.publish_event(event.clone()).await;
        }
    }
}

pub struct EventHandlers {
    pub on_order_paid: Option<EventHandler<OrderPaidEvent>>,
    pub on_settlement_discrepancy: Option<EventHandler<SettlementDiscrepancyEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_paid = hooks.on_order_paid.map(|f| EventHandler::new(buffer_size, f));
        let on_settlement_discrepancy = hooks.on_settlement_discrepancy.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_paid, on_settlement_discrepancy }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_paid {
            result.order_paid_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_settlement_discrepancy {
            result.discrepancy_producer.push(handler.subscribe());
        }
        result
    }

    /// Spawns a task per registered hook. Each task ends once every producer for it has been dropped.
    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_paid {
            tokio::spawn(handler.start_handler());
        }
        if let Some(handler) = self.on_settlement_discrepancy {
            tokio::spawn(handler.start_handler());
        }
    }
}

type BoxedHook<E> = dyn (Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync;

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_paid: Option<Handler<OrderPaidEvent>>,
    pub on_settlement_discrepancy: Option<Handler<SettlementDiscrepancyEvent>>,
}

impl EventHooks {
    pub fn on_order_paid<F>(&mut self, f: F) -> &mut Self
    where F: Fn(OrderPaidEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        let hook: Arc<BoxedHook<OrderPaidEvent>> = Arc::new(f);
        self.on_order_paid = Some(hook);
        self
    }

    pub fn on_settlement_discrepancy<F>(&mut self, f: F) -> &mut Self
    where F: Fn(SettlementDiscrepancyEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync + 'static {
        let hook: Arc<BoxedHook<SettlementDiscrepancyEvent>> = Arc::new(f);
        self.on_settlement_discrepancy = Some(hook);
        self
    }
}
