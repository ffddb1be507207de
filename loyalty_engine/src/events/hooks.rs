use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, OrderAccruedEvent, OrderInvalidatedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub order_accrued_producer: Vec<EventProducer<OrderAccruedEvent>>,
    pub order_invalidated_producer: Vec<EventProducer<OrderInvalidatedEvent>>,
}

pub struct EventHandlers {
    pub on_order_accrued: Option<EventHandler<OrderAccruedEvent>>,
    pub on_order_invalidated: Option<EventHandler<OrderInvalidatedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_order_accrued = hooks.on_order_accrued.map(|f| EventHandler::new(buffer_size, f));
        let on_order_invalidated = hooks.on_order_invalidated.map(|f| EventHandler::new(buffer_size, f));
        Self { on_order_accrued, on_order_invalidated }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_order_accrued {
            result.order_accrued_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_order_invalidated {
            result.order_invalidated_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_order_accrued {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_order_invalidated {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_order_accrued: Option<Handler<OrderAccruedEvent>>,
    pub on_order_invalidated: Option<Handler<OrderInvalidatedEvent>>,
}

impl EventHooks {
    pub fn on_order_accrued<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderAccruedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_accrued = Some(Arc::new(f));
        self
    }

    pub fn on_order_invalidated<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(OrderInvalidatedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_order_invalidated = Some(Arc::new(f));
        self
    }
}
