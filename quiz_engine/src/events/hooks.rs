use std::{future::Future, pin::Pin, sync::Arc};

use crate::events::{EventHandler, EventProducer, Handler, MatchRecordedEvent, PaymentApprovedEvent};

#[derive(Default, Clone)]
pub struct EventProducers {
    pub payment_approved_producer: Vec<EventProducer<PaymentApprovedEvent>>,
    pub match_recorded_producer: Vec<EventProducer<MatchRecordedEvent>>,
}

pub struct EventHandlers {
    pub on_payment_approved: Option<EventHandler<PaymentApprovedEvent>>,
    pub on_match_recorded: Option<EventHandler<MatchRecordedEvent>>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize, hooks: EventHooks) -> Self {
        let on_payment_approved = hooks.on_payment_approved.map(|f| EventHandler::new(buffer_size, f));
        let on_match_recorded = hooks.on_match_recorded.map(|f| EventHandler::new(buffer_size, f));
        Self { on_payment_approved, on_match_recorded }
    }

    pub fn producers(&self) -> EventProducers {
        let mut result = EventProducers::default();
        if let Some(handler) = &self.on_payment_approved {
            result.payment_approved_producer.push(handler.subscribe());
        }
        if let Some(handler) = &self.on_match_recorded {
            result.match_recorded_producer.push(handler.subscribe());
        }
        result
    }

    pub async fn start_handlers(self) {
        if let Some(handler) = self.on_payment_approved {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
        if let Some(handler) = self.on_match_recorded {
            tokio::spawn(async move {
                handler.start_handler().await;
            });
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_payment_approved: Option<Handler<PaymentApprovedEvent>>,
    pub on_match_recorded: Option<Handler<MatchRecordedEvent>>,
}

impl EventHooks {
    pub fn on_payment_approved<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(PaymentApprovedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_payment_approved = Some(Arc::new(f));
        self
    }

    pub fn on_match_recorded<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchRecordedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_match_recorded = Some(Arc::new(f));
        self
    }
}
