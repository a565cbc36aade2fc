//! Clients for the external services the quiz server talks to.
//!
//! * [`PaymentClient`] is the PIX payment provider's REST API. It creates payments and is the source of truth for
//!   their status.
//! * [`DeckGeneratorClient`] calls the question generation service.
//!
//! [`create_event_handlers`] wires up the server's subscribers to engine events.
mod deck_generator;
mod event_hooks;
mod payment_client;

pub use deck_generator::DeckGeneratorClient;
pub use event_hooks::{create_event_handlers, EVENT_BUFFER_SIZE};
pub use payment_client::PaymentClient;
