mod broadcaster;
mod channel;
mod event_types;
mod hooks;

pub use broadcaster::{AdminConnection, AdminDispatcher, ConnectionClosed, NotificationHub, DEFAULT_WRITE_TIMEOUT};
pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
