//! Stateless pub-sub plumbing for engine events.
//!
//! An [`EventHandler`] owns the receiving end of a bounded channel and runs a user-supplied async callback for every
//! event that arrives. Any number of [`EventProducer`]s can be handed out to publish into it. Handlers see only the
//! event itself and never the engine's internal state.
//!
//! The handler loop ends once every producer has been dropped, after waiting for in-flight callbacks to finish.
use std::{future::Future, pin::Pin, sync::Arc};

use log::*;
use tokio::{sync::mpsc, task::JoinSet};

pub type Handler<E> = Arc<dyn Fn(E) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct EventHandler<E: Send + Sync + 'static> {
    receiver: mpsc::Receiver<E>,
    sender: mpsc::Sender<E>,
    handler: Handler<E>,
}

impl<E: Send + Sync + 'static> EventHandler<E> {
    pub fn new(buffer_size: usize, handler: Handler<E>) -> Self {
        let (sender, receiver) = mpsc::channel(buffer_size);
        Self { receiver, sender, handler }
    }

    pub fn subscribe(&self) -> EventProducer<E> {
        EventProducer::new(self.sender.clone())
    }

    pub async fn start_handler(mut self) {
        debug!("📬️ Event handler started");
        // Only producers keep the channel open from here on.
        drop(self.sender);
        let mut jobs = JoinSet::new();
        loop {
            tokio::select! {
                event = self.receiver.recv() => match event {
                    Some(event) => {
                        let handler = Arc::clone(&self.handler);
                        jobs.spawn(async move { (handler)(event).await });
                    },
                    None => break,
                },
                Some(done) = jobs.join_next(), if !jobs.is_empty() => {
                    if let Err(e) = done {
                        warn!("📬️ An event callback panicked or was cancelled. {e}");
                    }
                },
            }
        }
        debug!("📬️ All producers are gone. Waiting for {} pending callbacks", jobs.len());
        while let Some(done) = jobs.join_next().await {
            if let Err(e) = done {
                warn!("📬️ An event callback panicked or was cancelled. {e}");
            }
        }
        debug!("📬️ Event handler has shut down");
    }
}

/// The publishing half of an event channel. Cheap to clone.
#[derive(Clone)]
pub struct EventProducer<E: Send + Sync> {
    sender: mpsc::Sender<E>,
}

impl<E: Send + Sync> EventProducer<E> {
    pub fn new(sender: mpsc::Sender<E>) -> Self {
        Self { sender }
    }

    /// Queues the event. Waits for room when the channel is full. If the consumer has gone away, the event is dropped
    /// and an error is logged.
    pub async fn publish_event(&self, event: E) {
        if self.sender.send(event).await.is_err() {
            error!("📬️ Event dropped: the consumer for this channel has shut down");
        }
    }

    /// Queues the event without waiting. When the channel is full or closed the event is dropped, a warning is
    /// logged, and `false` is returned.
    pub fn try_publish_event(&self, event: E) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("📬️ Event dropped: the channel is full");
                false
            },
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("📬️ Event dropped: the consumer for this channel has shut down");
                false
            },
        }
    }
}
