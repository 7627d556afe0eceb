//! Fan-out of [`AdminEvent`]s to every connected admin client.
//!
//! [`NotificationHub`] is the owned registry of live connections. Whoever accepts new admin connections registers them
//! with the hub, and anyone who needs to announce something takes a [`NotificationHub::publisher`]. Events go onto a
//! bounded queue that has exactly one consumer, the [`AdminDispatcher`], which is started once at server start-up.
//!
//! Publishing never waits: when the queue is full because a broadcast is stuck on a slow client, new events are
//! dropped with a warning. A broadcast holds the registry lock for the whole iteration. Each write gets its own deadline, and a connection
//! whose write fails or times out is closed and removed before the lock is released. Failures are never reported
//! back to the publisher.
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use log::*;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

use crate::events::{AdminEvent, EventProducer};

pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Error)]
#[error("The connection is closed: {0}")]
pub struct ConnectionClosed(pub String);

/// A live, writable admin client connection.
#[allow(async_fn_in_trait)]
pub trait AdminConnection {
    async fn send_text(&mut self, text: &str) -> Result<(), ConnectionClosed>;

    async fn close(self);
}

type Registry<C> = Arc<Mutex<HashMap<u64, C>>>;

pub struct NotificationHub<C> {
    connections: Registry<C>,
    next_id: Arc<AtomicU64>,
    publisher: EventProducer<AdminEvent>,
}

impl<C> Clone for NotificationHub<C> {
    fn clone(&self) -> Self {
        Self {
            connections: Arc::clone(&self.connections),
            next_id: Arc::clone(&self.next_id),
            publisher: self.publisher.clone(),
        }
    }
}

impl<C: AdminConnection> NotificationHub<C> {
    /// Creates a hub along with the dispatcher that drains its queue. `buffer_size` bounds the number of events
    /// waiting to be broadcast.
    pub fn new(buffer_size: usize) -> (Self, AdminDispatcher<C>) {
        Self::with_write_timeout(buffer_size, DEFAULT_WRITE_TIMEOUT)
    }

    pub fn with_write_timeout(buffer_size: usize, write_timeout: Duration) -> (Self, AdminDispatcher<C>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let connections = Arc::new(Mutex::new(HashMap::new()));
        let hub = Self {
            connections: Arc::clone(&connections),
            next_id: Arc::new(AtomicU64::new(1)),
            publisher: EventProducer::new(sender),
        };
        let dispatcher = AdminDispatcher { connections, receiver, write_timeout };
        (hub, dispatcher)
    }

    /// Adds a connection to the live set and returns the id it was registered under.
    pub async fn register(&self, connection: C) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut connections = self.connections.lock().await;
        connections.insert(id, connection);
        debug!("📢️ Admin connection #{id} registered. {} live connections", connections.len());
        id
    }

    /// Removes a connection, e.g. because the client hung up. Returns it if it was still registered.
    pub async fn deregister(&self, id: u64) -> Option<C> {
        let removed = self.connections.lock().await.remove(&id);
        if removed.is_some() {
            debug!("📢️ Admin connection #{id} deregistered");
        }
        removed
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn is_registered(&self, id: u64) -> bool {
        self.connections.lock().await.contains_key(&id)
    }

    pub fn publisher(&self) -> EventProducer<AdminEvent> {
        self.publisher.clone()
    }
}

/// The single consumer of the admin event queue.
pub struct AdminDispatcher<C> {
    connections: Registry<C>,
    receiver: mpsc::Receiver<AdminEvent>,
    write_timeout: Duration,
}

impl<C: AdminConnection> AdminDispatcher<C> {
    /// Broadcasts events until every publisher, including the hub's own, has been dropped.
    pub async fn run(mut self) {
        info!("📢️ Admin notification dispatcher started");
        while let Some(event) = self.receiver.recv().await {
            let delivered = self.broadcast(&event).await;
            trace!("📢️ {event:?} delivered to {delivered} connections");
        }
        info!("📢️ Admin notification dispatcher has shut down");
    }

    /// Writes one event to every registered connection and returns how many writes succeeded.
    pub async fn broadcast(&self, event: &AdminEvent) -> usize {
        let text = match serde_json::to_string(&event.to_outbound()) {
            Ok(t) => t,
            Err(e) => {
                error!("📢️ Could not serialize {event:?}. {e}");
                return 0;
            },
        };
        let mut connections = self.connections.lock().await;
        let mut dead = Vec::new();
        for (id, connection) in connections.iter_mut() {
            match tokio::time::timeout(self.write_timeout, connection.send_text(&text)).await {
                Ok(Ok(())) => {},
                Ok(Err(e)) => {
                    warn!("📢️ Write to admin connection #{id} failed. {e}");
                    dead.push(*id);
                },
                Err(_) => {
                    warn!("📢️ Write to admin connection #{id} timed out after {:?}", self.write_timeout);
                    dead.push(*id);
                },
            }
        }
        let delivered = connections.len() - dead.len();
        for id in dead {
            if let Some(connection) = connections.remove(&id) {
                connection.close().await;
                debug!("📢️ Admin connection #{id} closed and removed");
            }
        }
        delivered
    }
}
