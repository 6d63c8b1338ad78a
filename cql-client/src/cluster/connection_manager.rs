use arc_swap::ArcSwap;
use rand::prelude::*;
use rand::rng;
use std::sync::{Arc, Weak};
use tracing::*;

use crate::cluster::Connection;
use crate::error::{Error, Result};

type Connections = ArcSwap<Vec<Arc<Connection>>>;

/// Registry of ready connections. Connections are removed automatically once their transport
/// reports them closed.
#[derive(Default, Debug)]
pub struct ConnectionManager {
    connections: Arc<Connections>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Default::default()
    }

    /// Atomically adds all given connections. Must be called within a tokio runtime.
    pub fn add_connections(&self, connections: Vec<Arc<Connection>>) {
        if connections.is_empty() {
            return;
        }

        self.connections.rcu(|current| {
            let mut updated = Vec::with_capacity(current.len() + connections.len());
            updated.extend(current.iter().cloned());
            updated.extend(connections.iter().cloned());
            updated
        });

        for connection in connections {
            Self::watch_closed(Arc::downgrade(&self.connections), connection);
        }
    }

    /// Returns a random open connection.
    pub fn random_connection(&self) -> Result<Arc<Connection>> {
        let connections = self.connections.load();
        let open: Vec<_> = connections
            .iter()
            .filter(|connection| !connection.is_closed())
            .collect();

        open.choose(&mut rng())
            .map(|connection| Arc::clone(connection))
            .ok_or(Error::NotConnected)
    }

    /// Returns connections matching given predicate, in pool order.
    pub fn select<P>(&self, mut predicate: P) -> Vec<Arc<Connection>>
    where
        P: FnMut(&Connection) -> bool,
    {
        self.connections
            .load()
            .iter()
            .filter(|connection| predicate(connection))
            .cloned()
            .collect()
    }

    /// Returns a point-in-time copy of all connections.
    #[inline]
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.load().as_ref().clone()
    }

    #[inline]
    pub fn is_connected(&self) -> bool {
        !self.connections.load().is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.connections.load().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.is_connected()
    }

    fn watch_closed(connections: Weak<Connections>, connection: Arc<Connection>) {
        let closed = connection.closed();

        tokio::spawn(async move {
            closed.await;

            if let Some(connections) = connections.upgrade() {
                connections.rcu(|current| {
                    current
                        .iter()
                        .filter(|existing| !Arc::ptr_eq(existing, &connection))
                        .cloned()
                        .collect::<Vec<_>>()
                });

                debug!(
                    host = connection.host(),
                    port = connection.port(),
                    "Connection closed and removed from pool."
                );
            }
        });
    }
}
