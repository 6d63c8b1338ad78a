use arc_swap::ArcSwapOption;
use derivative::Derivative;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::cluster::keyspace::keyspace_identity;
use crate::error::{Error, Result};
use crate::frame::{Request, Response, ServerEvent};
use crate::future::BoxFuture;
use crate::transport::Transport;

/// A single live link to a node, along with what is known about the node.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Connection {
    host: String,
    port: u16,
    #[derivative(Debug = "ignore")]
    transport: Arc<dyn Transport>,
    host_id: ArcSwapOption<Uuid>,
    data_center: ArcSwapOption<String>,
    keyspace: ArcSwapOption<String>,
}

impl Connection {
    pub fn new(host: String, port: u16, transport: Arc<dyn Transport>) -> Self {
        Connection {
            host,
            port,
            transport,
            host_id: ArcSwapOption::empty(),
            data_center: ArcSwapOption::empty(),
            keyspace: ArcSwapOption::empty(),
        }
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Host id reported by the node itself. Empty until the connection is identified, or when
    /// the node did not report any (e.g. on first boot).
    #[inline]
    pub fn host_id(&self) -> Option<Uuid> {
        self.host_id.load().as_deref().copied()
    }

    #[inline]
    pub fn data_center(&self) -> Option<Arc<String>> {
        self.data_center.load_full()
    }

    /// Keyspace this connection's session is currently scoped to.
    #[inline]
    pub fn keyspace(&self) -> Option<Arc<String>> {
        self.keyspace.load_full()
    }

    /// Checks if this connection's session uses given keyspace. Quoted names are compared
    /// case-sensitively, bare ones case-insensitively.
    pub fn uses_keyspace(&self, keyspace: &str) -> bool {
        self.keyspace
            .load()
            .as_deref()
            .map(|current| *current == keyspace_identity(keyspace))
            .unwrap_or(false)
    }

    pub(crate) fn set_identity(&self, host_id: Option<Uuid>, data_center: Option<String>) {
        self.host_id.store(host_id.map(Arc::new));
        self.data_center.store(data_center.map(Arc::new));
    }

    pub(crate) fn set_keyspace(&self, keyspace: String) {
        self.keyspace.store(Some(Arc::new(keyspace)));
    }

    #[inline]
    pub fn write_request(&self, request: Request) -> BoxFuture<'static, Result<Response>> {
        self.transport.write_request(request)
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.transport.is_closed()
    }

    #[inline]
    pub fn closed(&self) -> BoxFuture<'static, ()> {
        self.transport.closed()
    }

    #[inline]
    pub fn events(&self) -> broadcast::Receiver<ServerEvent> {
        self.transport.events()
    }
}

/// Result of a single connection attempt. Failed attempts are kept along with the host they were
/// meant for, so a batch of attempts can be inspected as a whole.
#[derive(Debug)]
pub enum ConnectionOutcome {
    Ready(Arc<Connection>),
    Failed {
        error: Error,
        host: String,
        port: u16,
    },
}

impl ConnectionOutcome {
    #[inline]
    pub fn ready(&self) -> Option<&Arc<Connection>> {
        match self {
            ConnectionOutcome::Ready(connection) => Some(connection),
            ConnectionOutcome::Failed { .. } => None,
        }
    }

    #[inline]
    pub fn into_ready(self) -> Option<Arc<Connection>> {
        match self {
            ConnectionOutcome::Ready(connection) => Some(connection),
            ConnectionOutcome::Failed { .. } => None,
        }
    }
}
