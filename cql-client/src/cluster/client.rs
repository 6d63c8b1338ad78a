use derivative::Derivative;
use futures::{FutureExt, TryFutureExt};
use itertools::{Either, Itertools};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::*;

use crate::cluster::client_state::{ClientState, CloseAction, ConnectAction};
use crate::cluster::connector::Connector;
use crate::cluster::event_listener::register_event_listener;
use crate::cluster::keyspace::{quote, validate_keyspace_name};
use crate::cluster::{
    ClientConfig, Connection, ConnectionManager, ConnectionOutcome, PreparedStatement,
    QueryResult, RequestRunner,
};
use crate::consistency::Consistency;
use crate::error::{Error, Result};
use crate::frame::Request;
use crate::future::{all, shared, BoxFuture, SharedFuture};
use crate::transport::IoReactor;

/// Cluster client. Maintains a pool of connections to cluster nodes, which follows cluster
/// topology once connected.
///
/// Cloning is cheap and all clones share the same state.
#[derive(Clone, Debug)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    pub(crate) fn new(config: ClientConfig, reactor: Arc<dyn IoReactor>) -> Self {
        let request_runner = RequestRunner;
        let connector = Connector::from_config(&config, reactor.clone(), request_runner);

        Client {
            inner: Arc::new(ClientInner {
                config,
                reactor,
                connector,
                connection_manager: Default::default(),
                request_runner,
                state: Default::default(),
                discovering_peers: Default::default(),
            }),
        }
    }

    #[inline]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Connects to the cluster. Connecting is idempotent: while connecting, or when connected,
    /// all calls observe the same outcome. Connecting while the client is closing waits for the
    /// close to complete first.
    ///
    /// The connection process runs in the background, so it completes even if the returned future
    /// is dropped.
    pub fn connect(&self) -> BoxFuture<'static, Result<Client>> {
        let client = self.clone();
        self.inner.connect().map_ok(move |_| client).boxed()
    }

    /// Closes the client by stopping the reactor, which closes all connections. Closing is
    /// idempotent. Closing while the client is connecting waits for the connection process to
    /// complete first. Resolves to the client, which can be connected again.
    pub fn close(&self) -> BoxFuture<'static, Result<Client>> {
        let client = self.clone();
        self.inner.close().map_ok(move |_| client).boxed()
    }

    /// Checks if the client has completed connecting and has not been closed since.
    pub fn is_connected(&self) -> bool {
        self.inner.lock_state().is_connected()
    }

    /// Returns a point-in-time copy of pooled connections.
    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.inner.connection_manager.snapshot()
    }

    /// Returns the keyspace of an arbitrary pooled connection.
    pub fn keyspace(&self) -> Option<String> {
        self.inner.keyspace()
    }

    /// Switches all pooled connections to given keyspace. Connections already using it are left
    /// alone.
    pub async fn use_keyspace(&self, keyspace: &str) -> Result<()> {
        self.inner.ensure_can_execute()?;
        validate_keyspace_name(keyspace)?;
        self.inner.switch_keyspace(keyspace).await
    }

    /// Executes a query on an arbitrary connection, with `QUORUM` consistency unless specified
    /// otherwise. Successful `USE` statements resolve to `None` and get propagated to all other
    /// pooled connections in the background.
    pub async fn execute<Q: Into<String>>(
        &self,
        query: Q,
        consistency: Option<Consistency>,
    ) -> Result<Option<QueryResult>> {
        self.inner.ensure_can_execute()?;

        let request = Request::new_req_query(query, consistency.unwrap_or_default());
        self.inner.execute_request(request, None).await
    }

    /// Prepares a statement for later execution.
    pub async fn prepare<Q: Into<String>>(&self, query: Q) -> Result<PreparedStatement> {
        self.inner.ensure_can_execute()?;

        PreparedStatement::prepare(
            query.into(),
            self.inner.connection_manager.clone(),
            self.inner.request_runner,
        )
        .await
    }
}

#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct ClientInner {
    pub(crate) config: ClientConfig,
    #[derivative(Debug = "ignore")]
    pub(crate) reactor: Arc<dyn IoReactor>,
    pub(crate) connector: Connector,
    pub(crate) connection_manager: Arc<ConnectionManager>,
    pub(crate) request_runner: RequestRunner,
    #[derivative(Debug = "ignore")]
    state: Mutex<ClientState>,
    /// Set while a peer discovery loop triggered by node events is running.
    pub(crate) discovering_peers: Arc<AtomicBool>,
}

impl ClientInner {
    fn lock_state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Checks if the cluster topology should still be followed.
    pub(crate) fn maintains_topology(&self) -> bool {
        self.lock_state().maintains_topology()
    }

    fn ensure_can_execute(&self) -> Result<()> {
        let pool_connected = self.connection_manager.is_connected();
        if self.lock_state().can_execute(pool_connected) {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    fn keyspace(&self) -> Option<String> {
        self.connection_manager
            .random_connection()
            .ok()
            .and_then(|connection| connection.keyspace())
            .map(|keyspace| keyspace.as_ref().clone())
    }

    /// Current keyspace, quoted for use in `USE` statements.
    pub(crate) fn current_keyspace(&self) -> Option<String> {
        self.keyspace().map(|keyspace| quote(&keyspace))
    }

    fn connect(self: &Arc<Self>) -> SharedFuture<()> {
        let pool_connected = self.connection_manager.is_connected();
        let mut state = self.lock_state();

        let pending_close = match state.begin_connect(pool_connected) {
            ConnectAction::Existing(connected) => return connected,
            ConnectAction::AfterClose(closed) => Some(closed),
            ConnectAction::Bootstrap => None,
        };

        let inner = Arc::clone(self);
        let connected = shared(async move {
            if let Some(closed) = pending_close {
                debug!("Waiting for pending close before connecting.");
                if let Err(error) = closed.await {
                    debug!(%error, "Pending close failed. Connecting anyway.");
                }
            }

            let result = inner.bootstrap().await;
            if inner.connect_completed(&result) {
                let _ = inner.close().await;
            }

            result
        });

        state.connect_started(connected.clone());
        drop(state);

        tokio::spawn(connected.clone());
        connected
    }

    async fn bootstrap(self: &Arc<Self>) -> Result<()> {
        debug!(hosts = ?self.config.hosts, "Connecting to cluster.");

        self.reactor.start().await?;

        let outcomes = self
            .connector
            .connect_to_hosts(self.config.hosts.clone(), self.config.keyspace.clone(), true)
            .await;

        let (connections, errors): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition_map(|outcome| match outcome {
                ConnectionOutcome::Ready(connection) => Either::Left(connection),
                ConnectionOutcome::Failed { error, .. } => Either::Right(error),
            });

        if connections.is_empty() {
            return Err(errors
                .into_iter()
                .next()
                .map(Error::reclassify_authentication)
                .unwrap_or(Error::NotConnected));
        }

        self.connection_manager.add_connections(connections);

        let connection = self.connection_manager.random_connection()?;
        register_event_listener(Arc::clone(self), connection).await
    }

    /// Updates state after a connection attempt. Returns `true` if the client needs closing.
    fn connect_completed(&self, result: &Result<()>) -> bool {
        let mut state = self.lock_state();
        state.connect_completed(result.is_ok());

        match result {
            Ok(()) => {
                info!(
                    connections = self.connection_manager.len(),
                    "Client connected."
                );
                false
            }
            Err(error) => {
                error!(%error, "Client failed to connect.");
                !state.is_closing()
            }
        }
    }

    fn close(self: &Arc<Self>) -> SharedFuture<()> {
        let mut state = self.lock_state();

        let pending_connect = match state.begin_close() {
            CloseAction::Existing(closed) => return closed,
            CloseAction::AfterConnect(connected) => Some(connected),
            CloseAction::Stop => None,
        };

        let inner = Arc::clone(self);
        let closed = shared(async move {
            if let Some(connected) = pending_connect {
                debug!("Waiting for pending connect before closing.");
                let _ = connected.await;
            }

            let result = inner.reactor.stop().await;
            inner.close_completed(&result);
            result
        });

        state.close_started(closed.clone());
        drop(state);

        tokio::spawn(closed.clone());
        closed
    }

    fn close_completed(&self, result: &Result<()>) {
        self.lock_state().close_completed();

        match result {
            Ok(()) => info!("Client closed."),
            Err(error) => error!(%error, "Error closing client."),
        }
    }

    /// Sends given request to given connection, or an arbitrary one if none is given.
    /// A successful keyspace change is propagated to all other connections in the background and
    /// resolves to `None`.
    pub(crate) async fn execute_request(
        self: &Arc<Self>,
        request: Request,
        connection: Option<Arc<Connection>>,
    ) -> Result<Option<QueryResult>> {
        let connection = match connection {
            Some(connection) => connection,
            None => self.connection_manager.random_connection()?,
        };

        match self.request_runner.execute(&connection, request).await? {
            QueryResult::KeyspaceChanged(keyspace) => {
                let inner = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(error) = inner.switch_keyspace(&quote(&keyspace)).await {
                        warn!(%error, %keyspace, "Failed to propagate keyspace change.");
                    }
                });

                Ok(None)
            }
            result => Ok(Some(result)),
        }
    }

    async fn switch_keyspace(&self, keyspace: &str) -> Result<()> {
        let connections = self
            .connection_manager
            .select(|connection| !connection.uses_keyspace(keyspace));

        if connections.is_empty() {
            return Ok(());
        }

        debug!(
            %keyspace,
            connections = connections.len(),
            "Switching connections keyspace."
        );

        all(connections.iter().map(|connection| {
            self.request_runner
                .execute(connection, Request::new_req_use(keyspace))
        }))
        .await
        .map(|_| ())
    }
}
