use derivative::Derivative;
use futures::future::join_all;
use futures::TryFutureExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::*;
use uuid::Uuid;

use crate::authenticators::Credentials;
use crate::cluster::peer_discovery::discover_new_peers;
use crate::cluster::{ClientConfig, Connection, ConnectionOutcome, QueryResult, RequestRunner};
use crate::consistency::Consistency;
use crate::error::{Error, Result};
use crate::frame::{Request, Response};
use crate::future::recover;
use crate::transport::IoReactor;

pub const LOCAL_QUERY: &str = "SELECT data_center, host_id FROM system.local";

/// Establishes ready to use connections: raw connect, startup handshake, node identification and
/// keyspace selection.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Connector {
    #[derivative(Debug = "ignore")]
    reactor: Arc<dyn IoReactor>,
    port: u16,
    connection_timeout: Duration,
    #[derivative(Debug = "ignore")]
    credentials: Option<Credentials>,
    request_runner: RequestRunner,
}

impl Connector {
    pub fn new(
        reactor: Arc<dyn IoReactor>,
        port: u16,
        connection_timeout: Duration,
        credentials: Option<Credentials>,
        request_runner: RequestRunner,
    ) -> Self {
        Connector {
            reactor,
            port,
            connection_timeout,
            credentials,
            request_runner,
        }
    }

    pub fn from_config(
        config: &ClientConfig,
        reactor: Arc<dyn IoReactor>,
        request_runner: RequestRunner,
    ) -> Self {
        Self::new(
            reactor,
            config.port,
            config.connection_timeout,
            config.credentials.clone(),
            request_runner,
        )
    }

    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[inline]
    pub fn request_runner(&self) -> &RequestRunner {
        &self.request_runner
    }

    /// Connects to a single host and brings the connection to a ready state, optionally switching
    /// it to given keyspace.
    pub async fn connect_to_host(
        &self,
        host: String,
        keyspace: Option<String>,
    ) -> Result<Arc<Connection>> {
        let transport = self
            .reactor
            .connect(host.clone(), self.port, self.connection_timeout)
            .await?;

        let connection = Arc::new(Connection::new(host, self.port, transport));
        self.startup(&connection).await?;
        self.identify(&connection).await?;

        if let Some(keyspace) = keyspace {
            self.request_runner
                .execute(&connection, Request::new_req_use(&keyspace))
                .await?;
        }

        debug!(
            host = connection.host(),
            port = self.port,
            host_id = ?connection.host_id(),
            "Connection ready."
        );

        Ok(connection)
    }

    /// Connects to all given hosts in parallel. Failed attempts do not affect others and are
    /// reported as [`ConnectionOutcome::Failed`]. Outcomes are returned in input order.
    pub async fn connect_all(
        &self,
        hosts: Vec<String>,
        keyspace: Option<String>,
    ) -> Vec<ConnectionOutcome> {
        join_all(hosts.into_iter().map(|host| {
            let port = self.port;
            recover(
                self.connect_to_host(host.clone(), keyspace.clone())
                    .map_ok(ConnectionOutcome::Ready),
                move |error| {
                    warn!(%error, %host, port, "Failed to connect to node.");
                    ConnectionOutcome::Failed { error, host, port }
                },
            )
        }))
        .await
    }

    /// Connects to all given hosts in parallel. With peer discovery enabled, ready connections are
    /// used as seeds for discovering their peers, which get appended to the outcomes.
    pub async fn connect_to_hosts(
        &self,
        hosts: Vec<String>,
        keyspace: Option<String>,
        peer_discovery: bool,
    ) -> Vec<ConnectionOutcome> {
        let mut outcomes = self.connect_all(hosts, keyspace.clone()).await;
        if !peer_discovery {
            return outcomes;
        }

        let seeds: Vec<_> = outcomes
            .iter()
            .filter_map(ConnectionOutcome::ready)
            .cloned()
            .collect();

        if seeds.is_empty() {
            return outcomes;
        }

        match discover_new_peers(self, &seeds, keyspace).await {
            Ok(peers) => outcomes.extend(peers.into_iter().map(ConnectionOutcome::Ready)),
            Err(error) => warn!(%error, "Peer discovery failed. Continuing with seeds only."),
        }

        outcomes
    }

    async fn startup(&self, connection: &Connection) -> Result<()> {
        match connection.write_request(Request::new_req_startup()).await? {
            Response::Ready => Ok(()),
            Response::Authenticate { authenticator } => {
                let credentials = self.credentials.clone().ok_or_else(|| {
                    Error::Authentication(format!(
                        "Node {} requested authentication with {}, but no credentials were provided!",
                        connection.host(),
                        authenticator
                    ))
                })?;

                match connection
                    .write_request(Request::new_req_credentials(credentials.into()))
                    .await?
                {
                    Response::Ready => Ok(()),
                    Response::Error(body) => Err(Error::Server(body)),
                    response => Err(Error::UnexpectedResponse(format!(
                        "Unexpected auth response: {response:?}"
                    ))),
                }
            }
            Response::Error(body) => Err(Error::Server(body)),
            response => Err(Error::UnexpectedResponse(format!(
                "Unexpected startup response: {response:?}"
            ))),
        }
    }

    async fn identify(&self, connection: &Connection) -> Result<()> {
        let result = self
            .request_runner
            .execute(
                connection,
                Request::new_req_query(LOCAL_QUERY, Consistency::One),
            )
            .await?;

        let rows = match result {
            QueryResult::Rows(rows) => rows,
            result => {
                return Err(Error::UnexpectedResponse(format!(
                    "Node {} failed to return info about itself: {result:?}",
                    connection.host()
                )))
            }
        };

        // a node without local info is still usable, it just won't take part in discovery
        if let Some(local) = rows.first() {
            let host_id: Option<Uuid> = local.get_by_name("host_id")?;
            let data_center: Option<String> = local.get_by_name("data_center")?;
            connection.set_identity(host_id, data_center);
        }

        Ok(())
    }
}
