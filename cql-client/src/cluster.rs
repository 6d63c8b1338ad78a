//! Cluster connectivity: client lifecycle, connection pool, node discovery and request execution.

pub use crate::cluster::client::Client;
pub use crate::cluster::config::{
    ClientBuilder, ClientConfig, DEFAULT_CONNECTION_TIMEOUT, DEFAULT_HOST, DEFAULT_PORT,
};
pub use crate::cluster::connection::{Connection, ConnectionOutcome};
pub use crate::cluster::connection_manager::ConnectionManager;
pub use crate::cluster::connector::{Connector, LOCAL_QUERY};
pub use crate::cluster::keyspace::{is_valid_keyspace_name, keyspace_identity};
pub use crate::cluster::peer_discovery::{discover_peers, PEERS_QUERY};
pub use crate::cluster::prepared_statement::PreparedStatement;
pub use crate::cluster::request_runner::{QueryResult, RequestRunner};

mod client;
mod client_state;
mod config;
mod connection;
mod connection_manager;
mod connector;
mod event_listener;
mod keyspace;
mod peer_discovery;
mod prepared_statement;
mod request_runner;
