//! **cql-client** is an asynchronous Cassandra cluster client, which maintains a topology-aware
//! pool of connections and mediates all requests through it.
//!
//! ## Getting started
//!
//! The client does not deal with sockets and protocol frames by itself - it drives an
//! [`IoReactor`](crate::transport::IoReactor), which establishes
//! [`Transport`](crate::transport::Transport) links to nodes.
//!
//! ```no_run
//! use cql_client::cluster::ClientBuilder;
//! use cql_client::consistency::Consistency;
//! use cql_client::transport::IoReactor;
//! use std::sync::Arc;
//!
//! async fn run(reactor: Arc<dyn IoReactor>) -> cql_client::Result<()> {
//!     let client = ClientBuilder::new(reactor)
//!         .with_host("127.0.0.1")
//!         .with_keyspace("test_ks")
//!         .build()?
//!         .connect()
//!         .await?;
//!
//!     let rows = client
//!         .execute("SELECT * FROM users", Some(Consistency::One))
//!         .await?
//!         .and_then(|result| result.into_rows());
//!
//!     client.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Topology
//!
//! Seed hosts only bootstrap the pool. Once connected to them, the client discovers their peers
//! in the same data centers and connects to those as well. Nodes which come up later are
//! discovered in response to server events.

pub mod authenticators;
pub mod cluster;
pub mod consistency;
pub mod error;
pub mod frame;
pub mod future;
pub mod retry;
pub mod transport;

pub type Error = error::Error;
pub type Result<T> = error::Result<T>;
