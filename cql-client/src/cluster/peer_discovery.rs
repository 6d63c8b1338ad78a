use itertools::Itertools;
use rand::prelude::*;
use rand::rng;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::*;
use uuid::Uuid;

use crate::cluster::connector::Connector;
use crate::cluster::Connection;
use crate::consistency::Consistency;
use crate::error::{Error, Result};
use crate::frame::{Request, Row};

pub const PEERS_QUERY: &str = "SELECT peer, data_center, host_id, rpc_address FROM system.peers";

/// Queries a random seed for its view of the cluster and connects to peers which are in one of the
/// seeds' data centers, but are not represented among the seeds yet. Returns seeds followed by
/// newly connected peers.
///
/// Discovery is one level deep: newly connected peers are not asked for their peers.
pub async fn discover_peers(
    connector: &Connector,
    seeds: Vec<Arc<Connection>>,
    keyspace: Option<String>,
) -> Result<Vec<Arc<Connection>>> {
    let mut peers = discover_new_peers(connector, &seeds, keyspace).await?;

    let mut connections = seeds;
    connections.append(&mut peers);
    Ok(connections)
}

/// Same as [`discover_peers`], but returns only the newly connected peers.
pub async fn discover_new_peers(
    connector: &Connector,
    seeds: &[Arc<Connection>],
    keyspace: Option<String>,
) -> Result<Vec<Arc<Connection>>> {
    let seed = match seeds.choose(&mut rng()) {
        Some(seed) => Arc::clone(seed),
        None => return Ok(vec![]),
    };

    let rows = connector
        .request_runner()
        .execute(
            &seed,
            Request::new_req_query(PEERS_QUERY, Consistency::One),
        )
        .await?
        .into_rows()
        .ok_or_else(|| {
            Error::UnexpectedResponse(format!(
                "Node {} did not return rows for peers query!",
                seed.host()
            ))
        })?;

    let data_centers: HashSet<String> = seeds
        .iter()
        .filter_map(|connection| connection.data_center())
        .map(|data_center| data_center.as_ref().clone())
        .collect();
    let host_ids: HashSet<Uuid> = seeds
        .iter()
        .filter_map(|connection| connection.host_id())
        .collect();

    let hosts = rows
        .iter()
        .filter_map(|row| match peer_address(row, &data_centers, &host_ids) {
            Ok(address) => address,
            Err(error) => {
                // this could only happen if system tables are corrupted, but handle gracefully
                warn!(%error, seed = seed.host(), "Skipping malformed peer entry.");
                None
            }
        })
        .unique()
        .map(|address| address.to_string())
        .collect_vec();

    if hosts.is_empty() {
        debug!(seed = seed.host(), "No new peers found.");
        return Ok(vec![]);
    }

    debug!(seed = seed.host(), ?hosts, "Connecting to discovered peers.");

    Ok(connector
        .connect_all(hosts, keyspace)
        .await
        .into_iter()
        .filter_map(|outcome| outcome.into_ready())
        .collect())
}

fn peer_address(
    row: &Row,
    data_centers: &HashSet<String>,
    host_ids: &HashSet<Uuid>,
) -> Result<Option<IpAddr>> {
    let data_center: Option<String> = row.get_by_name("data_center")?;
    if !data_center.is_some_and(|data_center| data_centers.contains(&data_center)) {
        return Ok(None);
    }

    let host_id: Option<Uuid> = row.get_by_name("host_id")?;
    if host_id.is_some_and(|host_id| host_ids.contains(&host_id)) {
        return Ok(None);
    }

    match row.get_by_name::<IpAddr>("rpc_address")? {
        Some(rpc_address) if !rpc_address.is_unspecified() => Ok(Some(rpc_address)),
        _ => row.get_by_name("peer"),
    }
}
