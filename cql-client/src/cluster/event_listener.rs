use futures::FutureExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::broadcast::Receiver;
use tracing::*;

use crate::cluster::client::ClientInner;
use crate::cluster::peer_discovery::discover_new_peers;
use crate::cluster::Connection;
use crate::error::{Error, Result};
use crate::frame::{Request, ServerEvent, SimpleServerEvent};
use crate::future::BoxFuture;
use crate::retry::RetrySchedule;

/// Registers for topology and status change events on given connection. Once the connection
/// closes, the listener moves to another pooled connection. Nodes reported as up trigger peer
/// discovery.
pub(crate) fn register_event_listener(
    client: Arc<ClientInner>,
    connection: Arc<Connection>,
) -> BoxFuture<'static, Result<()>> {
    async move {
        let events = connection.events();
        let closed = connection.closed();

        client
            .execute_request(
                Request::new_req_register(vec![
                    SimpleServerEvent::TopologyChange,
                    SimpleServerEvent::StatusChange,
                ]),
                Some(connection.clone()),
            )
            .await?;

        debug!(
            host = connection.host(),
            port = connection.port(),
            "Registered event listener."
        );

        tokio::spawn(listen(
            Arc::downgrade(&client),
            connection.host().to_string(),
            events,
            closed,
        ));

        Ok(())
    }
    .boxed()
}

async fn listen(
    client: Weak<ClientInner>,
    host: String,
    mut events: Receiver<ServerEvent>,
    mut closed: BoxFuture<'static, ()>,
) {
    loop {
        tokio::select! {
            _ = &mut closed => break,
            event = events.recv() => match event {
                Ok(event) if event.is_node_up() => {
                    debug!(%host, ?event, "Node up.");
                    start_peer_discovery(&client);
                }
                Ok(event) => trace!(%host, ?event, "Ignoring event."),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%host, skipped, "Event listener lagged behind.");
                }
                Err(RecvError::Closed) => {
                    (&mut closed).await;
                    break;
                }
            }
        }
    }

    debug!(%host, "Event connection closed.");
    reregister(client).await;
}

async fn reregister(client: Weak<ClientInner>) {
    let Some(client) = client.upgrade() else {
        return;
    };

    if !client.maintains_topology() {
        return;
    }

    let result = match client.connection_manager.random_connection() {
        Ok(connection) => register_event_listener(client.clone(), connection).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(()) => {}
        // pool emptied out - the client is shutting down
        Err(Error::NotConnected) => debug!("No connection left for event listener."),
        Err(error) => error!(%error, "Failed to re-register event listener."),
    }
}

/// Starts a peer discovery loop, unless one is already running. Nodes coming up while a loop runs
/// are picked up by that loop.
fn start_peer_discovery(client: &Weak<ClientInner>) {
    let Some(inner) = client.upgrade() else {
        return;
    };

    match DiscoveryGuard::acquire(&inner.discovering_peers) {
        Some(guard) => {
            tokio::spawn(integrate_new_peers(client.clone(), guard));
        }
        None => trace!("Peer discovery already running."),
    }
}

/// Marks a running discovery loop. Released when the loop ends.
struct DiscoveryGuard(Arc<AtomicBool>);

impl DiscoveryGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| DiscoveryGuard(flag.clone()))
    }
}

impl Drop for DiscoveryGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs peer discovery until at least one new peer gets integrated, the client stops following
/// the topology or the retry schedule gives up.
async fn integrate_new_peers(client: Weak<ClientInner>, _guard: DiscoveryGuard) {
    let mut schedule: Option<Box<dyn RetrySchedule + Send + Sync>> = None;

    loop {
        let timer = {
            let Some(client) = client.upgrade() else {
                return;
            };

            if !client.maintains_topology() {
                return;
            }

            let seeds = client.connection_manager.snapshot();
            match discover_new_peers(&client.connector, &seeds, client.current_keyspace()).await {
                Ok(peers) if !peers.is_empty() => {
                    if client.maintains_topology() {
                        info!(count = peers.len(), "Adding discovered peers.");
                        client.connection_manager.add_connections(peers);
                    }

                    return;
                }
                Ok(_) => debug!("No new peers discovered."),
                Err(error) => warn!(%error, "Peer discovery failed."),
            }

            let delay = schedule
                .get_or_insert_with(|| client.config.discovery_retry_policy.new_schedule())
                .next_delay();

            match delay {
                Some(delay) => {
                    debug!(?delay, "Scheduling peer discovery retry.");
                    client.reactor.schedule_timer(delay)
                }
                None => {
                    debug!("Giving up on peer discovery.");
                    return;
                }
            }
        };

        timer.await;
    }
}
