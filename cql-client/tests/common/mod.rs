#![allow(dead_code)]

use futures::future::ready;
use futures::FutureExt;
use maplit::hashmap;
use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::time::sleep;
use uuid::Uuid;

use cql_client::authenticators::Credentials;
use cql_client::cluster::{keyspace_identity, ClientBuilder, LOCAL_QUERY, PEERS_QUERY};
use cql_client::error::{Error, Result};
use cql_client::frame::{ErrorBody, PreparedBody, Request, Response, ResultBody, Row, ServerEvent};
use cql_client::future::BoxFuture;
use cql_client::transport::{IoReactor, Transport};

pub const PASSWORD: &str = "secret";

/// Behavior of a single simulated node.
#[derive(Clone)]
pub struct FakeNode {
    pub host_id: Uuid,
    pub data_center: String,
    pub peers: Arc<Mutex<Vec<Row>>>,
    pub failure: Option<Error>,
    pub require_credentials: bool,
}

impl FakeNode {
    pub fn new(data_center: &str) -> Self {
        FakeNode {
            host_id: Uuid::new_v4(),
            data_center: data_center.into(),
            peers: Default::default(),
            failure: None,
            require_credentials: false,
        }
    }

    pub fn failing(error: Error) -> Self {
        FakeNode {
            failure: Some(error),
            ..FakeNode::new("dc1")
        }
    }

    pub fn with_credentials(mut self) -> Self {
        self.require_credentials = true;
        self
    }

    /// Makes this node report given node as its peer.
    pub fn add_peer(&self, peer: &str, node: &FakeNode, rpc_address: &str) {
        self.peers
            .lock()
            .unwrap()
            .push(peer_row(peer, &node.data_center, node.host_id, rpc_address));
    }

    fn respond(&self, request: Request) -> Response {
        match request {
            Request::Startup { .. } if self.require_credentials => Response::Authenticate {
                authenticator: "org.apache.cassandra.auth.PasswordAuthenticator".into(),
            },
            Request::Startup { .. } => Response::Ready,
            Request::Credentials(entries) => {
                if entries.get("password").map(String::as_str) == Some(PASSWORD) {
                    Response::Ready
                } else {
                    Response::Error(ErrorBody::new(0x100, "Bad credentials".into()))
                }
            }
            Request::Query { query, .. } if query == LOCAL_QUERY => {
                Response::rows(vec![Row::new(hashmap! {
                    "data_center".to_string() => self.data_center.as_str().into(),
                    "host_id".to_string() => self.host_id.into(),
                })])
            }
            Request::Query { query, .. } if query == PEERS_QUERY => {
                Response::rows(self.peers.lock().unwrap().clone())
            }
            Request::Query { query, .. } if query.starts_with("USE ") => {
                let keyspace = query.trim_start_matches("USE ");
                if keyspace_identity(keyspace) == "missing" {
                    Response::Error(ErrorBody::new(
                        0x2200,
                        format!("Keyspace '{keyspace}' does not exist"),
                    ))
                } else {
                    Response::set_keyspace(keyspace_identity(keyspace))
                }
            }
            Request::Query { .. } => Response::rows(vec![]),
            Request::Register { .. } => Response::Ready,
            Request::Prepare { .. } => Response::Result(ResultBody::Prepared(PreparedBody {
                id: self.host_id.as_bytes().to_vec(),
            })),
            Request::Execute { .. } => Response::void(),
        }
    }
}

pub fn peer_row(peer: &str, data_center: &str, host_id: Uuid, rpc_address: &str) -> Row {
    Row::new(hashmap! {
        "peer".to_string() => peer.parse::<IpAddr>().unwrap().into(),
        "data_center".to_string() => data_center.into(),
        "host_id".to_string() => host_id.into(),
        "rpc_address".to_string() => rpc_address.parse::<IpAddr>().unwrap().into(),
    })
}

/// Link to a simulated node. Records every request it receives.
pub struct FakeTransport {
    pub host: String,
    node: FakeNode,
    requests: Mutex<Vec<Request>>,
    closed: watch::Sender<bool>,
    events: broadcast::Sender<ServerEvent>,
}

impl FakeTransport {
    fn new(host: String, node: FakeNode) -> Self {
        FakeTransport {
            host,
            node,
            requests: Default::default(),
            closed: watch::channel(false).0,
            events: broadcast::channel(16).0,
        }
    }

    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn emit(&self, event: ServerEvent) {
        let _ = self.events.send(event);
    }
}

impl Transport for FakeTransport {
    fn write_request(&self, request: Request) -> BoxFuture<'static, Result<Response>> {
        if self.is_closed() {
            return ready(Err(Error::General(
                "Connection closed while waiting for response!".into(),
            )))
            .boxed();
        }

        self.requests.lock().unwrap().push(request.clone());
        ready(Ok(self.node.respond(request))).boxed()
    }

    fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn closed(&self) -> BoxFuture<'static, ()> {
        wait_until_set(self.closed.subscribe()).boxed()
    }

    fn events(&self) -> broadcast::Receiver<ServerEvent> {
        self.events.subscribe()
    }
}

async fn wait_until_set(mut flag: watch::Receiver<bool>) {
    loop {
        let set = *flag.borrow_and_update();
        if set || flag.changed().await.is_err() {
            return;
        }
    }
}

/// Simulated reactor connecting to [`FakeNode`]s, counting its interactions.
pub struct FakeReactor {
    nodes: Mutex<HashMap<String, FakeNode>>,
    transports: Mutex<Vec<Arc<FakeTransport>>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
    timers: Mutex<Vec<Duration>>,
    connect_gate: watch::Sender<bool>,
}

impl FakeReactor {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeReactor {
            nodes: Default::default(),
            transports: Default::default(),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            timers: Default::default(),
            connect_gate: watch::channel(true).0,
        })
    }

    pub fn add_node(&self, host: &str, node: FakeNode) {
        self.nodes.lock().unwrap().insert(host.into(), node);
    }

    /// Makes connection attempts wait until [`FakeReactor::release_connects`] is called.
    pub fn hold_connects(&self) {
        self.connect_gate.send_replace(false);
    }

    pub fn release_connects(&self) {
        self.connect_gate.send_replace(true);
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    pub fn timers(&self) -> Vec<Duration> {
        self.timers.lock().unwrap().clone()
    }

    pub fn transports(&self) -> Vec<Arc<FakeTransport>> {
        self.transports.lock().unwrap().clone()
    }

    pub fn transports_to(&self, host: &str) -> Vec<Arc<FakeTransport>> {
        self.transports()
            .into_iter()
            .filter(|transport| transport.host == host)
            .collect()
    }

    /// Counts requests matching given predicate, across all transports.
    pub fn count_requests<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Request) -> bool,
    {
        self.transports()
            .iter()
            .flat_map(|transport| transport.requests())
            .filter(|request| predicate(request))
            .count()
    }

    pub fn use_requests(&self) -> usize {
        self.count_requests(|request| {
            matches!(request, Request::Query { query, .. } if query.starts_with("USE "))
        })
    }

    pub fn register_requests(&self) -> usize {
        self.count_requests(|request| matches!(request, Request::Register { .. }))
    }

    /// Delivers an event to every listener.
    pub fn emit(&self, event: ServerEvent) {
        for transport in self.transports() {
            transport.emit(event);
        }
    }
}

impl IoReactor for FakeReactor {
    fn start(&self) -> BoxFuture<'static, Result<()>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        ready(Ok(())).boxed()
    }

    fn stop(&self) -> BoxFuture<'static, Result<()>> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        for transport in self.transports() {
            transport.close();
        }

        ready(Ok(())).boxed()
    }

    fn connect(
        &self,
        host: String,
        _port: u16,
        _timeout: Duration,
    ) -> BoxFuture<'static, Result<Arc<dyn Transport>>> {
        let gate = wait_until_set(self.connect_gate.subscribe());
        let node = self.nodes.lock().unwrap().get(&host).cloned();

        let transport = node.map(|node| match node.failure.clone() {
            Some(error) => Err(error),
            None => {
                let transport = Arc::new(FakeTransport::new(host.clone(), node));
                self.transports.lock().unwrap().push(transport.clone());
                Ok(transport)
            }
        });

        async move {
            gate.await;

            match transport {
                Some(Ok(transport)) => Ok(transport as Arc<dyn Transport>),
                Some(Err(error)) => Err(error),
                None => Err(Error::Io(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    format!("Connection refused: {host}"),
                ))),
            }
        }
        .boxed()
    }

    fn schedule_timer(&self, delay: Duration) -> BoxFuture<'static, ()> {
        self.timers.lock().unwrap().push(delay);
        sleep(delay).boxed()
    }
}

pub fn builder(reactor: &Arc<FakeReactor>) -> ClientBuilder {
    ClientBuilder::new(reactor.clone())
}

pub fn credentials(password: &str) -> Credentials {
    Credentials::new_password("cassandra", password)
}

/// Polls given condition until it holds, failing the test after a while.
pub async fn eventually<F>(mut condition: F)
where
    F: FnMut() -> bool,
{
    for _ in 0..1000 {
        if condition() {
            return;
        }

        sleep(Duration::from_millis(1)).await;
    }

    panic!("condition not met in time");
}

/// Lets spawned background tasks run.
pub async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

pub async fn with_timeout<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("operation timed out")
}
