//! This module contains declarations of the collaborators the client drives, but does not
//! implement itself:
//!
//! * [`IoReactor`] - the I/O primitive which owns sockets and timers. It establishes raw
//! connections and schedules timers.
//!
//! * [`Transport`] - a single established link to a node, able to encode requests into protocol
//! frames, send them and decode the responses. It also delivers server events pushed on the link
//! and reports when the link is closed.
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

#[cfg(test)]
use mockall::*;

use crate::error::Result;
use crate::frame::{Request, Response, ServerEvent};
use crate::future::BoxFuture;

/// General transport trait for a single node connection.
pub trait Transport: Send + Sync {
    /// Sends a request and waits for the matching response.
    fn write_request(&self, request: Request) -> BoxFuture<'static, Result<Response>>;

    /// Checks if the connection is closed (by the peer, on error or by the reactor stopping).
    fn is_closed(&self) -> bool;

    /// Resolves once the connection is closed. Resolves immediately for closed connections.
    fn closed(&self) -> BoxFuture<'static, ()>;

    /// Subscribes to server events pushed over this connection.
    fn events(&self) -> broadcast::Receiver<ServerEvent>;
}

#[cfg(test)]
mock! {
    pub Transport {
    }

    impl Transport for Transport {
        fn write_request(&self, request: Request) -> BoxFuture<'static, Result<Response>>;

        fn is_closed(&self) -> bool;

        fn closed(&self) -> BoxFuture<'static, ()>;

        fn events(&self) -> broadcast::Receiver<ServerEvent>;
    }
}

/// The I/O primitive performing socket connects and timer scheduling.
pub trait IoReactor: Send + Sync {
    /// Starts the reactor. Called before any connection is established.
    fn start(&self) -> BoxFuture<'static, Result<()>>;

    /// Stops the reactor, closing all connections it has established.
    fn stop(&self) -> BoxFuture<'static, Result<()>>;

    /// Establishes a raw connection to given host.
    fn connect(
        &self,
        host: String,
        port: u16,
        timeout: Duration,
    ) -> BoxFuture<'static, Result<Arc<dyn Transport>>>;

    /// Resolves after given delay.
    fn schedule_timer(&self, delay: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(delay).boxed()
    }
}

#[cfg(test)]
mock! {
    pub IoReactor {
    }

    impl IoReactor for IoReactor {
        fn start(&self) -> BoxFuture<'static, Result<()>>;

        fn stop(&self) -> BoxFuture<'static, Result<()>>;

        fn connect(
            &self,
            host: String,
            port: u16,
            timeout: Duration,
        ) -> BoxFuture<'static, Result<Arc<dyn Transport>>>;

        fn schedule_timer(&self, delay: Duration) -> BoxFuture<'static, ()>;
    }
}
