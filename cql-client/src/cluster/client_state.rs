use crate::future::SharedFuture;

/// What `connect()` should do, decided atomically with the state transition.
pub enum ConnectAction {
    /// Connecting or connected already - return the existing future.
    Existing(SharedFuture<()>),
    /// Closing - bootstrap after given close completes, regardless of its outcome.
    AfterClose(SharedFuture<()>),
    Bootstrap,
}

/// What `close()` should do, decided atomically with the state transition.
pub enum CloseAction {
    /// Closing already - return the existing future.
    Existing(SharedFuture<()>),
    /// Connecting - stop after given connect completes, regardless of its outcome.
    AfterConnect(SharedFuture<()>),
    Stop,
}

/// Client lifecycle flags. Disconnected -> Connecting -> Connected -> Closing -> Disconnected.
///
/// All transitions are plain synchronous methods, meant to be called while holding the client's
/// lock. None of them waits for anything.
#[derive(Default)]
pub struct ClientState {
    connecting: bool,
    connected: bool,
    closing: bool,
    connected_future: Option<SharedFuture<()>>,
    closed_future: Option<SharedFuture<()>>,
}

impl ClientState {
    #[inline]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    #[inline]
    pub fn is_closing(&self) -> bool {
        self.closing
    }

    /// Requests can be sent while connecting, or when connected with a non-empty pool, but never
    /// while closing.
    pub fn can_execute(&self, pool_connected: bool) -> bool {
        !self.closing && (self.connecting || (self.connected && pool_connected))
    }

    /// Whether the topology of the cluster should still be followed.
    #[inline]
    pub fn maintains_topology(&self) -> bool {
        self.connected && !self.closing
    }

    pub fn begin_connect(&mut self, pool_connected: bool) -> ConnectAction {
        if let Some(connected_future) = &self.connected_future {
            if self.connecting || (self.connected && pool_connected && !self.closing) {
                return ConnectAction::Existing(connected_future.clone());
            }
        }

        self.connecting = true;

        match &self.closed_future {
            Some(closed_future) if self.closing => ConnectAction::AfterClose(closed_future.clone()),
            _ => ConnectAction::Bootstrap,
        }
    }

    pub fn connect_started(&mut self, connected_future: SharedFuture<()>) {
        self.connected_future = Some(connected_future);
    }

    pub fn connect_completed(&mut self, success: bool) {
        self.connecting = false;
        self.connected = success;
    }

    pub fn begin_close(&mut self) -> CloseAction {
        if let Some(closed_future) = &self.closed_future {
            if self.closing {
                return CloseAction::Existing(closed_future.clone());
            }
        }

        self.closing = true;

        match &self.connected_future {
            Some(connected_future) if self.connecting => {
                CloseAction::AfterConnect(connected_future.clone())
            }
            _ => CloseAction::Stop,
        }
    }

    pub fn close_started(&mut self, closed_future: SharedFuture<()>) {
        self.closed_future = Some(closed_future);
    }

    pub fn close_completed(&mut self) {
        self.closing = false;
        self.connected = false;
    }
}
