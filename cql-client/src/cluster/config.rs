use derivative::Derivative;
use std::sync::Arc;
use std::time::Duration;

use crate::authenticators::Credentials;
use crate::cluster::keyspace::validate_keyspace_name;
use crate::cluster::Client;
use crate::error::Result;
use crate::retry::{ConstantDiscoveryRetryPolicy, DiscoveryRetryPolicy};
use crate::transport::IoReactor;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 9042;
pub const DEFAULT_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct ClientConfig {
    /// Seed hosts used for bootstrapping. Other cluster members are discovered from them.
    pub hosts: Vec<String>,
    /// Port used for seeds and discovered peers alike.
    pub port: u16,
    pub connection_timeout: Duration,
    #[derivative(Debug = "ignore")]
    pub credentials: Option<Credentials>,
    /// Keyspace every new connection switches to.
    pub keyspace: Option<String>,
    #[derivative(Debug = "ignore")]
    pub discovery_retry_policy: Arc<dyn DiscoveryRetryPolicy + Send + Sync>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            hosts: vec![DEFAULT_HOST.into()],
            port: DEFAULT_PORT,
            connection_timeout: DEFAULT_CONNECTION_TIMEOUT,
            credentials: None,
            keyspace: None,
            discovery_retry_policy: Arc::new(ConstantDiscoveryRetryPolicy::default()),
        }
    }
}

/// Builder for [`Client`]. The reactor is the only required part, everything else has sensible
/// defaults.
pub struct ClientBuilder {
    reactor: Arc<dyn IoReactor>,
    hosts: Vec<String>,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new(reactor: Arc<dyn IoReactor>) -> Self {
        ClientBuilder {
            reactor,
            hosts: vec![],
            config: Default::default(),
        }
    }

    /// Adds a seed host.
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.hosts.push(host.into());
        self
    }

    /// Adds seed hosts.
    pub fn with_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hosts.extend(hosts.into_iter().map(Into::into));
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn with_connection_timeout(mut self, connection_timeout: Duration) -> Self {
        self.config.connection_timeout = connection_timeout;
        self
    }

    /// Sets credentials sent when a node requests authentication.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.config.credentials = Some(credentials);
        self
    }

    /// Sets initial keyspace.
    pub fn with_keyspace<S: Into<String>>(mut self, keyspace: S) -> Self {
        self.config.keyspace = Some(keyspace.into());
        self
    }

    /// Sets the policy deciding how long to wait between discovery attempts after a node reports
    /// itself as up.
    pub fn with_discovery_retry_policy(
        mut self,
        discovery_retry_policy: Arc<dyn DiscoveryRetryPolicy + Send + Sync>,
    ) -> Self {
        self.config.discovery_retry_policy = discovery_retry_policy;
        self
    }

    /// Finalizes building process. The client is returned disconnected.
    pub fn build(mut self) -> Result<Client> {
        if let Some(keyspace) = &self.config.keyspace {
            validate_keyspace_name(keyspace)?;
        }

        if !self.hosts.is_empty() {
            self.config.hosts = self.hosts;
        }

        Ok(Client::new(self.config, self.reactor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::transport::MockIoReactor;

    #[test]
    fn should_use_defaults() {
        let config = ClientConfig::default();

        assert_eq!(config.hosts, vec![DEFAULT_HOST.to_string()]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.connection_timeout, DEFAULT_CONNECTION_TIMEOUT);
        assert!(config.keyspace.is_none());
    }

    #[test]
    fn should_override_defaults() {
        let client = ClientBuilder::new(Arc::new(MockIoReactor::new()))
            .with_host("10.0.0.1")
            .with_hosts(["10.0.0.2", "10.0.0.3"])
            .with_port(19042)
            .with_keyspace("test_ks")
            .build()
            .unwrap();

        let config = client.config();
        assert_eq!(config.hosts, vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
        assert_eq!(config.port, 19042);
        assert_eq!(config.keyspace.as_deref(), Some("test_ks"));
        assert!(!client.is_connected());
    }

    #[test]
    fn should_reject_invalid_keyspace() {
        let result = ClientBuilder::new(Arc::new(MockIoReactor::new()))
            .with_keyspace("bad-name")
            .build();

        assert!(matches!(result, Err(Error::InvalidKeyspaceName(name)) if name == "bad-name"));
    }
}
