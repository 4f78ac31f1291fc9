use serde_json::Value;
use std::time::Duration;

/// Credentials for tunneling driver traffic over SSH
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshCredentials {
    /// Login user on the remote host
    pub user: String,
    /// Login password
    pub password: String,
}

/// Connection parameters for a remote automation server.
///
/// Kept by the session handle for the whole process lifetime so a dropped
/// session can be re-established with the exact same parameters.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Server hostname or IP
    pub host: String,

    /// Server port
    pub port: u16,

    /// Desired session capabilities, passed through verbatim
    pub capabilities: serde_json::Map<String, Value>,

    /// Optional SSH tunnel credentials
    pub ssh: Option<SshCredentials>,

    /// How long a reconnect may wait for the new session id
    pub session_wait_timeout: Duration,

    /// Pause between reconnect attempts while waiting
    pub session_poll_interval: Duration,
}

impl ConnectOptions {
    /// Options for a server at the given address, with default timeouts
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            capabilities: serde_json::Map::new(),
            ssh: None,
            session_wait_timeout: Duration::from_secs(30),
            session_poll_interval: Duration::from_millis(500),
        }
    }

    /// Builder method: set one capability
    pub fn capability(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.capabilities.insert(key.into(), value.into());
        self
    }

    /// Builder method: replace the whole capability map
    pub fn capabilities(mut self, capabilities: serde_json::Map<String, Value>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Builder method: set SSH tunnel credentials
    pub fn ssh(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.ssh = Some(SshCredentials { user: user.into(), password: password.into() });
        self
    }

    /// Builder method: set the reconnect wait timeout
    pub fn session_wait_timeout(mut self, timeout: Duration) -> Self {
        self.session_wait_timeout = timeout;
        self
    }

    /// Builder method: set the reconnect poll interval
    pub fn session_poll_interval(mut self, interval: Duration) -> Self {
        self.session_poll_interval = interval;
        self
    }

    /// Base URL of the server, without a trailing slash
    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self::new("127.0.0.1", 4723)
    }
}
