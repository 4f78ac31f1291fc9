//! Session liveness probing across server deployment topologies.
//!
//! A remote automation server exposes its session listing in one of three
//! shapes depending on how it is deployed: behind a grid, as a legacy
//! standalone server, or as a new-style standalone server. The monitor
//! walks an ordered list of probes and considers the session alive as soon
//! as any one of them finds its id; probe failures of any kind (network,
//! JSON, shape) count as "not listed", never as errors.

use serde_json::Value;
use std::time::Duration;

/// Per-request deadline for a status endpoint
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// One way of asking a deployment topology whether a session is listed
pub trait SessionProbe: Send + Sync {
    /// Short topology name for log lines
    fn name(&self) -> &str;

    /// Whether the session id is currently listed. Must not fail: any
    /// internal error means "not listed here".
    fn is_alive(&self, session_id: &str) -> bool;
}

/// Ordered probe list with first-success short-circuit
pub struct SessionHealthMonitor {
    probes: Vec<Box<dyn SessionProbe>>,
}

impl SessionHealthMonitor {
    /// Monitor over a custom probe list, consulted in order
    pub fn new(probes: Vec<Box<dyn SessionProbe>>) -> Self {
        Self { probes }
    }

    /// The three standard topologies for a server at `server_url`,
    /// in priority order: grid, legacy standalone, new-style standalone
    pub fn standard(server_url: &str) -> Self {
        Self::new(vec![
            Box::new(GridStatusProbe::new(server_url)),
            Box::new(SessionListProbe::legacy(server_url)),
            Box::new(SessionListProbe::new_style(server_url)),
        ])
    }

    /// Whether any probe currently lists the session.
    ///
    /// Recomputed on every call; session state on the server can change
    /// between any two invocations.
    pub fn is_connected(&self, session_id: &str) -> bool {
        for probe in &self.probes {
            if probe.is_alive(session_id) {
                log::debug!("session {session_id} alive via {} probe", probe.name());
                return true;
            }
        }
        log::debug!("session {session_id} not listed by any topology probe");
        false
    }
}

/// Grid topology: session ids are nested in node slot descriptors
pub struct GridStatusProbe {
    client: reqwest::blocking::Client,
    url: String,
}

impl GridStatusProbe {
    /// Probe the grid status endpoint of `server_url`
    pub fn new(server_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            url: format!("{}/status", server_url.trim_end_matches('/')),
        }
    }

    fn fetch(&self) -> reqwest::Result<Value> {
        self.client.get(&self.url).timeout(PROBE_TIMEOUT).send()?.json()
    }
}

impl SessionProbe for GridStatusProbe {
    fn name(&self) -> &str {
        "grid"
    }

    fn is_alive(&self, session_id: &str) -> bool {
        match self.fetch() {
            Ok(status) => grid_lists_session(&status, session_id),
            Err(err) => {
                log::debug!("grid probe against {} failed: {err}", self.url);
                false
            }
        }
    }
}

/// Standalone topology: a flat session list under `value`.
///
/// Legacy and new-style servers share the response shape and differ only
/// in the endpoint path.
pub struct SessionListProbe {
    client: reqwest::blocking::Client,
    name: &'static str,
    url: String,
}

impl SessionListProbe {
    /// Probe the legacy standalone session-list endpoint
    pub fn legacy(server_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            name: "standalone",
            url: format!("{}/sessions", server_url.trim_end_matches('/')),
        }
    }

    /// Probe the new-style standalone session-list endpoint
    pub fn new_style(server_url: &str) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            name: "standalone-new",
            url: format!("{}/appium/sessions", server_url.trim_end_matches('/')),
        }
    }

    fn fetch(&self) -> reqwest::Result<Value> {
        self.client.get(&self.url).timeout(PROBE_TIMEOUT).send()?.json()
    }
}

impl SessionProbe for SessionListProbe {
    fn name(&self) -> &str {
        self.name
    }

    fn is_alive(&self, session_id: &str) -> bool {
        match self.fetch() {
            Ok(payload) => list_contains_session(&payload, session_id),
            Err(err) => {
                log::debug!("{} probe against {} failed: {err}", self.name, self.url);
                false
            }
        }
    }
}

/// Whether a grid status payload lists the session in any node slot
pub(crate) fn grid_lists_session(status: &Value, session_id: &str) -> bool {
    let Some(nodes) = status.get("value").and_then(|v| v.get("nodes")).and_then(Value::as_array)
    else {
        return false;
    };
    nodes.iter().any(|node| {
        node.get("slots").and_then(Value::as_array).is_some_and(|slots| {
            slots.iter().any(|slot| {
                slot.get("session")
                    .and_then(|session| session.get("sessionId"))
                    .and_then(Value::as_str)
                    == Some(session_id)
            })
        })
    })
}

/// Whether a flat session-list payload contains the session id
pub(crate) fn list_contains_session(payload: &Value, session_id: &str) -> bool {
    payload
        .get("value")
        .and_then(Value::as_array)
        .is_some_and(|sessions| {
            sessions
                .iter()
                .any(|session| session.get("id").and_then(Value::as_str) == Some(session_id))
        })
}
