use crate::error::{AutomationError, Result, TransientKind};
use crate::session::config::ConnectOptions;
use crate::session::health::SessionHealthMonitor;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

/// A driver protocol command: a name plus JSON parameters.
///
/// The wire format is the backend's business; this crate only routes
/// commands to whatever session is currently active.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Protocol command name
    pub name: String,
    /// Command parameters, passed through verbatim
    pub params: Value,
}

impl Command {
    /// Create a command with JSON parameters
    pub fn new(name: impl Into<String>, params: Value) -> Self {
        Self { name: name.into(), params }
    }
}

/// The opaque remote-driver boundary: session lifecycle plus command
/// dispatch. Protocol failures must surface as
/// [`AutomationError::Transient`] with the matching kind so retry
/// allow-lists can classify them.
pub trait DriverBackend: Send + Sync {
    /// Create a new session and return its assigned id
    fn create_session(&self, options: &ConnectOptions) -> Result<String>;

    /// Delete a session by id
    fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Execute a command against a session
    fn execute(&self, session_id: &str, command: &Command) -> Result<Value>;
}

/// Executes commands against whatever session is currently active
pub trait CommandExecutor {
    /// Run a command and return the driver's JSON answer
    fn execute(&self, command: &Command) -> Result<Value>;
}

/// Liveness checking and recovery, as seen by the resilience layer
pub trait SessionControl {
    /// Whether the remote end still knows the current session
    fn is_connected(&self) -> bool;

    /// Tear the session down and establish a fresh one
    fn reconnect(&self) -> Result<()>;
}

/// The shared handle to one remote automation session.
///
/// There is exactly one active session per handle; every component that
/// needs the connection holds an `Arc<DriverSession>` and all
/// session-mutating operations serialize behind an internal mutex, so
/// concurrent callers racing a reconnect see either the old session or
/// the fully established new one.
pub struct DriverSession {
    options: ConnectOptions,
    backend: Box<dyn DriverBackend>,
    monitor: SessionHealthMonitor,
    session_id: Mutex<Option<String>>,
}

impl DriverSession {
    /// Create a handle with an explicit health monitor
    pub fn new(
        options: ConnectOptions,
        backend: Box<dyn DriverBackend>,
        monitor: SessionHealthMonitor,
    ) -> Self {
        Self { options, backend, monitor, session_id: Mutex::new(None) }
    }

    /// Create a handle probing the standard topologies of the configured
    /// server
    pub fn with_standard_monitor(options: ConnectOptions, backend: Box<dyn DriverBackend>) -> Self {
        let monitor = SessionHealthMonitor::standard(&options.server_url());
        Self::new(options, backend, monitor)
    }

    /// The connection parameters this handle was created with
    pub fn options(&self) -> &ConnectOptions {
        &self.options
    }

    /// Id of the active session, if one is established
    pub fn session_id(&self) -> Option<String> {
        self.session_id.lock().ok().and_then(|guard| guard.clone())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<String>>> {
        self.session_id
            .lock()
            .map_err(|_| AutomationError::FatalSession("session handle lock poisoned".to_string()))
    }

    /// Establish a session if none is active; returns the active id
    pub fn connect(&self) -> Result<String> {
        let mut guard = self.lock()?;
        if let Some(id) = guard.as_ref() {
            return Ok(id.clone());
        }
        let id = self.backend.create_session(&self.options)?;
        log::info!("connected to {} as session {id}", self.options.server_url());
        *guard = Some(id.clone());
        Ok(id)
    }

    /// Tear the session down. Delete failures are logged and swallowed;
    /// the handle ends up disconnected either way.
    pub fn disconnect(&self) -> Result<()> {
        let mut guard = self.lock()?;
        if let Some(id) = guard.take() {
            log::debug!("disconnecting session {id}");
            if let Err(err) = self.backend.delete_session(&id) {
                log::debug!("session delete during disconnect failed: {err}");
            }
        }
        Ok(())
    }

    /// Drop the current session and establish a fresh one with the stored
    /// connection parameters.
    ///
    /// The old session is deleted best-effort: a driver that already
    /// forgot it answers "invalid session" or "not found", which is the
    /// expected outcome here, not a failure. The call then blocks until a
    /// new session id is assigned or the configured wait timeout elapses,
    /// in which case the session is given up on with
    /// [`AutomationError::FatalSession`].
    pub fn reconnect(&self) -> Result<String> {
        let mut guard = self.lock()?;
        if let Some(id) = guard.take() {
            match self.backend.delete_session(&id) {
                Ok(()) => log::debug!("deleted stale session {id}"),
                Err(err) => log::debug!("stale session delete failed (expected after a drop): {err}"),
            }
        }

        let deadline = Instant::now() + self.options.session_wait_timeout;
        loop {
            match self.backend.create_session(&self.options) {
                Ok(id) if !id.is_empty() => {
                    log::info!("re-established session {id}");
                    *guard = Some(id.clone());
                    return Ok(id);
                }
                Ok(_) => log::debug!("driver answered the create request without a session id"),
                Err(err) if err.transient_kind().is_some() => {
                    log::warn!("session create failed: {err}");
                }
                Err(err) => return Err(err),
            }
            if Instant::now() >= deadline {
                return Err(AutomationError::FatalSession(format!(
                    "no session id assigned within {:?}",
                    self.options.session_wait_timeout
                )));
            }
            std::thread::sleep(self.options.session_poll_interval);
        }
    }
}

impl SessionControl for DriverSession {
    fn is_connected(&self) -> bool {
        match self.session_id() {
            Some(id) => self.monitor.is_connected(&id),
            None => false,
        }
    }

    fn reconnect(&self) -> Result<()> {
        DriverSession::reconnect(self).map(|_| ())
    }
}

impl CommandExecutor for DriverSession {
    fn execute(&self, command: &Command) -> Result<Value> {
        let id = self.session_id().ok_or_else(|| {
            AutomationError::transient(TransientKind::InvalidSessionId, "no active session")
        })?;
        log::debug!("executing {} against session {id}", command.name);
        self.backend.execute(&id, command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::health::SessionProbe;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Backend fake that fails session creation a configurable number of
    /// times before handing out ids
    struct FlakyBackend {
        create_failures: usize,
        creates: AtomicUsize,
        deletes: AtomicUsize,
        delete_fails: bool,
    }

    impl FlakyBackend {
        fn reliable() -> Self {
            Self::failing(0)
        }

        fn failing(create_failures: usize) -> Self {
            Self {
                create_failures,
                creates: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
                delete_fails: false,
            }
        }
    }

    impl DriverBackend for FlakyBackend {
        fn create_session(&self, _options: &ConnectOptions) -> Result<String> {
            let attempt = self.creates.fetch_add(1, Ordering::SeqCst);
            if attempt < self.create_failures {
                return Err(AutomationError::transient(
                    TransientKind::NoSuchDriver,
                    "server still starting",
                ));
            }
            Ok(format!("session-{attempt}"))
        }

        fn delete_session(&self, _session_id: &str) -> Result<()> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.delete_fails {
                return Err(AutomationError::transient(
                    TransientKind::InvalidSessionId,
                    "already gone",
                ));
            }
            Ok(())
        }

        fn execute(&self, session_id: &str, command: &Command) -> Result<Value> {
            Ok(json!({"session": session_id, "command": command.name}))
        }
    }

    struct AlwaysDead;

    impl DriverBackend for AlwaysDead {
        fn create_session(&self, _options: &ConnectOptions) -> Result<String> {
            Err(AutomationError::transient(TransientKind::NoSuchDriver, "nobody home"))
        }

        fn delete_session(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }

        fn execute(&self, _session_id: &str, _command: &Command) -> Result<Value> {
            Err(AutomationError::transient(TransientKind::NoSuchDriver, "nobody home"))
        }
    }

    struct FixedProbe(bool);

    impl SessionProbe for FixedProbe {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_alive(&self, _session_id: &str) -> bool {
            self.0
        }
    }

    fn quick_options() -> ConnectOptions {
        ConnectOptions::default()
            .session_wait_timeout(Duration::from_millis(50))
            .session_poll_interval(Duration::from_millis(1))
    }

    fn session_over(backend: impl DriverBackend + 'static, alive: bool) -> DriverSession {
        DriverSession::new(
            quick_options(),
            Box::new(backend),
            SessionHealthMonitor::new(vec![Box::new(FixedProbe(alive))]),
        )
    }

    #[test]
    fn test_connect_is_idempotent() {
        let session = session_over(FlakyBackend::reliable(), true);

        let first = session.connect().unwrap();
        let second = session.connect().unwrap();
        assert_eq!(first, second);
        assert_eq!(session.session_id(), Some(first));
    }

    #[test]
    fn test_execute_without_session_is_transient() {
        let session = session_over(FlakyBackend::reliable(), true);

        let err = session.execute(&Command::new("getPageSource", json!({}))).unwrap_err();
        assert_eq!(err.transient_kind(), Some(TransientKind::InvalidSessionId));
    }

    #[test]
    fn test_execute_routes_to_active_session() {
        let session = session_over(FlakyBackend::reliable(), true);
        let id = session.connect().unwrap();

        let answer = session.execute(&Command::new("getPageSource", json!({}))).unwrap();
        assert_eq!(answer["session"], json!(id));
    }

    #[test]
    fn test_disconnect_clears_session_and_swallows_delete_failure() {
        let mut backend = FlakyBackend::reliable();
        backend.delete_fails = true;
        let session = session_over(backend, true);

        session.connect().unwrap();
        session.disconnect().unwrap();
        assert!(session.session_id().is_none());

        // a second disconnect has nothing to delete and is a no-op
        session.disconnect().unwrap();
    }

    #[test]
    fn test_reconnect_replaces_session_and_swallows_delete_failure() {
        let mut backend = FlakyBackend::reliable();
        backend.delete_fails = true;
        let session = session_over(backend, true);

        let old = session.connect().unwrap();
        let new = session.reconnect().unwrap();
        assert_ne!(old, new);
        assert_eq!(session.session_id(), Some(new));
    }

    #[test]
    fn test_reconnect_retries_until_id_assigned() {
        let session = session_over(FlakyBackend::failing(2), true);

        let id = session.reconnect().unwrap();
        assert_eq!(id, "session-2");
    }

    #[test]
    fn test_reconnect_times_out_fatally() {
        let session = session_over(AlwaysDead, false);

        let err = session.reconnect().unwrap_err();
        assert!(matches!(err, AutomationError::FatalSession(_)));
        assert!(session.session_id().is_none());
    }

    #[test]
    fn test_is_connected_consults_monitor() {
        let session = session_over(FlakyBackend::reliable(), true);
        assert!(!session.is_connected()); // no session yet

        session.connect().unwrap();
        assert!(session.is_connected());

        let dead = session_over(FlakyBackend::reliable(), false);
        dead.connect().unwrap();
        assert!(!dead.is_connected());
    }
}
