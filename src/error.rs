//! Error types and result aliases for the crate.

use thiserror::Error;

/// Result type alias using [`AutomationError`]
pub type Result<T> = std::result::Result<T, AutomationError>;

/// Which operand of a composed locator query failed to resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// The element the query starts from (the parent / current element)
    Source,
    /// The element the query is looking for (the child / relative)
    Target,
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Source => write!(f, "source"),
            Operand::Target => write!(f, "target"),
        }
    }
}

/// Recoverable failure categories reported by the remote driver.
///
/// Only kinds present in a [`Resilient`](crate::resilience::Resilient)
/// allow-list are eligible for retry; everything else propagates on first
/// occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientKind {
    /// The element reference is no longer attached to the UI tree
    StaleElementReference,
    /// The remote session id is no longer valid
    InvalidSessionId,
    /// No driver is servicing the session at all
    NoSuchDriver,
    /// The remote end did not answer within its deadline
    Timeout,
    /// Any other driver-reported failure
    WebDriver,
}

impl TransientKind {
    /// Stable lowercase name used in log lines and error messages
    pub fn as_str(self) -> &'static str {
        match self {
            TransientKind::StaleElementReference => "stale element reference",
            TransientKind::InvalidSessionId => "invalid session id",
            TransientKind::NoSuchDriver => "no such driver",
            TransientKind::Timeout => "timeout",
            TransientKind::WebDriver => "webdriver error",
        }
    }
}

impl std::fmt::Display for TransientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default retry allow-list: the session-shaped failures a reconnect can fix.
pub const DEFAULT_RETRY_KINDS: [TransientKind; 3] = [
    TransientKind::StaleElementReference,
    TransientKind::InvalidSessionId,
    TransientKind::NoSuchDriver,
];

/// Errors that can occur during locator handling or remote interaction
#[derive(Debug, Error)]
pub enum AutomationError {
    /// Locator translation or composition yielded nothing actionable.
    /// Deterministic, never retried.
    #[error("failed to resolve {operand} locator: {reason}")]
    ResolvingLocator {
        /// Side of the composed query that failed
        operand: Operand,
        /// What was wrong with the input
        reason: String,
    },

    /// An attribute or axis has no mapping in the requested target notation.
    /// Deterministic, never retried.
    #[error("'{attribute}' has no {notation} equivalent")]
    UnsupportedNotation {
        /// Attribute name or axis token that could not be translated
        attribute: String,
        /// Target notation the translation was aimed at
        notation: &'static str,
    },

    /// A recoverable remote-session problem reported by the driver
    #[error("{kind}: {message}")]
    Transient {
        /// Failure category, matched against retry allow-lists
        kind: TransientKind,
        /// Driver-supplied detail
        message: String,
    },

    /// Reconnect exceeded its timeout; the session cannot be recovered
    #[error("session could not be re-established: {0}")]
    FatalSession(String),

    /// Invalid resilience or connection parameters
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A resilient invocation ran out of attempts
    #[error("{operation} failed after {attempts} attempts")]
    Exhausted {
        /// Name of the wrapped operation
        operation: String,
        /// Attempt budget that was spent
        attempts: u32,
        /// Last allow-listed failure, if one was recorded
        #[source]
        source: Option<Box<AutomationError>>,
    },
}

impl AutomationError {
    /// Shorthand for a [`AutomationError::Transient`] with the given kind
    pub fn transient(kind: TransientKind, message: impl Into<String>) -> Self {
        AutomationError::Transient { kind, message: message.into() }
    }

    /// The transient kind of this error, if it is retryable at all
    pub fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            AutomationError::Transient { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
