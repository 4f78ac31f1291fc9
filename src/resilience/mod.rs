//! Retry/backoff/reconnect machinery for remote operations.
//!
//! Remote mobile sessions fail in ways that have nothing to do with the
//! test being run: dropped connections, stale element references, server
//! restarts. A [`Resilient`] value is configured once per operation and
//! then wraps every invocation of it: allow-listed transient failures are
//! retried with a fixed pause, interleaved with a liveness check and a
//! reconnect when the session looks dead. Everything else propagates on
//! first occurrence.
//!
//! An operation that returns without an error is a success, full stop.
//! Operations with boolean failure semantics that want retries must map
//! `false` to an error themselves; this layer never inspects return
//! values.

use crate::error::{AutomationError, DEFAULT_RETRY_KINDS, Result, TransientKind};
use crate::session::SessionControl;
use std::time::Duration;

/// Longest argument preview that ends up in a log line
const ARG_PREVIEW_LEN: usize = 120;

/// Maps the exhaustion message and last recorded failure to a custom
/// error, for callers that want their own error kind on exhaustion
pub type RaiseAs = fn(String, Option<Box<AutomationError>>) -> AutomationError;

/// A call argument as rendered into diagnostic logs
#[derive(Debug, Clone, PartialEq)]
pub enum CallArg {
    /// Plain textual argument; long values are truncated in logs
    Text(String),
    /// The receiver the wrapped method is bound to; rendered as a short
    /// self-reference instead of a full dump
    Receiver,
}

impl CallArg {
    /// Textual argument
    pub fn text(value: impl Into<String>) -> Self {
        CallArg::Text(value.into())
    }
}

fn render_arg(arg: &CallArg) -> String {
    match arg {
        CallArg::Receiver => "<session>".to_string(),
        CallArg::Text(s) => {
            if s.chars().count() > ARG_PREVIEW_LEN {
                let preview: String = s.chars().take(ARG_PREVIEW_LEN).collect();
                format!("\"{preview}…\"")
            } else {
                format!("\"{s}\"")
            }
        }
    }
}

fn render_args(args: &[CallArg]) -> String {
    args.iter().map(render_arg).collect::<Vec<_>>().join(", ")
}

/// Retry configuration for one wrapped operation.
///
/// Created once at operation-registration time and reused across all
/// invocations of that operation.
pub struct Resilient<T> {
    operation: String,
    retries: u32,
    delay_secs: f64,
    retry_on: Vec<TransientKind>,
    fallback: Option<T>,
    raise_as: Option<RaiseAs>,
    log_args: bool,
    sleeper: Box<dyn Fn(Duration) + Send + Sync>,
}

impl<T: Clone> Resilient<T> {
    /// Configuration with the default budget: three attempts, half a
    /// second apart, retrying the session-shaped failure kinds
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            retries: 3,
            delay_secs: 0.5,
            retry_on: DEFAULT_RETRY_KINDS.to_vec(),
            fallback: None,
            raise_as: None,
            log_args: false,
            sleeper: Box::new(std::thread::sleep),
        }
    }

    /// Builder method: attempt budget (0 means the operation is never run)
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Builder method: fixed pause between attempts, in seconds
    pub fn delay_secs(mut self, secs: f64) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Builder method: replace the retry allow-list
    pub fn retry_on(mut self, kinds: impl IntoIterator<Item = TransientKind>) -> Self {
        self.retry_on = kinds.into_iter().collect();
        self
    }

    /// Builder method: value to return instead of an error on exhaustion
    pub fn fallback(mut self, value: T) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Builder method: custom error constructor for exhaustion
    pub fn raise_as(mut self, map: RaiseAs) -> Self {
        self.raise_as = Some(map);
        self
    }

    /// Builder method: log argument snapshots on every failed attempt
    pub fn log_args(mut self, enabled: bool) -> Self {
        self.log_args = enabled;
        self
    }

    /// Builder method: replace the sleep function (test hook)
    pub fn with_sleeper(mut self, sleeper: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    fn validated_delay(&self) -> Result<Duration> {
        if !self.delay_secs.is_finite() || self.delay_secs < 0.0 {
            return Err(AutomationError::Configuration(format!(
                "retry delay must be a non-negative number of seconds, got {}",
                self.delay_secs
            )));
        }
        Ok(Duration::from_secs_f64(self.delay_secs))
    }

    /// Run the operation under this retry configuration
    pub fn invoke(
        &self,
        session: &dyn SessionControl,
        op: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        self.invoke_with_args(session, &[], op)
    }

    /// Run the operation, logging the given argument snapshots on failed
    /// attempts when `log_args` is enabled
    pub fn invoke_with_args(
        &self,
        session: &dyn SessionControl,
        args: &[CallArg],
        mut op: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let delay = self.validated_delay()?;
        let mut last_error: Option<AutomationError> = None;
        let mut attempt = 0u32;

        while attempt < self.retries {
            match op() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    let retryable =
                        err.transient_kind().is_some_and(|kind| self.retry_on.contains(&kind));
                    if !retryable {
                        return Err(err);
                    }
                    log::warn!(
                        "{} attempt {}/{} failed: {err}",
                        self.operation,
                        attempt + 1,
                        self.retries
                    );
                    if self.log_args && !args.is_empty() {
                        log::warn!("{} args: [{}]", self.operation, render_args(args));
                    }
                    last_error = Some(err);
                    if !session.is_connected() {
                        log::info!(
                            "session looks dead, reconnecting before next {} attempt",
                            self.operation
                        );
                        session.reconnect()?;
                    }
                    (self.sleeper)(delay);
                    attempt += 1;
                }
            }
        }

        if let Some(fallback) = &self.fallback {
            log::warn!(
                "{} exhausted {} attempts, resolving to the configured fallback",
                self.operation,
                self.retries
            );
            return Ok(fallback.clone());
        }
        let cause = last_error.map(Box::new);
        match self.raise_as {
            Some(map) => {
                let message =
                    format!("{} failed after {} attempts", self.operation, self.retries);
                Err(map(message, cause))
            }
            None => Err(AutomationError::Exhausted {
                operation: self.operation.clone(),
                attempts: self.retries,
                source: cause,
            }),
        }
    }
}
