//! # mobile-use
//!
//! A Rust library for mobile UI test automation on top of a remote
//! automation driver, built around two ideas: one locator vocabulary with
//! composable element-relationship queries, and a resilience layer that
//! absorbs the flakiness of remote mobile sessions (dropped connections,
//! stale element references, server restarts).
//!
//! ## Features
//!
//! - **Locator Model**: three interchangeable notations (attribute map,
//!   XPath, UiSelector DSL) with on-demand translation between them
//! - **Relationship Queries**: derive locators for parents, siblings,
//!   cousins and ancestors of an element by XPath composition
//! - **Resilient Invocation**: per-operation retry/backoff/reconnect
//!   configuration applied to every remote call
//! - **Session Health Probing**: liveness checks across grid and
//!   standalone server deployment topologies
//!
//! ## Translating and Composing Locators
//!
//! ```rust
//! use mobile_use::{AttributeMap, Locator};
//! use mobile_use::locator::convert;
//! use mobile_use::dom::sibling_locator;
//!
//! # fn main() -> mobile_use::Result<()> {
//! let switch = Locator::attributes(
//!     AttributeMap::new().class("android.widget.Switch").text("Wi-Fi"),
//! );
//! assert_eq!(
//!     convert::to_xpath(&switch)?.as_str(),
//!     "//android.widget.Switch[@text='Wi-Fi']"
//! );
//!
//! // the label right of the switch
//! let label = Locator::attributes(AttributeMap::new().class("android.widget.TextView"));
//! let derived = sibling_locator(&switch, &label)?;
//! assert!(matches!(derived, Locator::XPath(_)));
//! # Ok(())
//! # }
//! ```
//!
//! ## Wrapping Remote Operations
//!
//! ```rust,no_run
//! use mobile_use::{ConnectOptions, DriverSession, Resilient};
//! use mobile_use::session::DriverBackend;
//!
//! # fn connect_backend() -> Box<dyn DriverBackend> { unimplemented!() }
//! # fn main() -> mobile_use::Result<()> {
//! let options = ConnectOptions::new("127.0.0.1", 4723)
//!     .capability("platformName", "Android");
//! let session = DriverSession::with_standard_monitor(options, connect_backend());
//! session.connect()?;
//!
//! // configured once, reused for every invocation of the operation
//! let call = Resilient::new("read settings header").retries(5).delay_secs(0.3);
//! let header = call.invoke(&session, || {
//!     // any remote operation; transient failures are retried with
//!     // reconnects in between
//!     Ok("Settings".to_string())
//! })?;
//! assert_eq!(header, "Settings");
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`locator`]: locator notations, translation and normalization
//! - [`dom`]: element-relationship composition over the live UI tree
//! - [`session`]: connection options, health probing, the shared session
//!   handle
//! - [`resilience`]: the retry/backoff/reconnect wrapper
//! - [`element`]: locator-bound element handles
//! - [`error`]: error types and result aliases

pub mod dom;
pub mod element;
pub mod error;
pub mod locator;
pub mod resilience;
pub mod session;

pub use dom::{DomNavigator, TreeInspector, TreeNode};
pub use element::Element;
pub use error::{AutomationError, DEFAULT_RETRY_KINDS, Operand, Result, TransientKind};
pub use locator::{AttrValue, AttributeMap, AttributeMatch, Locator, MatchMode, UiSelectorExpr, XPathExpr};
pub use resilience::{CallArg, Resilient};
pub use session::{
    Command, CommandExecutor, ConnectOptions, DriverBackend, DriverSession, SessionControl,
    SessionHealthMonitor, SessionProbe,
};
