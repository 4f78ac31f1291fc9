//! Remote session management: connection options, liveness probing, and
//! the shared session handle every remote operation goes through.

pub mod config;
pub mod driver;
pub mod health;

pub use config::{ConnectOptions, SshCredentials};
pub use driver::{Command, CommandExecutor, DriverBackend, DriverSession, SessionControl};
pub use health::{GridStatusProbe, SessionHealthMonitor, SessionListProbe, SessionProbe};
