#![deny(warnings)]
//! Network layer for the report pipeline
//!
//! - **`config`**: Stack constants and backend `ReporterConfig`
//! - **`connector`**: `Connect` implementation, plain TCP or TLS 1.3
//! - **`error`**: Error enums for network operations
//! - **`manager`**: DHCP bring-up
//! - **`socket`**: Async TCP socket wrapper for embedded-io-async
//!
//! The W5500 driver (`embassy-net-wiznet`) feeds the `embassy-net` stack,
//! which does all TCP/IP processing; the connector only uses its socket and
//! DNS APIs.

pub mod config;
pub mod connector;
pub mod error;
pub mod manager;
pub mod socket;

pub use config::{backend_config, NetworkConfig, REPORT_INTERVAL_SECS};
pub use connector::BoardConnector;
