//! Hardware abstraction traits for IoT firmware
//!
//! This crate defines traits that abstract over hardware differences
//! between boards. BSPs implement these traits; the platform-agnostic
//! core consumes them.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod identity;
pub mod network;

pub use identity::{DeviceId, DeviceIdentity, StaticIdentity, DEVICE_ID_MAX_LEN};
pub use network::{Connect, ConnectError, ConnectErrorKind, Connection, TransportMode};
