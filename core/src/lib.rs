//! Platform-agnostic sensor reporting pipeline
//!
//! This crate contains the business logic shared across all supported
//! boards. It has NO hardware dependencies: boards plug in a network
//! connector, an identity source and a delay through the traits in
//! `hal-abstractions` and `embedded-hal-async`.
//!
//! Pipeline for one report:
//!
//! ```text
//! SensorReading --encode--> EncodedValue --build_payload--> JSON
//!     --Reporter::deliver--> POST over TCP or TLS
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod config;
pub mod error;
pub mod http;
pub mod payload;
pub mod reading;
pub mod report;

pub use config::ReporterConfig;
pub use error::{EncodeError, PayloadError, ReportError};
pub use http::ResponseSummary;
pub use payload::{build_payload, Field, FieldValue, Fields, Payload};
pub use reading::{encode, encode_or_empty, EncodedValue, SensorKind, SensorReading, SensorSource};
pub use report::{Delivered, Endpoint, Report, Reporter};

pub use hal_abstractions::TransportMode;
