#![deny(unsafe_code)]
#![deny(warnings)]
//! Network configuration structures
//!
//! Backend settings are baked in at build time:
//!
//! ```text
//! BACKEND_HOST=api.example.net BACKEND_PORT=8443 BACKEND_TLS=1 \
//!     cargo embed -p feather-stm32f405 --release
//! ```

use hal_abstractions::TransportMode;
use sensor_report_core::ReporterConfig;

/// Seconds between report rounds
pub const REPORT_INTERVAL_SECS: u64 = 5;

/// Network stack configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// MAC address for Ethernet
    pub mac_addr: [u8; 6],
    /// Random seed for network stack
    pub seed: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mac_addr: [0x02, 0x00, 0x00, 0x12, 0x34, 0x56],
            seed: 0x1234_5678_u64,
        }
    }
}

/// Interpret a `BACKEND_TLS` value
fn parse_tls_flag(value: &str) -> bool {
    matches!(value, "1" | "true" | "yes" | "on")
}

/// Build the reporter configuration from the given overrides
///
/// A missing or unparsable port falls back to the transport's default.
fn reporter_config(
    host: Option<&'static str>,
    port: Option<&'static str>,
    tls: Option<&'static str>,
) -> ReporterConfig {
    let defaults = ReporterConfig::default();
    let transport = tls
        .map(|v| TransportMode::from_tls_flag(parse_tls_flag(v)))
        .unwrap_or(defaults.transport);
    let port = port
        .and_then(|p| p.parse().ok())
        .unwrap_or(ReporterConfig::default_port(transport));

    ReporterConfig {
        host: host.unwrap_or(defaults.host),
        port,
        transport,
        ..defaults
    }
}

/// Backend configuration from `BACKEND_HOST`, `BACKEND_PORT` and `BACKEND_TLS`
pub fn backend_config() -> ReporterConfig {
    reporter_config(
        option_env!("BACKEND_HOST"),
        option_env!("BACKEND_PORT"),
        option_env!("BACKEND_TLS"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_overrides() {
        assert_eq!(reporter_config(None, None, None), ReporterConfig::default());
    }

    #[test]
    fn test_tls_selects_default_tls_port() {
        let config = reporter_config(Some("api.example.net"), None, Some("1"));
        assert_eq!(config.host, "api.example.net");
        assert_eq!(config.transport, TransportMode::Tls);
        assert_eq!(config.port, 443);
    }

    #[test]
    fn test_explicit_port_wins() {
        let config = reporter_config(None, Some("8080"), Some("0"));
        assert_eq!(config.transport, TransportMode::Plain);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_bad_port_falls_back() {
        let config = reporter_config(None, Some("http"), None);
        assert_eq!(config.port, 80);
    }
}
