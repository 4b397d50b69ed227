//! Reporter configuration

use hal_abstractions::TransportMode;

/// Backend and transport settings, fixed at reporter construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReporterConfig {
    /// Backend host name or IPv4 address
    pub host: &'static str,
    /// Backend TCP port
    pub port: u16,
    /// Plain TCP or TLS
    pub transport: TransportMode,
    /// Upper bound on establishing the connection (TLS handshake included)
    pub connect_timeout_ms: u32,
    /// Upper bound on each phase of the exchange once connected
    pub exchange_timeout_ms: u32,
}

impl ReporterConfig {
    /// Default port for a transport mode
    pub const fn default_port(transport: TransportMode) -> u16 {
        match transport {
            TransportMode::Plain => 80,
            TransportMode::Tls => 443,
        }
    }
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            host: "192.168.1.1",
            port: Self::default_port(TransportMode::Plain),
            transport: TransportMode::Plain,
            connect_timeout_ms: 5000,
            exchange_timeout_ms: 5000,
        }
    }
}
