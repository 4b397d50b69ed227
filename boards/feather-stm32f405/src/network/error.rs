#![deny(unsafe_code)]
#![deny(warnings)]
//! Network error types

use defmt::Format;
use hal_abstractions::{ConnectError, ConnectErrorKind};

/// Network operation errors
#[derive(Debug, Clone, Copy, Format)]
pub enum NetworkError {
    /// DNS resolution failed
    DnsError,
    /// Socket connect was refused or reset by the peer
    ConnectionRefused,
    /// Socket connect failed (no route, no link)
    SocketError,
    /// Socket read/write failed on an established connection
    IoError,
    /// TLS layer failure
    Tls(TlsError),
}

/// TLS-specific failures
#[derive(Debug, Clone, Copy, Format)]
pub enum TlsError {
    /// TLS handshake failed
    HandshakeFailed,
    /// TLS record could not be read or written
    RecordError,
    /// TLS connection closed unexpectedly
    ConnectionClosed,
}

impl From<TlsError> for NetworkError {
    fn from(e: TlsError) -> Self {
        Self::Tls(e)
    }
}

impl core::fmt::Display for TlsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::HandshakeFailed => write!(f, "TLS handshake failed"),
            Self::RecordError => write!(f, "TLS record error"),
            Self::ConnectionClosed => write!(f, "TLS connection closed"),
        }
    }
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::DnsError => write!(f, "DNS resolution failed"),
            Self::ConnectionRefused => write!(f, "Connection refused"),
            Self::SocketError => write!(f, "Socket error"),
            Self::IoError => write!(f, "Socket I/O error"),
            Self::Tls(e) => write!(f, "{}", e),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for NetworkError {}

impl embedded_io_async::Error for NetworkError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        match self {
            Self::SocketError | Self::IoError | Self::Tls(TlsError::ConnectionClosed) => {
                embedded_io_async::ErrorKind::BrokenPipe
            }
            Self::ConnectionRefused => embedded_io_async::ErrorKind::ConnectionRefused,
            Self::Tls(TlsError::RecordError) => embedded_io_async::ErrorKind::InvalidData,
            _ => embedded_io_async::ErrorKind::Other,
        }
    }
}

impl ConnectError for NetworkError {
    fn kind(&self) -> ConnectErrorKind {
        match self {
            Self::DnsError => ConnectErrorKind::Dns,
            Self::ConnectionRefused => ConnectErrorKind::Refused,
            Self::SocketError => ConnectErrorKind::Unreachable,
            Self::Tls(_) => ConnectErrorKind::Tls,
            Self::IoError => ConnectErrorKind::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_kind() {
        assert_eq!(
            ConnectError::kind(&NetworkError::ConnectionRefused),
            ConnectErrorKind::Refused
        );
        assert_eq!(
            ConnectError::kind(&NetworkError::from(TlsError::HandshakeFailed)),
            ConnectErrorKind::Tls
        );
    }
}
