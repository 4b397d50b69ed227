//! Network transport abstraction
//!
//! A board provides a [`Connect`] implementation that opens a byte stream to
//! `host:port`, either plain TCP or wrapped in TLS. The stream is any
//! `embedded-io-async` reader/writer, so the same HTTP exchange runs over
//! both transports (and over in-memory mocks in tests).

use core::future::Future;

use embedded_io_async::{Read, Write};

/// Transport selection for a connection
///
/// This is a configuration-time choice, never negotiated with the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportMode {
    /// Plain TCP
    #[default]
    Plain,
    /// TLS over TCP
    Tls,
}

impl TransportMode {
    /// Map a boolean TLS flag onto a transport mode
    pub const fn from_tls_flag(use_tls: bool) -> Self {
        if use_tls {
            Self::Tls
        } else {
            Self::Plain
        }
    }

    /// Whether this mode wraps the stream in TLS
    pub const fn is_tls(self) -> bool {
        matches!(self, Self::Tls)
    }
}

/// Coarse classification of a connection failure, for logs and callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectErrorKind {
    /// Host name could not be resolved
    Dns,
    /// TCP connection refused or reset by the peer
    Refused,
    /// TCP connection could not be established (unreachable, no route)
    Unreachable,
    /// TLS handshake failed
    Tls,
    /// Anything else
    Other,
}

impl core::fmt::Display for ConnectErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Dns => write!(f, "DNS resolution failed"),
            Self::Refused => write!(f, "Connection refused"),
            Self::Unreachable => write!(f, "Host unreachable"),
            Self::Tls => write!(f, "TLS handshake failed"),
            Self::Other => write!(f, "Connection failed"),
        }
    }
}

/// Error returned by [`Connect::connect`]
pub trait ConnectError: core::fmt::Debug {
    /// Classify the failure
    fn kind(&self) -> ConnectErrorKind;
}

impl ConnectError for ConnectErrorKind {
    fn kind(&self) -> ConnectErrorKind {
        *self
    }
}

/// An open, bidirectional stream to a remote endpoint
pub trait Connection: Read + Write {
    /// Shut the stream down
    ///
    /// Closing never fails from the caller's point of view; implementations
    /// log whatever the underlying transport reports.
    fn close(self) -> impl Future<Output = ()>;
}

/// Opens [`Connection`]s
///
/// A connector owns whatever the transport needs (socket buffers, TLS
/// record buffers, RNG), so at most one connection per connector can be
/// open at a time: the returned connection borrows the connector mutably.
pub trait Connect {
    /// Connection failure
    type Error: ConnectError;

    /// Stream type produced by this connector
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// Open a connection to `host:port` using the given transport
    fn connect<'a>(
        &'a mut self,
        host: &'a str,
        port: u16,
        mode: TransportMode,
    ) -> impl Future<Output = Result<Self::Connection<'a>, Self::Error>>;
}
