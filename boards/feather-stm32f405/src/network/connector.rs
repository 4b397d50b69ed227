#![deny(unsafe_code)]
#![deny(warnings)]
//! Board transport: embassy-net TCP, optionally wrapped in TLS 1.3
//!
//! [`BoardConnector`] owns the TCP socket buffers, the TLS record buffers and
//! the hardware RNG, and hands out one [`BoardConnection`] at a time. The
//! report pipeline sees both transports through the same
//! `hal_abstractions::Connection` interface.
//!
//! # Memory Usage
//!
//! - TLS read buffer: 18 KB in main SRAM (see `src/tls_buffers.rs`)
//! - TLS write buffer: 16 KB in main SRAM (see `src/tls_buffers.rs`)
//! - TCP socket buffers: 4 KB RX + 4 KB TX, owned by the connector

use defmt::{debug, error, info, warn, Debug2Format};
use embassy_net::dns::DnsQueryType;
use embassy_net::{IpAddress, IpEndpoint, Ipv4Address, Stack};
use embedded_io_async::{ErrorType, Read, Write};
use embedded_tls::{
    Aes128GcmSha256, CryptoProvider, NoVerify, TlsConfig, TlsConnection, TlsContext, TlsVerifier,
};
use hal_abstractions::{Connect, Connection, TransportMode};

use crate::tls_buffers::TlsBuffers;

use super::error::{NetworkError, TlsError};
use super::socket::AsyncTcpSocket;

/// TCP socket buffer size, per direction
const SOCKET_BUF_SIZE: usize = 4096;

/// Simple crypto provider that wraps an RNG for TLS operations
struct SimpleCryptoProvider<'a, RNG> {
    rng: &'a mut RNG,
    verifier: NoVerify,
}

impl<'a, RNG> SimpleCryptoProvider<'a, RNG> {
    fn new(rng: &'a mut RNG) -> Self {
        Self {
            rng,
            verifier: NoVerify,
        }
    }
}

impl<RNG> CryptoProvider for SimpleCryptoProvider<'_, RNG>
where
    RNG: rand_core::CryptoRngCore,
{
    type CipherSuite = Aes128GcmSha256;
    type Signature = &'static [u8];

    fn rng(&mut self) -> impl rand_core::CryptoRngCore {
        &mut *self.rng
    }

    fn verifier(
        &mut self,
    ) -> Result<&mut impl TlsVerifier<Self::CipherSuite>, embedded_tls::TlsError> {
        Ok(&mut self.verifier)
    }
}

/// Resolve `host` to an endpoint
///
/// IPv4 literals are used as-is; anything else goes through DNS.
async fn resolve(stack: Stack<'_>, host: &str, port: u16) -> Result<IpEndpoint, NetworkError> {
    if let Ok(ip) = host.parse::<Ipv4Address>() {
        return Ok(IpEndpoint::new(IpAddress::Ipv4(ip), port));
    }

    let server_ip = stack
        .dns_query(host, DnsQueryType::A)
        .await
        .map_err(|e| {
            error!("DNS query failed: {:?}", Debug2Format(&e));
            NetworkError::DnsError
        })?
        .first()
        .copied()
        .ok_or_else(|| {
            error!("DNS returned no results for {}", host);
            NetworkError::DnsError
        })?;

    let endpoint = IpEndpoint::new(server_ip, port);
    debug!("Resolved {} to {}", host, Debug2Format(&endpoint));
    Ok(endpoint)
}

/// Opens plain or TLS connections over the embassy-net stack
pub struct BoardConnector<'s, RNG> {
    stack: Stack<'s>,
    rng: RNG,
    tls: TlsBuffers,
    rx_buffer: [u8; SOCKET_BUF_SIZE],
    tx_buffer: [u8; SOCKET_BUF_SIZE],
}

impl<'s, RNG> BoardConnector<'s, RNG>
where
    RNG: rand_core::RngCore + rand_core::CryptoRng,
{
    pub fn new(stack: Stack<'s>, rng: RNG, tls: TlsBuffers) -> Self {
        Self {
            stack,
            rng,
            tls,
            rx_buffer: [0; SOCKET_BUF_SIZE],
            tx_buffer: [0; SOCKET_BUF_SIZE],
        }
    }
}

impl<'s, RNG> Connect for BoardConnector<'s, RNG>
where
    RNG: rand_core::RngCore + rand_core::CryptoRng,
{
    type Error = NetworkError;
    type Connection<'a>
        = BoardConnection<'a>
    where
        Self: 'a;

    async fn connect<'a>(
        &'a mut self,
        host: &'a str,
        port: u16,
        mode: TransportMode,
    ) -> Result<BoardConnection<'a>, NetworkError> {
        // Step 1: Resolve the backend address
        let endpoint = resolve(self.stack, host, port).await?;

        // Step 2: Create and connect TCP socket
        let mut socket = AsyncTcpSocket::new(self.stack, &mut self.rx_buffer, &mut self.tx_buffer);
        socket.connect(endpoint).await?;
        debug!("TCP connection established to {}", Debug2Format(&endpoint));

        if mode == TransportMode::Plain {
            return Ok(BoardConnection::Plain(socket));
        }

        // Step 3: Configure TLS with server name for SNI
        let config = TlsConfig::new().with_server_name(host);

        // Step 4: Create TLS connection over the connected socket
        let mut tls_connection = TlsConnection::<AsyncTcpSocket, Aes128GcmSha256>::new(
            socket,
            &mut *self.tls.read,
            &mut *self.tls.write,
        );

        // Step 5: Perform TLS handshake
        debug!("Initiating TLS 1.3 handshake with {}", host);
        let provider = SimpleCryptoProvider::new(&mut self.rng);
        let tls_context = TlsContext::new(&config, provider);

        tls_connection.open(tls_context).await.map_err(|e| {
            error!("TLS handshake failed: {:?}", Debug2Format(&e));
            TlsError::HandshakeFailed
        })?;

        info!("TLS 1.3 session established with {}", host);
        Ok(BoardConnection::Tls(tls_connection))
    }
}

/// An open stream to the backend
pub enum BoardConnection<'a> {
    Plain(AsyncTcpSocket<'a>),
    Tls(TlsConnection<'a, AsyncTcpSocket<'a>, Aes128GcmSha256>),
}

fn record_error(e: embedded_tls::TlsError) -> NetworkError {
    debug!("TLS record layer error: {:?}", Debug2Format(&e));
    match e {
        embedded_tls::TlsError::ConnectionClosed => TlsError::ConnectionClosed.into(),
        _ => TlsError::RecordError.into(),
    }
}

impl ErrorType for BoardConnection<'_> {
    type Error = NetworkError;
}

impl Read for BoardConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match self {
            Self::Plain(socket) => socket.read(buf).await,
            Self::Tls(tls) => tls.read(buf).await.map_err(record_error),
        }
    }
}

impl Write for BoardConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        match self {
            Self::Plain(socket) => socket.write(buf).await,
            Self::Tls(tls) => tls.write(buf).await.map_err(record_error),
        }
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        match self {
            Self::Plain(socket) => socket.flush().await,
            Self::Tls(tls) => tls.flush().await.map_err(record_error),
        }
    }
}

impl Connection for BoardConnection<'_> {
    async fn close(self) {
        match self {
            Self::Plain(mut socket) => socket.close().await,
            Self::Tls(tls) => {
                let mut socket = match tls.close().await {
                    Ok(socket) => socket,
                    Err((socket, e)) => {
                        warn!("TLS close returned error: {:?}", Debug2Format(&e));
                        socket
                    }
                };
                socket.close().await;
            }
        }
        debug!("Connection closed");
    }
}
