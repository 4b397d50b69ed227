#![deny(unsafe_code)]
#![deny(warnings)]
//! Async TCP socket wrapper
//!
//! Wraps `embassy_net::tcp::TcpSocket` in the `embedded-io-async` traits so
//! the same stream type serves plain HTTP and the `embedded-tls` transport.

use defmt::{debug, Debug2Format};
use embassy_net::tcp::{ConnectError, TcpSocket};
use embassy_net::{IpEndpoint, Stack};
use embedded_io_async::{ErrorType, Read, Write};

use super::error::NetworkError;

/// Async TCP socket wrapper implementing embedded-io-async traits
pub struct AsyncTcpSocket<'a> {
    socket: TcpSocket<'a>,
}

impl<'a> AsyncTcpSocket<'a> {
    /// Create a new async TCP socket
    ///
    /// # Arguments
    ///
    /// * `stack` - Embassy network stack
    /// * `rx_buffer` - Buffer for receiving data
    /// * `tx_buffer` - Buffer for transmitting data
    pub fn new(stack: Stack<'a>, rx_buffer: &'a mut [u8], tx_buffer: &'a mut [u8]) -> Self {
        Self {
            socket: TcpSocket::new(stack, rx_buffer, tx_buffer),
        }
    }

    /// Connect to a remote endpoint
    ///
    /// # Errors
    ///
    /// - `NetworkError::ConnectionRefused` if the peer reset the connection
    /// - `NetworkError::SocketError` for every other connect failure
    pub async fn connect(&mut self, endpoint: IpEndpoint) -> Result<(), NetworkError> {
        self.socket.connect(endpoint).await.map_err(|e| {
            debug!("TCP connect failed: {:?}", Debug2Format(&e));
            match e {
                ConnectError::ConnectionReset => NetworkError::ConnectionRefused,
                _ => NetworkError::SocketError,
            }
        })
    }

    /// Send FIN and drain pending output
    pub async fn close(&mut self) {
        self.socket.close();
        if self.socket.flush().await.is_err() {
            debug!("TCP flush after close failed, aborting");
            self.socket.abort();
        }
    }
}

impl ErrorType for AsyncTcpSocket<'_> {
    type Error = NetworkError;
}

impl Read for AsyncTcpSocket<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.socket
            .read(buf)
            .await
            .map_err(|_| NetworkError::IoError)
    }
}

impl Write for AsyncTcpSocket<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket
            .write(buf)
            .await
            .map_err(|_| NetworkError::IoError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket
            .flush()
            .await
            .map_err(|_| NetworkError::IoError)
    }
}
