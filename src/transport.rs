use std::io;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::address::AddressSpec;
use crate::error::TransportError;

/// A single request/response round trip with a query target.
///
/// [UdpTransport] is the real implementation; tests substitute their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn exchange(
        &self,
        target: &AddressSpec,
        packet: &[u8],
    ) -> Result<Vec<u8>, TransportError>;
}

/// One fresh UDP socket per exchange, dropped on every exit path.
#[derive(Debug, Clone)]
pub struct UdpTransport {
    dial_timeout: Duration,
    read_timeout: Duration,
    max_response_size: usize,
}

impl UdpTransport {
    pub fn new(dial_timeout: Duration, read_timeout: Duration, max_response_size: usize) -> Self {
        UdpTransport {
            dial_timeout,
            read_timeout,
            max_response_size,
        }
    }

    /// Bind and connect, both under a single `dial_timeout`.
    async fn dial(&self, target: &AddressSpec) -> Result<UdpSocket, TransportError> {
        let connect = async {
            // just arbitrarily bind any port, doesn't matter really
            let sock: UdpSocket = UdpSocket::bind("0.0.0.0:0").await?;
            sock.connect(target.socket_addr()).await?;
            Ok::<UdpSocket, io::Error>(sock)
        };

        timeout(self.dial_timeout, connect)
            .await
            .map_err(|_| TransportError::DialFailed(timed_out("dial")))?
            .map_err(TransportError::DialFailed)
    }
}

#[async_trait]
impl Transport for UdpTransport {
    async fn exchange(
        &self,
        target: &AddressSpec,
        packet: &[u8],
    ) -> Result<Vec<u8>, TransportError> {
        let sock: UdpSocket = self.dial(target).await?;
        debug!("connected to {target}");

        // sending
        let sent: usize = timeout(self.dial_timeout, sock.send(packet))
            .await
            .map_err(|_| TransportError::WriteFailed(timed_out("send")))?
            .map_err(TransportError::WriteFailed)?;
        if sent != packet.len() {
            return Err(TransportError::WriteFailed(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("sent {sent} of {} bytes", packet.len()),
            )));
        }

        // receiving packet
        let mut resp_buf: Vec<u8> = vec![0u8; self.max_response_size];
        let len: usize = timeout(self.read_timeout, sock.recv(&mut resp_buf))
            .await
            .map_err(|_| TransportError::ReadTimeout(self.read_timeout))?
            .map_err(TransportError::ReadFailed)?;
        resp_buf.truncate(len);
        debug!("received {len} bytes from {target}");

        Ok(resp_buf)
    }
}

fn timed_out(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("{what} timed out"))
}
