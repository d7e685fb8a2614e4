//! Transport implementations
//!
//! One [`Connection`] variant per endpoint kind, picked once from the
//! endpoint when the destination dials.

mod file;
mod network;
mod tls;

use std::io;
use std::time::Duration;

use contracts::{Endpoint, EndpointKind};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
#[cfg(unix)]
use tokio::net::{UnixDatagram, UnixStream};
use tokio_native_tls::TlsStream;

/// Default bound on dialing (and the TLS handshake)
pub const DEFAULT_DIAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Options shared by every destination of a set
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// Bound on dial and handshake for network transports
    pub dial_timeout: Duration,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            dial_timeout: DEFAULT_DIAL_TIMEOUT,
        }
    }
}

/// Open outbound handle
pub enum Connection {
    File(File),
    Tcp(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Udp(UdpSocket),
    #[cfg(unix)]
    Unix(UnixStream),
    #[cfg(unix)]
    UnixDatagram(UnixDatagram),
}

impl Connection {
    /// Open the transport selected by the endpoint kind
    pub async fn open(
        endpoint: &Endpoint,
        allow_self_signed_cert: bool,
        options: &ConnectOptions,
    ) -> io::Result<Self> {
        let timeout = options.dial_timeout;
        match endpoint.kind {
            EndpointKind::File => file::open_append(&endpoint.address).await.map(Self::File),
            EndpointKind::Tcp => network::dial_tcp(&endpoint.address, endpoint.family, timeout)
                .await
                .map(Self::Tcp),
            EndpointKind::Tls => tls::dial_tls(endpoint, allow_self_signed_cert, timeout)
                .await
                .map(|stream| Self::Tls(Box::new(stream))),
            EndpointKind::Udp => network::dial_udp(&endpoint.address, endpoint.family, timeout)
                .await
                .map(Self::Udp),
            #[cfg(unix)]
            EndpointKind::Unix => network::dial_unix(&endpoint.address, timeout)
                .await
                .map(Self::Unix),
            #[cfg(unix)]
            EndpointKind::UnixDatagram => {
                network::dial_unix_datagram(&endpoint.address).map(Self::UnixDatagram)
            }
            #[cfg(not(unix))]
            EndpointKind::Unix | EndpointKind::UnixDatagram => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix domain sockets are not supported on this platform",
            )),
        }
    }

    /// Write the whole buffer and report how many bytes the transport took
    ///
    /// Stream transports keep writing until every byte is accepted, so a
    /// slow reader only delays the line. A count below `buf.len()` means the
    /// transport stopped accepting bytes and the handle must not be reused.
    pub async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            // tokio buffers file writes; flush so the error lands on this line
            Connection::File(file) => {
                let written = write_fully(file, buf).await?;
                file.flush().await?;
                Ok(written)
            }
            Connection::Tcp(stream) => write_fully(stream, buf).await,
            Connection::Tls(stream) => {
                let written = write_fully(stream, buf).await?;
                stream.flush().await?;
                Ok(written)
            }
            Connection::Udp(socket) => socket.send(buf).await,
            #[cfg(unix)]
            Connection::Unix(stream) => write_fully(stream, buf).await,
            #[cfg(unix)]
            Connection::UnixDatagram(socket) => socket.send(buf).await,
        }
    }

    /// Flush and shut the handle down
    pub async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Connection::File(file) => file.flush().await,
            Connection::Tcp(stream) => stream.shutdown().await,
            Connection::Tls(stream) => stream.shutdown().await,
            #[cfg(unix)]
            Connection::Unix(stream) => stream.shutdown().await,
            #[cfg(unix)]
            Connection::UnixDatagram(_) => Ok(()),
            Connection::Udp(_) => Ok(()),
        }
    }

    pub fn kind(&self) -> EndpointKind {
        match self {
            Connection::File(_) => EndpointKind::File,
            Connection::Tcp(_) => EndpointKind::Tcp,
            Connection::Tls(_) => EndpointKind::Tls,
            Connection::Udp(_) => EndpointKind::Udp,
            #[cfg(unix)]
            Connection::Unix(_) => EndpointKind::Unix,
            #[cfg(unix)]
            Connection::UnixDatagram(_) => EndpointKind::UnixDatagram,
        }
    }
}

/// Like `write_all`, but a stalled transport reports the bytes it did take
async fn write_fully<W>(writer: &mut W, buf: &[u8]) -> io::Result<usize>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]).await {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}
