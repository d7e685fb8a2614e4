//! Socket transports: TCP, UDP and Unix domain sockets

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use contracts::AddressFamily;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
#[cfg(unix)]
use tokio::net::{UnixDatagram, UnixStream};
use tracing::{debug, instrument};

/// Run a dial future under a deadline, mapping expiry to `TimedOut`
pub async fn with_timeout<T, F>(limit: Duration, target: &str, dial: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(limit, dial).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connecting to {target} timed out after {limit:?}"),
        )),
    }
}

/// Dial the first reachable resolved address of `family`
///
/// The deadline covers resolution and every connect attempt.
#[instrument(name = "network_dial_tcp", skip(dial_timeout))]
pub async fn dial_tcp(
    address: &str,
    family: AddressFamily,
    dial_timeout: Duration,
) -> io::Result<TcpStream> {
    let stream = with_timeout(dial_timeout, address, async {
        let mut last_error = None;
        for target in resolve(address, family).await? {
            match TcpStream::connect(target).await {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    debug!(%target, error = %e, "TCP connect attempt failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| no_address(address, family)))
    })
    .await?;
    stream.set_nodelay(true)?;
    debug!(peer = ?stream.peer_addr().ok(), "TCP connected");
    Ok(stream)
}

#[instrument(name = "network_dial_udp", skip(dial_timeout))]
pub async fn dial_udp(
    address: &str,
    family: AddressFamily,
    dial_timeout: Duration,
) -> io::Result<UdpSocket> {
    let candidates = with_timeout(dial_timeout, address, resolve(address, family)).await?;
    let target = candidates
        .into_iter()
        .next()
        .ok_or_else(|| no_address(address, family))?;

    // Bind to any available port of the matching family
    let local: SocketAddr = if target.is_ipv6() {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(target).await?;
    debug!(%target, "UDP socket connected");
    Ok(socket)
}

#[cfg(unix)]
#[instrument(name = "network_dial_unix", skip(dial_timeout))]
pub async fn dial_unix(path: &str, dial_timeout: Duration) -> io::Result<UnixStream> {
    let stream = with_timeout(dial_timeout, path, UnixStream::connect(path)).await?;
    debug!("Unix socket connected");
    Ok(stream)
}

#[cfg(unix)]
pub fn dial_unix_datagram(path: &str) -> io::Result<UnixDatagram> {
    let socket = UnixDatagram::unbound()?;
    socket.connect(path)?;
    debug!(path, "Unix datagram socket connected");
    Ok(socket)
}

/// Resolved addresses of `family`, in resolver order
async fn resolve(address: &str, family: AddressFamily) -> io::Result<Vec<SocketAddr>> {
    let candidates: Vec<SocketAddr> = lookup_host(address)
        .await?
        .filter(|addr| family.admits(addr))
        .collect();
    if candidates.is_empty() {
        return Err(no_address(address, family));
    }
    Ok(candidates)
}

fn no_address(address: &str, family: AddressFamily) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no {family} address found for {address}"),
    )
}
