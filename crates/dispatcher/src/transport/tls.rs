//! TLS over TCP
//!
//! Dial first, handshake only on a successful dial. A dial failure is
//! returned as is; a handshake failure is returned as the error and no
//! stream is kept.

use std::io;
use std::time::Duration;

use contracts::Endpoint;
use tokio::net::TcpStream;
use tokio_native_tls::{TlsConnector, TlsStream};
use tracing::{debug, instrument};

use super::network::{dial_tcp, with_timeout};

fn connector(allow_self_signed_cert: bool) -> io::Result<TlsConnector> {
    let mut builder = native_tls::TlsConnector::builder();
    if allow_self_signed_cert {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    builder
        .build()
        .map(TlsConnector::from)
        .map_err(io::Error::other)
}

#[instrument(
    name = "tls_dial",
    skip(endpoint, dial_timeout),
    fields(address = %endpoint.address, host = %endpoint.host)
)]
pub async fn dial_tls(
    endpoint: &Endpoint,
    allow_self_signed_cert: bool,
    dial_timeout: Duration,
) -> io::Result<TlsStream<TcpStream>> {
    let stream = dial_tcp(&endpoint.address, endpoint.family, dial_timeout).await?;
    let connector = connector(allow_self_signed_cert)?;

    let tls = with_timeout(dial_timeout, &endpoint.address, async {
        connector
            .connect(&endpoint.host, stream)
            .await
            .map_err(io::Error::other)
    })
    .await?;

    debug!("TLS handshake complete");
    Ok(tls)
}
