//! Destination - one outbound connection with its prefix and status
//!
//! Reconnects lazily: a write while disconnected skips its line and makes
//! exactly one connect attempt, so the next line is the first one eligible
//! for delivery. There is no background retry.

use std::io;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use contracts::{
    ConnectionStatus, ContractError, Delivery, DestinationConfig, Endpoint, LineSink, LinkEvent,
};
use observability::{record_line_delivered, record_reconnect};
use tracing::{debug, info, instrument, trace, warn};

use crate::metrics::DestinationMetrics;
use crate::transport::{ConnectOptions, Connection};

/// A configured output target
pub struct Destination {
    name: String,
    config: DestinationConfig,
    endpoint: Endpoint,
    options: ConnectOptions,
    status: ConnectionStatus,
    connection: Option<Connection>,
    metrics: Arc<DestinationMetrics>,
}

impl Destination {
    /// Parse the endpoint and make the initial connection attempt
    ///
    /// A failed initial connect is logged and leaves the destination
    /// `NotConnected`; only an unparseable URL is an error.
    pub async fn new(config: DestinationConfig) -> Result<Self, ContractError> {
        Self::with_options(config, ConnectOptions::default()).await
    }

    /// Same as [`Destination::new`] with explicit connect options
    pub async fn with_options(
        config: DestinationConfig,
        options: ConnectOptions,
    ) -> Result<Self, ContractError> {
        let endpoint = config.endpoint()?;
        Ok(Self::from_endpoint(config, endpoint, options).await)
    }

    /// Build from an already parsed endpoint and dial once
    pub async fn from_endpoint(
        config: DestinationConfig,
        endpoint: Endpoint,
        options: ConnectOptions,
    ) -> Self {
        let mut destination = Self {
            name: config.url.clone(),
            config,
            endpoint,
            options,
            status: ConnectionStatus::NotConnected,
            connection: None,
            metrics: Arc::new(DestinationMetrics::new()),
        };

        if let Err(e) = destination.try_connect().await {
            warn!(destination = %destination.name, error = %e, "Initial connect failed");
        }
        destination
    }

    pub fn config(&self) -> &DestinationConfig {
        &self.config
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn metrics(&self) -> &Arc<DestinationMetrics> {
        &self.metrics
    }

    /// Dial and update the status from the outcome
    ///
    /// # Errors
    /// The transport error when the attempt fails, or `DestinationClosed`
    /// after [`LineSink::close`].
    #[instrument(
        name = "destination_try_connect",
        skip(self),
        fields(destination = %self.name, kind = %self.endpoint.kind)
    )]
    pub async fn try_connect(&mut self) -> Result<(), ContractError> {
        if self.status == ConnectionStatus::Closed {
            return Err(ContractError::DestinationClosed {
                destination: self.name.clone(),
            });
        }

        self.transition(LinkEvent::Dial);
        self.metrics.inc_connect_attempts();
        let result = self.connect().await;

        let success = result.is_ok();
        self.transition(if success {
            LinkEvent::DialSucceeded
        } else {
            LinkEvent::DialFailed
        });
        record_reconnect(&self.name, success);

        if success {
            info!(destination = %self.name, "Destination connected");
        }
        result
    }

    /// Open the transport; the handle is stored only on success
    async fn connect(&mut self) -> Result<(), ContractError> {
        let connection = Connection::open(
            &self.endpoint,
            self.config.allow_self_signed_cert,
            &self.options,
        )
        .await
        .map_err(|e| ContractError::connect(&self.name, e))?;

        debug!(destination = %self.name, kind = %connection.kind(), "Transport opened");
        self.connection = Some(connection);
        Ok(())
    }

    async fn write_connected(&mut self, line: &[u8]) -> Result<Delivery, ContractError> {
        let payload = self.frame(line);

        let Some(connection) = self.connection.as_mut() else {
            self.fail_write();
            return Err(ContractError::write(
                &self.name,
                io::Error::new(io::ErrorKind::NotConnected, "no open handle"),
            ));
        };

        match connection.write(&payload).await {
            Ok(written) if written == payload.len() => {
                self.metrics.inc_write_count();
                record_line_delivered(&self.name, true);
                Ok(Delivery::Written(written))
            }
            Ok(written) => {
                // Partial line on the wire, the handle cannot be reused
                self.fail_write();
                warn!(
                    destination = %self.name,
                    written,
                    expected = payload.len(),
                    "Short write, destination disconnected"
                );
                Err(ContractError::short_write(&self.name, written, payload.len()))
            }
            Err(e) => {
                self.fail_write();
                warn!(destination = %self.name, error = %e, "Write failed, destination disconnected");
                Err(ContractError::write(&self.name, e))
            }
        }
    }

    fn fail_write(&mut self) {
        self.metrics.inc_failure_count();
        record_line_delivered(&self.name, false);
        self.connection = None;
        self.transition(LinkEvent::WriteFailed);
    }

    fn frame(&self, line: &[u8]) -> BytesMut {
        let prefix = self.config.prefix.as_bytes();
        let mut payload = BytesMut::with_capacity(prefix.len() + line.len());
        payload.put_slice(prefix);
        payload.put_slice(line);
        payload
    }

    fn transition(&mut self, event: LinkEvent) {
        let next = self.status.on(event);
        if next != self.status {
            trace!(destination = %self.name, from = %self.status, to = %next, "Status changed");
        }
        self.status = next;
    }
}

impl LineSink for Destination {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> ConnectionStatus {
        self.status
    }

    async fn write(&mut self, line: &[u8]) -> Result<Delivery, ContractError> {
        if self.status.accepts_writes() {
            return self.write_connected(line).await;
        }
        if self.status.wants_reconnect() {
            self.metrics.inc_dropped_count();
            self.try_connect().await?;
            return Ok(Delivery::Reconnected);
        }
        Err(ContractError::DestinationClosed {
            destination: self.name.clone(),
        })
    }

    #[instrument(name = "destination_close", skip(self), fields(destination = %self.name))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.transition(LinkEvent::Close);
        if let Some(mut connection) = self.connection.take() {
            if let Err(e) = connection.shutdown().await {
                debug!(error = %e, "Shutdown error ignored");
            }
        }
        debug!("Destination closed");
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, UnixListener};

    const LOG_LINE: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit.";

    fn unix_url(path: &Path) -> String {
        format!("unix://{}", path.display())
    }

    fn fast_options() -> ConnectOptions {
        ConnectOptions {
            dial_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_fresh_destination_without_peer_is_not_connected() {
        let dir = tempdir().unwrap();
        let config = DestinationConfig::new(unix_url(&dir.path().join("absent")));

        let destination = Destination::with_options(config, fast_options()).await.unwrap();
        assert_eq!(destination.status(), ConnectionStatus::NotConnected);
        assert_eq!(destination.metrics().connect_attempts(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_url_is_rejected() {
        let result = Destination::new(DestinationConfig::new("nope://")).await;
        assert!(matches!(result, Err(ContractError::ConfigValidation { .. })));
    }

    #[tokio::test]
    async fn test_write_delivers_prefix_and_line() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config =
            DestinationConfig::new(format!("tcp://127.0.0.1:{port}")).with_prefix("tcp - ");

        let mut destination = Destination::with_options(config, fast_options()).await.unwrap();
        assert_eq!(destination.status(), ConnectionStatus::Connected);
        let (mut peer, _) = listener.accept().await.unwrap();

        let line = format!("{LOG_LINE}\n");
        let delivery = destination.write(line.as_bytes()).await.unwrap();
        assert_eq!(delivery, Delivery::Written("tcp - ".len() + line.len()));
        destination.close().await.unwrap();

        let mut received = String::new();
        peer.read_to_string(&mut received).await.unwrap();
        assert!(received.starts_with("tcp - "));
        assert!(received.ends_with(&line));
    }

    #[tokio::test]
    async fn test_large_line_reaches_late_reader_intact() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let config =
            DestinationConfig::new(format!("tcp://127.0.0.1:{port}")).with_prefix("tcp - ");
        let mut destination = Destination::with_options(config, fast_options()).await.unwrap();

        // Peer starts draining only after the socket buffers are full
        let reader = tokio::spawn(async move {
            let (mut peer, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_millis(200)).await;
            let mut received = Vec::new();
            peer.read_to_end(&mut received).await.unwrap();
            received
        });

        let mut line = vec![b'x'; 16 * 1024 * 1024];
        line.push(b'\n');
        let delivery = destination.write(&line).await.unwrap();
        assert_eq!(delivery, Delivery::Written("tcp - ".len() + line.len()));
        assert_eq!(destination.status(), ConnectionStatus::Connected);

        destination.write(b"next\n").await.unwrap();
        destination.close().await.unwrap();

        let received = reader.await.unwrap();
        let mut expected = b"tcp - ".to_vec();
        expected.extend_from_slice(&line);
        expected.extend_from_slice(b"tcp - next\n");
        assert_eq!(received.len(), expected.len());
        assert!(received == expected);
    }

    #[tokio::test]
    async fn test_lazy_reconnect_skips_one_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("late.sock");
        let config = DestinationConfig::new(unix_url(&path)).with_prefix("unix - ");

        let mut destination = Destination::with_options(config, fast_options()).await.unwrap();
        assert_eq!(destination.status(), ConnectionStatus::NotConnected);

        // Still unreachable: exactly one more attempt, error returned
        let err = destination.write(b"lost\n").await.unwrap_err();
        assert!(matches!(err, ContractError::Connect { .. }));
        assert_eq!(destination.metrics().connect_attempts(), 2);

        let listener = UnixListener::bind(&path).unwrap();

        // Reconnects but does not send this line
        let delivery = destination.write(b"skipped\n").await.unwrap();
        assert_eq!(delivery, Delivery::Reconnected);
        assert_eq!(destination.status(), ConnectionStatus::Connected);
        assert_eq!(destination.metrics().connect_attempts(), 3);

        destination.write(b"delivered\n").await.unwrap();
        destination.close().await.unwrap();

        let (mut peer, _) = listener.accept().await.unwrap();
        let mut received = Vec::new();
        peer.read_to_end(&mut received).await.unwrap();
        assert_eq!(received, b"unix - delivered\n");
        assert_eq!(destination.metrics().dropped_count(), 2);
    }

    #[tokio::test]
    async fn test_write_error_downgrades_status() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.sock");
        let listener = UnixListener::bind(&path).unwrap();

        let mut destination =
            Destination::with_options(DestinationConfig::new(unix_url(&path)), fast_options())
                .await
                .unwrap();
        let (peer, _) = listener.accept().await.unwrap();
        drop(peer);
        drop(listener);

        let mut failure = None;
        for _ in 0..50 {
            if let Err(e) = destination.write(b"into the void\n").await {
                failure = Some(e);
                break;
            }
        }

        assert!(matches!(failure, Some(ContractError::Write { .. })));
        assert_eq!(destination.status(), ConnectionStatus::NotConnected);
        assert_eq!(destination.metrics().failure_count(), 1);
    }

    #[tokio::test]
    async fn test_file_destination_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("copy.log");
        let config =
            DestinationConfig::new(format!("file://{}", path.display())).with_prefix("file - ");

        let mut destination = Destination::new(config).await.unwrap();
        assert_eq!(destination.status(), ConnectionStatus::Connected);

        for i in 0..3 {
            destination
                .write(format!("line {i}\n").as_bytes())
                .await
                .unwrap();
        }
        destination.close().await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "file - line 0\nfile - line 1\nfile - line 2\n");
    }

    #[tokio::test]
    async fn test_tls_handshake_failure_keeps_no_handle() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let config =
            DestinationConfig::new(format!("tls://127.0.0.1:{port}")).allow_self_signed(true);
        let destination = Destination::with_options(config, fast_options()).await.unwrap();

        assert_eq!(destination.status(), ConnectionStatus::NotConnected);
        assert!(destination.connection.is_none());
        server.await.unwrap();
    }

    /// Self-signed `localhost`/`127.0.0.1` identity
    fn tls_acceptor() -> tokio_native_tls::TlsAcceptor {
        let identity = native_tls::Identity::from_pkcs8(
            include_bytes!("transport/testdata/cert.pem"),
            include_bytes!("transport/testdata/key.pem"),
        )
        .unwrap();
        native_tls::TlsAcceptor::new(identity).unwrap().into()
    }

    #[tokio::test]
    async fn test_tls_self_signed_peer_receives_prefixed_line() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let acceptor = tls_acceptor();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut stream = acceptor.accept(socket).await.unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            received
        });

        let config = DestinationConfig::new(format!("tls://127.0.0.1:{port}"))
            .with_prefix("tls - ")
            .allow_self_signed(true);
        let mut destination = Destination::with_options(config, fast_options()).await.unwrap();
        assert_eq!(destination.status(), ConnectionStatus::Connected);

        let line = format!("{LOG_LINE}\n");
        let delivery = destination.write(line.as_bytes()).await.unwrap();
        assert_eq!(delivery, Delivery::Written("tls - ".len() + line.len()));
        destination.close().await.unwrap();

        assert_eq!(server.await.unwrap(), format!("tls - {line}").into_bytes());
    }

    #[tokio::test]
    async fn test_tls_self_signed_peer_rejected_without_opt_in() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let acceptor = tls_acceptor();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            acceptor.accept(socket).await.is_err()
        });

        let config = DestinationConfig::new(format!("tls://127.0.0.1:{port}"))
            .with_prefix("tls - ");
        let destination = Destination::with_options(config, fast_options()).await.unwrap();

        assert_eq!(destination.status(), ConnectionStatus::NotConnected);
        assert!(destination.connection.is_none());
        assert!(server.await.unwrap());
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_final() {
        let dir = tempdir().unwrap();
        let config = DestinationConfig::new(unix_url(&dir.path().join("never")));
        let mut destination = Destination::with_options(config, fast_options()).await.unwrap();

        destination.close().await.unwrap();
        destination.close().await.unwrap();
        assert_eq!(destination.status(), ConnectionStatus::Closed);

        let attempts = destination.metrics().connect_attempts();
        let err = destination.write(b"after close\n").await.unwrap_err();
        assert!(matches!(err, ContractError::DestinationClosed { .. }));
        assert_eq!(destination.metrics().connect_attempts(), attempts);
    }
}
