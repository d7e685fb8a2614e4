//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置文件到目的地集合的完整链路
//! - 真实监听器上的 fan-out、重连与热重载
//! - 部分失败隔离

#[cfg(test)]
mod contract_tests {
    use contracts::{ConnectionStatus, LinkEvent};

    #[test]
    fn test_status_cycle() {
        let status = ConnectionStatus::NotConnected
            .on(LinkEvent::Dial)
            .on(LinkEvent::DialSucceeded);
        assert_eq!(status, ConnectionStatus::Connected);
        assert_eq!(
            status.on(LinkEvent::WriteFailed),
            ConnectionStatus::NotConnected
        );
    }
}

#[cfg(all(test, unix))]
mod e2e_tests {
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigLoader, FileConfigSource};
    use contracts::{ConnectionStatus, ContractError, Delivery, DestinationConfig, LineSink};
    use dispatcher::{
        create_coordinator, ConnectOptions, Destination, DestinationSet, Dispatcher,
        ReloadCoordinator,
    };
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, UdpSocket, UnixListener};
    use tokio::task::JoinHandle;

    fn options() -> ConnectOptions {
        ConnectOptions {
            dial_timeout: Duration::from_secs(2),
        }
    }

    async fn tcp_listener() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("tcp://{}", listener.local_addr().unwrap());
        (listener, url)
    }

    /// Accept one TCP peer and read until it closes
    fn collect_tcp(listener: TcpListener) -> JoinHandle<Vec<u8>> {
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        })
    }

    fn collect_unix(listener: UnixListener) -> JoinHandle<Vec<u8>> {
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            socket.read_to_end(&mut received).await.unwrap();
            received
        })
    }

    fn write_config(path: &Path, destinations: &[DestinationConfig]) {
        let config = contracts::MuxConfig {
            destinations: destinations.to_vec(),
        };
        std::fs::write(path, ConfigLoader::to_json(&config).unwrap()).unwrap();
    }

    /// End-to-end test: config file -> DestinationSet -> Dispatcher
    ///
    /// 验证完整的数据流：
    /// 1. 从 JSON 配置构建 TCP 与 Unix 目的地
    /// 2. Dispatcher 读取 10 行输入
    /// 3. 每个监听器按顺序收到带前缀的全部行
    #[tokio::test]
    async fn test_e2e_tcp_and_unix_fanout() {
        let dir = tempfile::tempdir().unwrap();
        let socket_path = dir.path().join("collector.sock");
        let unix = UnixListener::bind(&socket_path).unwrap();
        let (tcp, tcp_url) = tcp_listener().await;

        let config_path = dir.path().join("logmux.json");
        std::fs::write(
            &config_path,
            format!(
                r#"[
                    {{"url": "{tcp_url}", "prefix": "tcp - "}},
                    {{"url": "unix://{}", "prefix": "unix - "}}
                ]"#,
                socket_path.display()
            ),
        )
        .unwrap();

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let coordinator = create_coordinator(config.destinations, options())
            .await
            .unwrap();
        assert!(coordinator
            .statuses()
            .await
            .iter()
            .all(|(_, status)| *status == ConnectionStatus::Connected));

        let tcp_rx = collect_tcp(tcp);
        let unix_rx = collect_unix(unix);

        let input: String = (0..10)
            .map(|i| format!("Lorem ipsum dolor sit amet {i}\n"))
            .collect();
        let stats = Dispatcher::new(input.as_bytes(), coordinator)
            .run()
            .await
            .unwrap();
        assert_eq!(stats.lines, 10);
        assert_eq!(stats.destination_errors, 0);

        let expected = |prefix: &str| -> Vec<u8> {
            (0..10)
                .map(|i| format!("{prefix}Lorem ipsum dolor sit amet {i}\n"))
                .collect::<String>()
                .into_bytes()
        };
        assert_eq!(tcp_rx.await.unwrap(), expected("tcp - "));
        assert_eq!(unix_rx.await.unwrap(), expected("unix - "));
    }

    #[tokio::test]
    async fn test_e2e_udp_destination() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let url = format!("udp://{}", receiver.local_addr().unwrap());

        let coordinator = create_coordinator(
            vec![DestinationConfig::new(url).with_prefix("udp - ")],
            options(),
        )
        .await
        .unwrap();
        assert!(coordinator.write_line(b"datagram\n").await.is_empty());

        let mut buf = [0u8; 128];
        let n = receiver.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"udp - datagram\n");
        coordinator.shutdown().await;
    }

    #[tokio::test]
    async fn test_e2e_file_destination_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("copy.log");
        let coordinator = create_coordinator(
            vec![DestinationConfig::new(format!("file://{}", path.display()))],
            options(),
        )
        .await
        .unwrap();

        let input: &[u8] = b"one\ntwo\n";
        Dispatcher::new(input, coordinator).run().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_partial_failure_returns_one_error() {
        let dir = tempfile::tempdir().unwrap();
        let (tcp, tcp_url) = tcp_listener().await;
        let set = DestinationSet::connect(
            vec![
                DestinationConfig::new(format!(
                    "unix://{}",
                    dir.path().join("missing.sock").display()
                )),
                DestinationConfig::new(tcp_url),
            ],
            &options(),
        )
        .await
        .unwrap();
        let received = collect_tcp(tcp);

        let errors = set.write_all(b"survives\n").await;
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ContractError::Connect { .. }));

        set.close_all().await;
        assert_eq!(received.await.unwrap(), b"survives\n");
    }

    #[tokio::test]
    async fn test_reconnect_after_peer_appears() {
        let (listener, url) = tcp_listener().await;
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut destination =
            Destination::with_options(DestinationConfig::new(url).with_prefix("tcp - "), options())
                .await
                .unwrap();
        assert_eq!(destination.status(), ConnectionStatus::NotConnected);

        let listener = TcpListener::bind(addr).await.unwrap();
        let received = collect_tcp(listener);

        assert_eq!(
            destination.write(b"skipped\n").await.unwrap(),
            Delivery::Reconnected
        );
        assert_eq!(destination.status(), ConnectionStatus::Connected);
        destination.write(b"delivered\n").await.unwrap();
        destination.close().await.unwrap();

        assert_eq!(received.await.unwrap(), b"tcp - delivered\n");
    }

    #[tokio::test]
    async fn test_reload_with_invalid_file_keeps_active_set() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("logmux.json");
        let (tcp, tcp_url) = tcp_listener().await;
        write_config(&config_path, &[DestinationConfig::new(tcp_url.clone())]);

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let coordinator = create_coordinator(config.destinations, options())
            .await
            .unwrap();
        let received = collect_tcp(tcp);
        let before = coordinator.statuses().await;

        std::fs::write(&config_path, "{ not json").unwrap();
        let source = FileConfigSource::new(&config_path);
        let err = coordinator.trigger_reload(&source).await.unwrap_err();
        assert!(err.is_config());

        std::fs::write(&config_path, r#"[{"url": "tcp://no-port-here"}]"#).unwrap();
        assert!(coordinator.trigger_reload(&source).await.is_err());

        assert_eq!(coordinator.generation(), 0);
        assert_eq!(coordinator.statuses().await, before);
        assert!(coordinator.write_line(b"still flowing\n").await.is_empty());

        coordinator.shutdown().await;
        assert_eq!(received.await.unwrap(), b"still flowing\n");
    }

    #[tokio::test]
    async fn test_reload_with_valid_file_swaps_destinations() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("logmux.json");
        let (old, old_url) = tcp_listener().await;
        let (new, new_url) = tcp_listener().await;
        write_config(
            &config_path,
            &[DestinationConfig::new(old_url).with_prefix("old ")],
        );

        let config = ConfigLoader::load_from_path(&config_path).unwrap();
        let coordinator: Arc<ReloadCoordinator> = create_coordinator(config.destinations, options())
            .await
            .unwrap();
        let old_rx = collect_tcp(old);
        coordinator.write_line(b"first\n").await;

        write_config(
            &config_path,
            &[DestinationConfig::new(new_url).with_prefix("new ")],
        );
        let count = coordinator
            .trigger_reload(&FileConfigSource::new(&config_path))
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(coordinator.generation(), 1);

        // Old destination was closed by the swap
        assert_eq!(old_rx.await.unwrap(), b"old first\n");

        let new_rx = collect_tcp(new);
        coordinator.write_line(b"second\n").await;
        coordinator.shutdown().await;
        assert_eq!(new_rx.await.unwrap(), b"new second\n");
    }
}
