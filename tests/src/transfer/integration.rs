use std::time::Duration;

use otaflash_common::config::TransferConfig;
use otaflash_common::network::target::{Target, TargetSet};
use otaflash_core::error::{HandshakeFailure, OrchestratorError, SessionError};
use otaflash_core::firmware::Firmware;
use otaflash_core::transfer::{
    Orchestrator, TcpConnector, TransferEvent, TransferOutcome, TransferSession, event_channel,
};

use crate::support::{Device, MockOtaServer, RoutedConnector, random_image};

fn set(names: &[&str]) -> TargetSet {
    names.iter().map(|n| Target::new(*n)).collect()
}

#[tokio::test]
async fn chunks_reassemble_to_the_image() {
    let server = MockOtaServer::start(Device::Healthy).await;
    let connector = RoutedConnector::default().route("device", server.addr);
    let writes = connector.writes.clone();

    let image = random_image(3 * 4096 + 123);
    let firmware = Firmware::from_bytes(image.clone());
    let session = TransferSession::new(Target::new("device"), firmware, 4096, None);

    let report = session.run(&connector).await;
    let received = server.received().await;

    assert_eq!(report.outcome, TransferOutcome::Success);
    assert_eq!(received.command, b"ota");
    assert_eq!(received.payload, image);

    let sizes = writes.lock().unwrap().remove(&Target::new("device")).unwrap();
    // First write is the 3-byte command, the rest is firmware.
    assert_eq!(sizes[0], 3);
    assert!(sizes[1..].iter().all(|&n| n > 0 && n <= 4096));
    assert_eq!(sizes[1..].iter().sum::<usize>(), image.len());
}

#[tokio::test]
async fn every_wrong_acknowledgement_is_rejected() {
    let bad_acks: [&[u8]; 4] = [b"ACK1", b"ack\0", b"\0KCA", b"NAK\0"];

    for ack in bad_acks {
        let server = MockOtaServer::start(Device::Answers(ack.to_vec())).await;
        let connector = RoutedConnector::default().route("device", server.addr);
        let session =
            TransferSession::new(Target::new("device"), Firmware::from_bytes(random_image(5000)), 4096, None);

        let report = session.run(&connector).await;
        let received = server.received().await;

        assert_eq!(report.outcome, TransferOutcome::HandshakeFailed, "ack {ack:?}");
        assert!(received.payload.is_empty(), "ack {ack:?} let firmware through");
    }
}

#[tokio::test]
async fn hang_up_during_acknowledgement_is_handshake_failure() {
    for partial in [Vec::new(), b"A".to_vec(), b"ACK".to_vec()] {
        let expected = partial.len();
        let server = MockOtaServer::start(Device::HangsUpAfter(partial)).await;
        let connector = RoutedConnector::default().route("device", server.addr);
        let session =
            TransferSession::new(Target::new("device"), Firmware::from_bytes(vec![1u8; 100]), 4096, None);

        let report = session.run(&connector).await;
        server.received().await;

        assert_eq!(report.outcome, TransferOutcome::HandshakeFailed);
        match report.error {
            Some(SessionError::Handshake(HandshakeFailure::ShortRead { received })) => {
                assert_eq!(received, expected)
            }
            // A reset can surface as a read error instead of a clean EOF.
            Some(SessionError::Handshake(HandshakeFailure::Read(_))) => {}
            other => panic!("unexpected error {other:?}"),
        }
    }
}

#[tokio::test]
async fn failing_target_does_not_disturb_sibling() {
    let broken = MockOtaServer::start(Device::Answers(b"NO!\0".to_vec())).await;
    let healthy = MockOtaServer::start(Device::Healthy).await;
    let connector = RoutedConnector::default()
        .route("t1", broken.addr)
        .route("t2", healthy.addr);

    let image = random_image(20_000);
    let firmware = Firmware::from_bytes(image.clone());
    let orchestrator = Orchestrator::new(connector, TransferConfig::default());
    let (tx, mut rx) = event_channel();

    let summary = tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.run(set(&["t1", "t2"]), &firmware, Some(tx)),
    )
    .await
    .expect("orchestrator hung")
    .unwrap();

    assert_eq!(summary.outcome(&Target::new("t1")), Some(TransferOutcome::HandshakeFailed));
    assert_eq!(summary.outcome(&Target::new("t2")), Some(TransferOutcome::Success));
    assert_eq!(healthy.received().await.payload, image);
    assert!(broken.received().await.payload.is_empty());

    let mut t2_progress = Vec::new();
    while let Some(event) = rx.recv().await {
        if let TransferEvent::Progress { target, bytes_sent, total_bytes } = event {
            assert_eq!(target.as_str(), "t2");
            assert_eq!(total_bytes, 20_000);
            t2_progress.push(bytes_sent);
        }
    }
    assert_eq!(t2_progress, vec![4096, 8192, 12_288, 16_384, 20_000]);
}

#[tokio::test]
async fn unreachable_target_is_connect_failed() {
    // Reserve a port, then free it so the connection is refused.
    let port = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let orchestrator = Orchestrator::new(
        TcpConnector::new(port),
        TransferConfig {
            port,
            ..TransferConfig::default()
        },
    );

    let summary = orchestrator
        .run(set(&["127.0.0.1"]), &Firmware::from_bytes(vec![0u8; 64]), None)
        .await
        .unwrap();

    let report = summary.get(&Target::new("127.0.0.1")).unwrap();
    assert_eq!(report.outcome, TransferOutcome::ConnectFailed);
    assert_eq!(report.bytes_sent, 0);
}

#[tokio::test]
async fn no_targets_is_fatal() {
    let connector = RoutedConnector::default();
    let writes = connector.writes.clone();
    let orchestrator = Orchestrator::new(connector, TransferConfig::default());

    let result = orchestrator
        .run(TargetSet::new(), &Firmware::from_bytes(vec![0u8; 64]), None)
        .await;

    assert!(matches!(result, Err(OrchestratorError::NoTargets)));
    assert!(writes.lock().unwrap().is_empty());
}
