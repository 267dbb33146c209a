use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use otaflash_common::config::DiscoveryConfig;
use otaflash_common::network::broadcast;
use otaflash_core::discovery::{DiscoveryResponse, DiscoveryService};
use tokio::net::UdpSocket;

use crate::support::spawn_responder;

fn quick_config() -> DiscoveryConfig {
    DiscoveryConfig {
        recv_timeout: Duration::from_millis(250),
        ..DiscoveryConfig::default()
    }
}

async fn service_towards(destination: SocketAddr) -> anyhow::Result<DiscoveryService> {
    let bind: SocketAddr = "127.0.0.1:0".parse()?;
    Ok(DiscoveryService::bind_with_destination(bind, destination, quick_config()).await?)
}

fn payloads(responses: &[DiscoveryResponse]) -> Vec<String> {
    responses.iter().map(|r| r.payload.clone()).collect()
}

#[test]
fn broadcast_address_derivation() {
    assert_eq!(
        broadcast::class_c_broadcast(Ipv4Addr::new(192, 168, 1, 42)),
        Ipv4Addr::new(192, 168, 1, 255)
    );
}

#[tokio::test]
async fn consecutive_cycles_collect_independently() -> anyhow::Result<()> {
    let first = spawn_responder(vec!["10.1.1.2".into(), "10.1.1.3".into()]).await;
    let mut service = service_towards(first).await?;

    let cycle_one = service.probe_cycle().await?;
    let cycle_two = service.probe_cycle().await?;

    assert_eq!(payloads(&cycle_one), vec!["10.1.1.2", "10.1.1.3"]);
    assert_eq!(payloads(&cycle_two), vec!["10.1.1.2", "10.1.1.3"]);
    Ok(())
}

#[tokio::test]
async fn late_answer_does_not_leak_into_next_cycle() -> anyhow::Result<()> {
    let device = UdpSocket::bind("127.0.0.1:0").await?;
    let device_addr = device.local_addr()?;

    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        let mut probes = 0;
        while let Ok((_, from)) = device.recv_from(&mut buf).await {
            probes += 1;
            let _ = device.send_to(format!("on-time-{probes}").as_bytes(), from).await;
            if probes == 1 {
                // Arrives well after the first cycle has gone quiet.
                tokio::time::sleep(Duration::from_millis(600)).await;
                let _ = device.send_to(b"late", from).await;
            }
        }
    });

    let mut service = service_towards(device_addr).await?;

    let cycle_one = service.probe_cycle().await?;
    assert_eq!(payloads(&cycle_one), vec!["on-time-1"]);

    // Let the late datagram land in the socket buffer before the next probe.
    tokio::time::sleep(Duration::from_millis(700)).await;

    let cycle_two = service.probe_cycle().await?;
    assert_eq!(payloads(&cycle_two), vec!["on-time-2"]);
    Ok(())
}

#[tokio::test]
async fn identical_answers_from_several_devices_are_all_kept() -> anyhow::Result<()> {
    // Two devices share a destination only through separate sockets, so
    // point one service at a relay that fans the probe out.
    let device_a = spawn_responder(vec!["esp32".into()]).await;
    let device_b = spawn_responder(vec!["esp32".into()]).await;

    let relay = UdpSocket::bind("127.0.0.1:0").await?;
    let relay_addr = relay.local_addr()?;
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        if let Ok((len, client)) = relay.recv_from(&mut buf).await {
            let probe = buf[..len].to_vec();
            let mut answers = [0u8; 64];
            for device in [device_a, device_b] {
                let _ = relay.send_to(&probe, device).await;
                if let Ok((n, _)) = relay.recv_from(&mut answers).await {
                    let _ = relay.send_to(&answers[..n], client).await;
                }
            }
        }
    });

    let mut service = service_towards(relay_addr).await?;
    let responses = service.probe_cycle().await?;

    assert_eq!(payloads(&responses), vec!["esp32", "esp32"]);
    Ok(())
}
