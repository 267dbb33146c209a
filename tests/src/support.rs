//! Loopback stand-ins for real devices.

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use otaflash_common::network::target::Target;
use otaflash_core::transfer::Connector;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadBuf};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::task::JoinHandle;

/// How a mock device answers the `ota` command.
#[derive(Clone)]
pub enum Device {
    /// Sends `ACK\0` and records the upload.
    Healthy,
    /// Sends these bytes, then keeps reading.
    Answers(Vec<u8>),
    /// Sends these bytes, then hangs up.
    HangsUpAfter(Vec<u8>),
}

/// What a mock device saw on its single connection.
#[derive(Debug, Default)]
pub struct Received {
    pub command: Vec<u8>,
    pub payload: Vec<u8>,
}

pub struct MockOtaServer {
    pub addr: SocketAddr,
    handle: JoinHandle<Received>,
}

impl MockOtaServer {
    pub async fn start(device: Device) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Received::default();

            let mut command = [0u8; 3];
            if stream.read_exact(&mut command).await.is_err() {
                return received;
            }
            received.command = command.to_vec();

            match device {
                Device::Healthy => stream.write_all(b"ACK\0").await.unwrap(),
                Device::Answers(bytes) => stream.write_all(&bytes).await.unwrap(),
                Device::HangsUpAfter(bytes) => {
                    stream.write_all(&bytes).await.unwrap();
                    return received;
                }
            }

            let _ = stream.read_to_end(&mut received.payload).await;
            received
        });

        Self { addr, handle }
    }

    pub async fn received(self) -> Received {
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("mock device never finished")
            .unwrap()
    }
}

/// Routes each target name to its own loopback socket address.
#[derive(Default)]
pub struct RoutedConnector {
    routes: HashMap<Target, SocketAddr>,
    /// Sizes of every write a session made, per target.
    pub writes: Arc<Mutex<HashMap<Target, Vec<usize>>>>,
}

impl RoutedConnector {
    pub fn route(mut self, target: &str, addr: SocketAddr) -> Self {
        self.routes.insert(Target::new(target), addr);
        self
    }
}

#[async_trait]
impl Connector for RoutedConnector {
    type Stream = RecordingStream;

    async fn connect(&self, target: &Target) -> io::Result<RecordingStream> {
        let addr = self
            .routes
            .get(target)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no route"))?;
        let inner = TcpStream::connect(addr).await?;
        Ok(RecordingStream {
            inner,
            target: target.clone(),
            writes: Arc::clone(&self.writes),
        })
    }
}

/// TCP stream that logs the size of every successful write.
pub struct RecordingStream {
    inner: TcpStream,
    target: Target,
    writes: Arc<Mutex<HashMap<Target, Vec<usize>>>>,
}

impl AsyncRead for RecordingStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for RecordingStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let poll = Pin::new(&mut self.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = &poll {
            self.writes
                .lock()
                .unwrap()
                .entry(self.target.clone())
                .or_default()
                .push(*n);
        }
        poll
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// A UDP device that answers each `REQUEST IP` with `replies`.
pub async fn spawn_responder(replies: Vec<String>) -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 64];
        while let Ok((len, from)) = socket.recv_from(&mut buf).await {
            if &buf[..len] == b"REQUEST IP" {
                for reply in &replies {
                    let _ = socket.send_to(reply.as_bytes(), from).await;
                }
            }
        }
    });
    addr
}

pub fn random_image(len: usize) -> Vec<u8> {
    use rand::Rng;
    let mut bytes = vec![0u8; len];
    rand::rng().fill(&mut bytes[..]);
    bytes
}
