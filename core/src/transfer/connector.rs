use std::io;

use async_trait::async_trait;
use otaflash_common::config::TransferConfig;
use otaflash_common::network::target::Target;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Opens the byte stream a session talks to a device over.
///
/// Every call must hand out a fresh stream; sessions never share one.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    async fn connect(&self, target: &Target) -> io::Result<Self::Stream>;

    /// Human readable endpoint for logs.
    fn endpoint(&self, target: &Target) -> String {
        target.to_string()
    }
}

/// Dials the device's OTA port over TCP.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnector {
    port: u16,
}

impl TcpConnector {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl From<&TransferConfig> for TcpConnector {
    fn from(cfg: &TransferConfig) -> Self {
        Self::new(cfg.port)
    }
}

#[async_trait]
impl Connector for TcpConnector {
    type Stream = TcpStream;

    async fn connect(&self, target: &Target) -> io::Result<TcpStream> {
        TcpStream::connect((target.as_str(), self.port)).await
    }

    fn endpoint(&self, target: &Target) -> String {
        format!("{}:{}", target, self.port)
    }
}
