//! # Runtime Configuration
//!
//! Plain value types handed to the discovery and transfer layers. Nothing in
//! here is global: the CLI builds these from its flags and passes them down.

use std::time::Duration;

/// UDP port devices listen on for discovery probes.
pub const BROADCAST_PORT: u16 = 13333;
/// TCP port devices accept firmware uploads on.
pub const OTA_PORT: u16 = 12222;
/// Payload of a discovery probe.
pub const PROBE_MESSAGE: &[u8] = b"REQUEST IP";
/// How long a probe cycle waits for the next response before it ends.
pub const BROADCAST_RCV_TIMEOUT: Duration = Duration::from_millis(2_000);
/// Largest response datagram kept; anything longer is truncated.
pub const RECV_BUFFER_SIZE: usize = 2048;
/// Upper bound for a single firmware write.
pub const CHUNK_SIZE: usize = 4096;
/// Command that opens a transfer.
pub const OTA_COMMAND: &[u8; 3] = b"ota";
/// Acknowledgement a device must answer with before streaming starts.
pub const OTA_ACK: [u8; 4] = [b'A', b'C', b'K', 0x00];
/// Firmware file used when none is given on the command line.
pub const DEFAULT_FIRMWARE: &str = "esp32-firmware.bin";

pub struct Config {
    /// Each level strips more decoration from the output.
    pub quiet: u8,
    pub no_banner: bool,
    /// Raises the default log level (info, debug, trace).
    pub verbose: u8,
}

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub broadcast_port: u16,
    pub probe: Vec<u8>,
    /// Silence window that terminates the collection loop.
    pub recv_timeout: Duration,
    pub recv_buffer: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            broadcast_port: BROADCAST_PORT,
            probe: PROBE_MESSAGE.to_vec(),
            recv_timeout: BROADCAST_RCV_TIMEOUT,
            recv_buffer: RECV_BUFFER_SIZE,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TransferConfig {
    pub port: u16,
    pub chunk_size: usize,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            port: OTA_PORT,
            chunk_size: CHUNK_SIZE,
        }
    }
}
