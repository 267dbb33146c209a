use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::FirmwareError;

/// A firmware image held fully in memory.
///
/// Cloning only bumps a reference count; every transfer session reads the
/// same bytes and nothing can mutate them once loaded.
#[derive(Debug, Clone)]
pub struct Firmware {
    bytes: Arc<[u8]>,
}

impl Firmware {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, FirmwareError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| FirmwareError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        info!("Loaded {} bytes of firmware from {}", bytes.len(), path.display());
        Ok(Self::from_bytes(bytes))
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
