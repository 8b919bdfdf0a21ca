use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::config::RecordKind;
use crate::error::SourceError;

/// Capability that yields the raw bytes of a dataset's spreadsheet. The
/// ingestion layer is agnostic to where they come from: local disk, an
/// uploaded buffer, or a blob store all fit behind this seam.
pub trait SheetSource: Send + Sync {
    fn read(&self, kind: RecordKind) -> Result<Vec<u8>, SourceError>;
}

/// Reads workbooks from the local filesystem.
pub struct FileSource {
    paths: HashMap<RecordKind, PathBuf>,
}

impl FileSource {
    pub fn new() -> Self {
        Self {
            paths: HashMap::new(),
        }
    }

    pub fn with_path(mut self, kind: RecordKind, path: impl AsRef<Path>) -> Self {
        self.paths.insert(kind, path.as_ref().to_path_buf());
        self
    }
}

impl Default for FileSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetSource for FileSource {
    fn read(&self, kind: RecordKind) -> Result<Vec<u8>, SourceError> {
        let path = self
            .paths
            .get(&kind)
            .ok_or_else(|| SourceError::UnknownDataset(kind.to_string()))?;

        std::fs::read(path).map_err(|e| SourceError::ReadFile {
            path: path.clone(),
            source: e,
        })
    }
}

/// Holds workbook bytes in memory. The upload handler stages a received
/// buffer here, then forces a refresh.
pub struct MemorySource {
    buffers: RwLock<HashMap<RecordKind, Vec<u8>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            buffers: RwLock::new(HashMap::new()),
        }
    }

    pub fn set(&self, kind: RecordKind, bytes: Vec<u8>) {
        let mut guard = match self.buffers.write() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Memory source lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard.insert(kind, bytes);
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl SheetSource for MemorySource {
    fn read(&self, kind: RecordKind) -> Result<Vec<u8>, SourceError> {
        let guard = match self.buffers.read() {
            Ok(g) => g,
            Err(poisoned) => {
                log::warn!("Memory source lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        guard
            .get(&kind)
            .cloned()
            .ok_or_else(|| SourceError::UnknownDataset(kind.to_string()))
    }
}
