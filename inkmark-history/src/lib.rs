//! inkmark-history: linear snapshot history for the annotation editor.
//!
//! Design rules:
//! - History is linear. Recording while the cursor is behind the end drops the redo branch.
//! - After every record the newest snapshot is current.
//! - Snapshots are opaque and immutable; the canvas owns their format.
//! - One history per editing session, owned by whoever owns the canvas. No globals.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

pub mod config;
pub mod store;

pub use config::{load_config, save_config, HistoryConfig, UndoBoundary, CONFIG_FILE_EXT};
pub use store::{History, RecordOutcome, Restore};

/// Opaque serialized capture of the whole canvas at one instant.
///
/// Cloning is cheap: the payload is shared, never copied.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(Arc<str>);

impl Snapshot {
    pub fn new(payload: impl Into<String>) -> Self {
        Snapshot(Arc::from(payload.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Snapshot {
    fn from(payload: String) -> Self {
        Snapshot::new(payload)
    }
}

impl From<&str> for Snapshot {
    fn from(payload: &str) -> Self {
        Snapshot(Arc::from(payload))
    }
}

impl AsRef<str> for Snapshot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Payloads can be large; keep debug output short.
impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot").field("bytes", &self.len()).finish()
    }
}

/// Errors related to history configuration and cursor movement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("max_states must be at least 1")]
    InvalidCapacity,

    #[error("position {position} is outside history of length {len}")]
    PositionOutOfRange { position: isize, len: usize },
}
