//! Persisted record types

use serde::{Deserialize, Serialize};
use thiserror::Error;
use wright_math::Transform;

/// Current record format version
pub const FORMAT_VERSION: u32 = 1;

/// Persistence errors
#[derive(Debug, Error)]
pub enum SaveError {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Deserialization error
    #[error("deserialization error: {0}")]
    Deserialization(String),
    /// Record written by a newer version
    #[error("record version {0} is newer than supported version {1}")]
    VersionMismatch(u32, u32),
    /// No stored assembly with that name
    #[error("no saved assembly named: {0}")]
    NotFound(String),
    /// A record entry references a template the library can't resolve
    #[error("record entry {index} references unknown part template: {template}")]
    UnknownTemplate { index: usize, template: String },
    /// A part payload failed to encode or decode
    #[error("payload error for part template {template}: {message}")]
    Payload { template: String, message: String },
}

/// One saved part: which template it came from, where it sits, and its
/// opaque internal state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub template: String,
    pub transform: Transform,
    pub payload: Vec<u8>,
}

/// A complete saved assembly.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssemblyRecord {
    pub version: u32,
    pub name: String,
    /// Parts in registration order
    pub parts: Vec<PartRecord>,
}

impl AssemblyRecord {
    /// Create an empty record at the current format version
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: FORMAT_VERSION,
            name: name.into(),
            parts: Vec::new(),
        }
    }
}
