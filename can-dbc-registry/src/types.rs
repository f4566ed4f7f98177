//! Core types for the DBC registry
//!
//! This module defines the identifiers shared by every part of the registry
//! (source ids and message ids) together with the error type and the
//! crate-wide `Result` alias.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a data source (usually a CAN channel / bus number)
pub type SourceId = u8;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Identity of a message instance on a given source
///
/// Ordering is by source first, then by address, so a `BTreeMap` keyed by
/// `MessageId` groups messages per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId {
    /// Source the message was seen on
    pub source: SourceId,
    /// CAN message ID (11-bit or 29-bit)
    pub address: u32,
}

impl MessageId {
    /// Create a new message id
    pub fn new(source: SourceId, address: u32) -> Self {
        Self { source, address }
    }

    /// Same address, tagged with a different source
    pub fn with_source(self, source: SourceId) -> Self {
        Self { source, ..self }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:X}", self.source, self.address)
    }
}

/// Errors that can occur while managing definition files
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Failed to parse DBC file: {0}")]
    DbcParseError(String),

    /// A mutation addressed a source that no binding covers. Callers must
    /// only mutate ids obtained through a successful lookup.
    #[error("No DBC file bound to source {0}")]
    NoDefinitionFile(SourceId),

    #[error("Invalid source set: {0}")]
    InvalidSourceSet(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
