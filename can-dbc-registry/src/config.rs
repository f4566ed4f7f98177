//! Registry configuration types
//!
//! Only behaviour that callers may reasonably want to tune lives here; the
//! resolution and merge rules themselves are fixed.

use crate::sources::SourceSet;
use crate::types::SourceId;
use serde::{Deserialize, Serialize};

/// Configuration for the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Emit `FileSetChanged` from `close_all` even when nothing was open
    #[serde(default = "default_true")]
    pub notify_on_empty_close: bool,

    /// Sources considered active when the registry is created; these are
    /// the targets of an ALL binding
    #[serde(default)]
    pub active_sources: Vec<SourceId>,
}

fn default_true() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            notify_on_empty_close: true,
            active_sources: Vec::new(),
        }
    }
}

impl RegistryConfig {
    /// Create a new configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: emit (or suppress) `FileSetChanged` on an empty close
    pub fn with_empty_close_notification(mut self, enabled: bool) -> Self {
        self.notify_on_empty_close = enabled;
        self
    }

    /// Builder method: set the initially active sources
    pub fn with_active_sources(mut self, sources: Vec<SourceId>) -> Self {
        self.active_sources = sources;
        self
    }

    /// Initially active sources as a set
    pub fn active_source_set(&self) -> SourceSet {
        self.active_sources.iter().copied().collect()
    }
}
