//! Checkpoint store configuration.

use serde::{Deserialize, Serialize};

/// Storage backend configuration for the checkpoint store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum StoreConfig {
    /// Local filesystem, rooted at a directory.
    #[cfg(feature = "fs")]
    Fs {
        /// Directory that holds run namespaces.
        root: String,
    },
    /// Volatile in-memory storage.
    #[cfg(feature = "memory")]
    Memory,
}

impl StoreConfig {
    /// Creates a filesystem configuration rooted at the given directory.
    #[cfg(feature = "fs")]
    pub fn fs(root: impl Into<String>) -> Self {
        Self::Fs { root: root.into() }
    }

    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            #[cfg(feature = "fs")]
            Self::Fs { .. } => "fs",
            #[cfg(feature = "memory")]
            Self::Memory => "memory",
        }
    }
}
