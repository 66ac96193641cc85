// ============================================================================
// audex-core/src/artifacts.rs
// ============================================================================
//
// ARTIFACT STORE: Transient Handles to Extracted Audio
//
// Extracted bytes are kept in memory behind opaque `artifact:<n>` handles.
// A handle stays usable until it is revoked; the session revokes every
// handle of a batch before replacing it.

use crate::engine::lock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

const HANDLE_PREFIX: &str = "artifact:";

/// Opaque reference to an in-memory blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactHandle(String);

impl ArtifactHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ArtifactBlob {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Holds artifact blobs until their handles are revoked.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    next: AtomicU64,
    blobs: Mutex<HashMap<ArtifactHandle, Arc<ArtifactBlob>>>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, data: Vec<u8>, mime_type: &str) -> ArtifactHandle {
        let id = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = ArtifactHandle(format!("{HANDLE_PREFIX}{id}"));
        lock(&self.blobs).insert(
            handle.clone(),
            Arc::new(ArtifactBlob {
                data,
                mime_type: mime_type.to_string(),
            }),
        );
        handle
    }

    /// `None` once the handle has been revoked.
    pub fn open(&self, handle: &ArtifactHandle) -> Option<Arc<ArtifactBlob>> {
        lock(&self.blobs).get(handle).cloned()
    }

    /// Returns whether the handle was still live.
    pub fn revoke(&self, handle: &ArtifactHandle) -> bool {
        lock(&self.blobs).remove(handle).is_some()
    }

    pub fn live_count(&self) -> usize {
        lock(&self.blobs).len()
    }
}

/// An extracted track as presented to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArtifact {
    /// Output file name inside the engine workspace.
    pub display_name: String,
    /// One-based number derived from the global stream index.
    pub track_number: u32,
    pub handle: ArtifactHandle,
    pub label: String,
    pub stream_index: u32,
    pub size: usize,
    pub mime_type: String,
}
