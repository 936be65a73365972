use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use uuid::Uuid;

use crate::models::booking::LOCAL_ID_PREFIX;
use crate::models::{LocalBooking, NewBooking};

/// Process-local booking log used while the authoritative store is down.
///
/// Entries here are not coordinated with any other client and are never
/// consulted for availability.
pub struct LocalFallbackStore {
    path: Option<PathBuf>,
    entries: Mutex<Vec<LocalBooking>>,
}

impl LocalFallbackStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Opens a JSON-backed log, loading whatever a previous run left behind.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read fallback store {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse fallback store {}", path.display()))?
        } else {
            Vec::new()
        };

        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub fn save(&self, booking: NewBooking) -> anyhow::Result<LocalBooking> {
        let local = LocalBooking {
            id: format!("{LOCAL_ID_PREFIX}{}", Uuid::new_v4().simple()),
            booking,
        };

        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("fallback store poisoned"))?;

        if let Some(path) = &self.path {
            let mut pending = entries.clone();
            pending.push(local.clone());
            let json = serde_json::to_string_pretty(&pending)?;
            std::fs::write(path, json)
                .with_context(|| format!("failed to write fallback store {}", path.display()))?;
        }
        entries.push(local.clone());

        tracing::warn!(booking_id = %local.id, "booking saved to local fallback store only");
        Ok(local)
    }

    pub fn entries(&self) -> Vec<LocalBooking> {
        self.entries
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}
