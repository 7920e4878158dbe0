//! Sync Events
//!
//! Completion signals emitted by [`GeofenceSync`](super::GeofenceSync) so the
//! rendering side can subscribe instead of polling the indexes.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::facility::ValidationError;
use crate::domain::resource::EntityKind;

/// Events emitted after each sync cycle
#[derive(Clone, Debug)]
pub enum SyncEvent {
    /// A kind's index and overlays were replaced
    Synced {
        kind: EntityKind,
        /// Entities now in the index
        entities: usize,
        /// Records skipped in this cycle
        warnings: Vec<ValidationError>,
        at: DateTime<Utc>,
    },

    /// Fetch failed; previous index and overlays were left in place
    Failed {
        kind: EntityKind,
        message: Arc<str>,
        at: DateTime<Utc>,
    },
}

impl SyncEvent {
    pub fn kind(&self) -> EntityKind {
        match self {
            SyncEvent::Synced { kind, .. } | SyncEvent::Failed { kind, .. } => *kind,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SyncEvent::Failed { .. })
    }
}
