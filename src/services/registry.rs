//! Overlay Registry
//!
//! Tracks every overlay placed on a [`MapSurface`], tagged by the kind of
//! entity that produced it so one kind can be replaced without touching the
//! others.
//!
//! ```text
//! add ──────► visible ──clear_all──► hidden
//!                ▲                      │
//!                └──────show_all────────┘
//! remove_all / remove_kind: destroyed from either state
//! ```

use std::collections::BTreeMap;

use tracing::debug;

use crate::domain::overlay::{InfoPopup, Overlay};
use crate::domain::resource::EntityKind;
use crate::error::{Error, Result};
use crate::services::surface::{MapSurface, SurfaceHandle};

/// Registry-side identity of an overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OverlayHandle(u64);

#[derive(Debug)]
struct TrackedOverlay {
    kind: EntityKind,
    overlay: Overlay,
    surface: SurfaceHandle,
    visible: bool,
}

/// Owner of the live overlay set
#[derive(Debug)]
pub struct OverlayRegistry<S> {
    surface: S,
    // handles are allocated monotonically, so iteration follows insertion order
    overlays: BTreeMap<OverlayHandle, TrackedOverlay>,
    next_id: u64,
}

impl<S: MapSurface> OverlayRegistry<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            overlays: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Place an overlay on the surface and start tracking it
    pub fn add(&mut self, kind: EntityKind, overlay: Overlay) -> Result<OverlayHandle> {
        let surface = match &overlay {
            Overlay::Point(point) => self.surface.place_point(point),
            Overlay::Circle(circle) => {
                if !circle.radius_meters.is_finite() || circle.radius_meters < 0.0 {
                    return Err(Error::Overlay {
                        message: format!("invalid circle radius {}", circle.radius_meters),
                    });
                }
                self.surface.place_circle(circle)
            }
        };

        self.next_id += 1;
        let handle = OverlayHandle(self.next_id);
        debug!(
            "registry: added {kind} overlay {:?} at {} ({})",
            handle,
            overlay.position(),
            overlay.title().unwrap_or("untitled")
        );

        self.overlays.insert(
            handle,
            TrackedOverlay {
                kind,
                overlay,
                surface,
                visible: true,
            },
        );
        Ok(handle)
    }

    /// Open `popup` when the overlay is clicked
    pub fn bind_popup(&mut self, handle: OverlayHandle, popup: &InfoPopup) -> Result<()> {
        let tracked = self.overlays.get(&handle).ok_or_else(|| Error::Overlay {
            message: format!("unknown overlay {handle:?}"),
        })?;
        self.surface.bind_popup(tracked.surface, popup);
        Ok(())
    }

    /// Hide every overlay but keep tracking it
    pub fn clear_all(&mut self) {
        for tracked in self.overlays.values_mut().filter(|t| t.visible) {
            self.surface.detach(tracked.surface);
            tracked.visible = false;
        }
    }

    /// Make every tracked overlay visible again
    pub fn show_all(&mut self) {
        for tracked in self.overlays.values_mut().filter(|t| !t.visible) {
            self.surface.attach(tracked.surface);
            tracked.visible = true;
        }
    }

    /// Destroy every overlay
    pub fn remove_all(&mut self) {
        for tracked in std::mem::take(&mut self.overlays).into_values() {
            self.surface.remove(tracked.surface);
        }
    }

    /// Destroy the overlays of one kind, leaving the rest untouched
    pub fn remove_kind(&mut self, kind: EntityKind) -> usize {
        let before = self.overlays.len();
        let surface = &mut self.surface;
        self.overlays.retain(|_, tracked| {
            if tracked.kind == kind {
                surface.remove(tracked.surface);
                false
            } else {
                true
            }
        });
        let removed = before - self.overlays.len();
        debug!("registry: removed {removed} {kind} overlays");
        removed
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Number of tracked overlays of one kind
    pub fn count(&self, kind: EntityKind) -> usize {
        self.overlays.values().filter(|t| t.kind == kind).count()
    }

    pub fn visible_count(&self) -> usize {
        self.overlays.values().filter(|t| t.visible).count()
    }

    /// Handles of one kind, in insertion order
    pub fn handles(&self, kind: EntityKind) -> Vec<OverlayHandle> {
        self.overlays
            .iter()
            .filter(|(_, t)| t.kind == kind)
            .map(|(handle, _)| *handle)
            .collect()
    }

    /// Handles currently visible, in insertion order
    pub fn visible_handles(&self) -> Vec<OverlayHandle> {
        self.overlays
            .iter()
            .filter(|(_, t)| t.visible)
            .map(|(handle, _)| *handle)
            .collect()
    }

    pub fn get(&self, handle: OverlayHandle) -> Option<&Overlay> {
        self.overlays.get(&handle).map(|t| &t.overlay)
    }

    pub fn is_visible(&self, handle: OverlayHandle) -> bool {
        self.overlays.get(&handle).is_some_and(|t| t.visible)
    }

    /// Widget-side handle of a tracked overlay
    pub fn surface_handle(&self, handle: OverlayHandle) -> Option<SurfaceHandle> {
        self.overlays.get(&handle).map(|t| t.surface)
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }
}
