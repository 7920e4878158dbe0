//! Map Surface
//!
//! The rendering boundary. A map widget implements [`MapSurface`]; the
//! registry drives it and never draws anything itself.
//!
//! [`RecordingSurface`] is an in-memory surface used by the headless binary
//! and by tests. It keeps what a widget would draw so it can be inspected.

use ahash::AHashMap;
use tracing::debug;

use crate::domain::overlay::{CircleOverlay, InfoPopup, Overlay, PointOverlay};

/// Opaque widget-side handle of a placed overlay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceHandle(pub u64);

/// Primitives offered by a mapping widget
///
/// A freshly placed overlay is attached (visible).
pub trait MapSurface {
    fn place_point(&mut self, point: &PointOverlay) -> SurfaceHandle;

    fn place_circle(&mut self, circle: &CircleOverlay) -> SurfaceHandle;

    /// Make a detached overlay visible again
    fn attach(&mut self, handle: SurfaceHandle);

    /// Hide an overlay without destroying it
    fn detach(&mut self, handle: SurfaceHandle);

    /// Destroy an overlay; the handle is dead afterwards
    fn remove(&mut self, handle: SurfaceHandle);

    /// Open `popup` when the overlay is clicked
    fn bind_popup(&mut self, handle: SurfaceHandle, popup: &InfoPopup);
}

/// What a [`RecordingSurface`] holds for one handle
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceEntry {
    pub overlay: Overlay,
    pub attached: bool,
    pub popup: Option<InfoPopup>,
}

/// In-memory [`MapSurface`]
#[derive(Debug, Default)]
pub struct RecordingSurface {
    entries: AHashMap<SurfaceHandle, SurfaceEntry>,
    next_id: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    fn place(&mut self, overlay: Overlay) -> SurfaceHandle {
        self.next_id += 1;
        let handle = SurfaceHandle(self.next_id);
        debug!("surface: placed {:?} at {}", handle, overlay.position());
        self.entries.insert(
            handle,
            SurfaceEntry {
                overlay,
                attached: true,
                popup: None,
            },
        );
        handle
    }

    fn set_attached(&mut self, handle: SurfaceHandle, attached: bool) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.attached = attached;
        }
    }

    pub fn get(&self, handle: SurfaceHandle) -> Option<&SurfaceEntry> {
        self.entries.get(&handle)
    }

    /// Number of overlays that exist on the surface, visible or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of overlays currently visible
    pub fn attached_count(&self) -> usize {
        self.entries.values().filter(|e| e.attached).count()
    }

    /// Simulate a click; returns the rendered popup if one is bound
    pub fn click(&self, handle: SurfaceHandle) -> Option<String> {
        let entry = self.entries.get(&handle)?;
        if !entry.attached {
            return None;
        }
        entry.popup.as_ref().map(InfoPopup::to_html)
    }
}

impl MapSurface for RecordingSurface {
    fn place_point(&mut self, point: &PointOverlay) -> SurfaceHandle {
        self.place(Overlay::Point(point.clone()))
    }

    fn place_circle(&mut self, circle: &CircleOverlay) -> SurfaceHandle {
        self.place(Overlay::Circle(circle.clone()))
    }

    fn attach(&mut self, handle: SurfaceHandle) {
        self.set_attached(handle, true);
    }

    fn detach(&mut self, handle: SurfaceHandle) {
        self.set_attached(handle, false);
    }

    fn remove(&mut self, handle: SurfaceHandle) {
        if self.entries.remove(&handle).is_some() {
            debug!("surface: removed {:?}", handle);
        }
    }

    fn bind_popup(&mut self, handle: SurfaceHandle, popup: &InfoPopup) {
        if let Some(entry) = self.entries.get_mut(&handle) {
            entry.popup = Some(popup.clone());
        }
    }
}
