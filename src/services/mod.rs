//! Service Layer
//!
//! Fetching, overlay bookkeeping and the sync engine that ties them together.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      GeofenceSync                           │
//! │  ┌───────────────────┐        ┌───────────────────────┐     │
//! │  │ CollectionFetcher │        │   OverlayRegistry     │     │
//! │  │ (GET /api/{kind}) │        │  (tagged overlays)    │     │
//! │  └───────────────────┘        └───────────┬───────────┘     │
//! └───────────────────────────────────────────┼─────────────────┘
//!                  │ SyncEvent                │
//!                  ▼                          ▼
//!            subscribers                 MapSurface
//! ```

mod events;
mod fetcher;
mod registry;
mod retry;
mod runtime;
mod surface;
mod sync;

pub use events::*;
pub use fetcher::*;
pub use registry::*;
pub use retry::*;
pub use runtime::*;
pub use surface::*;
pub use sync::*;
