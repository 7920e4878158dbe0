//! Domain - Pure Data Structures
//!
//! These types don't depend on the network or the map widget.

pub mod config;
pub mod facility;
pub mod geo;
pub mod overlay;
pub mod resource;
