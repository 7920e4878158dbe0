//! FAED Map Library
//!
//! Keeps the hangar and droppoint overlays of the FAED management map in
//! step with the collections served by the FAED API.

pub mod constants;
pub mod domain;
pub mod error;
pub mod helpers;
pub mod services;
pub mod utils;
