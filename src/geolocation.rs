// SPDX-License-Identifier: GPL-3.0-only

//! Location source for submitted uploads
//!
//! The capture pipeline treats coordinates as opaque; whoever builds the
//! app decides where they come from.

use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}, {:.2}", self.lat, self.lng)
    }
}

/// Supplies the location attached to new uploads
pub trait GeolocationProvider: Send + Sync {
    fn current_location(&self) -> Option<Coordinates>;
}

/// Always reports the same coordinates
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

impl GeolocationProvider for FixedLocation {
    fn current_location(&self) -> Option<Coordinates> {
        Some(self.0)
    }
}

/// Never reports a location
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

impl GeolocationProvider for NoLocation {
    fn current_location(&self) -> Option<Coordinates> {
        None
    }
}
