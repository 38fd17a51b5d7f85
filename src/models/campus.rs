use serde::{Deserialize, Serialize};

/// A named physical campus location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campus {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Campus {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }
}

/// One reading from the device location capability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFix {
    pub lat: f64,
    pub lng: f64,
}

impl GeoFix {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Nearest campus to a fix and how far away it is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampusResolution {
    pub campus: Campus,
    pub distance_km: f64,
}

impl CampusResolution {
    /// Distance rounded to two decimals, as displayed.
    pub fn display_distance(&self) -> f64 {
        (self.distance_km * 100.0).round() / 100.0
    }
}
