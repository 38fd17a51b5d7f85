//! Great-circle distance and nearest-campus lookup.

use crate::models::campus::{Campus, CampusResolution, GeoFix};

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Christ University campuses, in tie-break order.
pub fn default_campuses() -> Vec<Campus> {
    vec![
        Campus::new("Central Campus", 12.9346, 77.6068),
        Campus::new("Bannerghatta Road Campus", 12.8978, 77.5968),
        Campus::new("Yeshwanthpur Campus", 13.0206, 77.5422),
        Campus::new("Kengeri Campus", 12.9125, 77.4834),
    ]
}

/// Haversine distance in kilometres between two points given in degrees.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // rounding can leave `a` just outside [0, 1] near antipodes
    let a = a.clamp(0.0, 1.0);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Outcome of checking a fix against the directory.
#[derive(Debug, Clone, PartialEq)]
pub enum Proximity {
    OnCampus(CampusResolution),
    /// Nearest campus is beyond the threshold. `None` only for an empty directory.
    OffCampus(Option<CampusResolution>),
}

/// Known campuses plus the inclusive "near campus" radius.
#[derive(Debug, Clone)]
pub struct CampusDirectory {
    campuses: Vec<Campus>,
    max_distance_km: f64,
}

impl CampusDirectory {
    pub fn new(campuses: Vec<Campus>, max_distance_km: f64) -> Self {
        Self {
            campuses,
            max_distance_km,
        }
    }

    pub fn with_threshold(max_distance_km: f64) -> Self {
        Self::new(default_campuses(), max_distance_km)
    }

    pub fn campuses(&self) -> &[Campus] {
        &self.campuses
    }

    pub fn max_distance_km(&self) -> f64 {
        self.max_distance_km
    }

    /// Closest campus to `fix`. On equal distances the earlier entry wins.
    pub fn nearest(&self, fix: GeoFix) -> Option<CampusResolution> {
        let mut best: Option<CampusResolution> = None;
        for campus in &self.campuses {
            let d = haversine_km(fix.lat, fix.lng, campus.lat, campus.lng);
            // strict `<` keeps the first minimal entry
            if best.as_ref().map_or(true, |b| d < b.distance_km) {
                best = Some(CampusResolution {
                    campus: campus.clone(),
                    distance_km: d,
                });
            }
        }
        best
    }

    pub fn classify(&self, fix: GeoFix) -> Proximity {
        match self.nearest(fix) {
            Some(r) if r.distance_km <= self.max_distance_km => Proximity::OnCampus(r),
            other => Proximity::OffCampus(other),
        }
    }
}

impl Default for CampusDirectory {
    fn default() -> Self {
        Self::with_threshold(2.0)
    }
}
