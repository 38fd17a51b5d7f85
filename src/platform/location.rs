use std::time::Duration;

use async_trait::async_trait;

use crate::errors::LocationErrorKind;
use crate::models::campus::GeoFix;

/// Options for a single position request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    /// Upper bound on how long the request may take. Implementations must
    /// resolve with [`LocationErrorKind::Timeout`] once it elapses.
    pub timeout: Duration,
    /// Oldest cached fix that may be returned.
    pub max_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(60),
        }
    }
}

/// Single-shot device location request.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, opts: &PositionOptions) -> Result<GeoFix, LocationErrorKind>;
}

/// Answers every request with a preset outcome.
#[derive(Debug, Clone)]
pub struct FixedLocation(Result<GeoFix, LocationErrorKind>);

impl FixedLocation {
    pub fn at(lat: f64, lng: f64) -> Self {
        Self(Ok(GeoFix::new(lat, lng)))
    }

    pub fn failing(kind: LocationErrorKind) -> Self {
        Self(Err(kind))
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self, _opts: &PositionOptions) -> Result<GeoFix, LocationErrorKind> {
        self.0
    }
}

/// Platform without a location capability.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_position(&self, _opts: &PositionOptions) -> Result<GeoFix, LocationErrorKind> {
        Err(LocationErrorKind::Unsupported)
    }
}
