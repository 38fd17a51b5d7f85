//! Campus detection and confirmation flow.
//!
//! ```text
//! Detecting ──▶ Confirm ──▶ FinalConfirm ──▶ Saving ──▶ Success
//!    │  ▲          │  ▲           │                │
//!    │  └──────────┘  └───────────┘ (back)          │
//!    ├──▶ NotOnCampus ──▶ Dismissed                 │
//!    └──▶ Error ◀───────────────────────────────────┘
//!           ├──▶ Detecting (retry)
//!           └──▶ Dismissed (try later)
//! ```
//!
//! The campus value cannot be changed by the user afterwards, so the save
//! is behind two confirmations and is only ever retried by the user.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::CampusApi;
use crate::cooldown::CooldownGate;
use crate::errors::{InvalidTransition, LocationErrorKind};
use crate::geo::{CampusDirectory, Proximity};
use crate::identity::Identity;
use crate::models::campus::CampusResolution;
use crate::platform::{LocationProvider, PositionOptions};

/// Token the user must type before the save is enabled.
pub const CONFIRMATION_TOKEN: &str = "YES";

pub const DEFAULT_SUCCESS_DELAY: Duration = Duration::from_millis(1200);

#[derive(Debug, Clone, PartialEq)]
pub enum ResolverFailure {
    Location(LocationErrorKind),
    Save { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolverState {
    Detecting,
    Confirm {
        resolution: CampusResolution,
    },
    FinalConfirm {
        resolution: CampusResolution,
        typed: String,
    },
    Saving {
        resolution: CampusResolution,
    },
    Success {
        resolution: CampusResolution,
    },
    NotOnCampus {
        nearest: Option<CampusResolution>,
    },
    Error {
        failure: ResolverFailure,
    },
    Dismissed,
}

impl ResolverState {
    pub fn name(&self) -> &'static str {
        match self {
            ResolverState::Detecting => "detecting",
            ResolverState::Confirm { .. } => "confirm",
            ResolverState::FinalConfirm { .. } => "final_confirm",
            ResolverState::Saving { .. } => "saving",
            ResolverState::Success { .. } => "success",
            ResolverState::NotOnCampus { .. } => "not_on_campus",
            ResolverState::Error { .. } => "error",
            ResolverState::Dismissed => "dismissed",
        }
    }

    pub fn resolution(&self) -> Option<&CampusResolution> {
        match self {
            ResolverState::Confirm { resolution }
            | ResolverState::FinalConfirm { resolution, .. }
            | ResolverState::Saving { resolution }
            | ResolverState::Success { resolution } => Some(resolution),
            ResolverState::NotOnCampus { nearest } => nearest.as_ref(),
            _ => None,
        }
    }

    /// Heading for terminal outcomes that need the user's attention.
    pub fn title(&self) -> Option<&'static str> {
        match self {
            ResolverState::NotOnCampus { .. } => Some("Not Near Any Campus"),
            ResolverState::Error { failure } => Some(match failure {
                ResolverFailure::Location(LocationErrorKind::PermissionDenied) => {
                    "Location Access Denied"
                }
                ResolverFailure::Location(LocationErrorKind::PositionUnavailable) => {
                    "Location Unavailable"
                }
                ResolverFailure::Location(LocationErrorKind::Timeout) => {
                    "Location Request Timed Out"
                }
                ResolverFailure::Location(LocationErrorKind::Unsupported) => {
                    "Location Not Supported"
                }
                ResolverFailure::Save { .. } => "Couldn't Save Campus",
            }),
            _ => None,
        }
    }

    pub fn message(&self) -> Option<String> {
        match self {
            ResolverState::NotOnCampus { nearest } => {
                let distance = nearest
                    .as_ref()
                    .map(|r| format!("{}", r.display_distance()))
                    .unwrap_or_else(|| "?".to_string());
                Some(format!(
                    "You don't appear to be near any campus (nearest is {} km away). \
                     Campus detection only works when you're physically on or near a campus.",
                    distance
                ))
            }
            ResolverState::Error { failure } => Some(match failure {
                ResolverFailure::Location(LocationErrorKind::PermissionDenied) => {
                    "Location access is needed to detect your campus. Enable location \
                     permissions in your settings and try again."
                        .to_string()
                }
                ResolverFailure::Location(LocationErrorKind::PositionUnavailable) => {
                    "We couldn't determine your location. Make sure location services \
                     are turned on and try again."
                        .to_string()
                }
                ResolverFailure::Location(LocationErrorKind::Timeout) => {
                    "It took too long to get your location. Move somewhere with a better \
                     signal and try again."
                        .to_string()
                }
                ResolverFailure::Location(LocationErrorKind::Unsupported) => {
                    "This device can't share its location, so your campus can't be \
                     detected here."
                        .to_string()
                }
                ResolverFailure::Save { message } => message.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for ResolverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outward signals of the flow.
pub struct ResolverCallbacks {
    on_complete: Box<dyn Fn(&str) + Send + Sync>,
    on_dismissed: Box<dyn Fn() + Send + Sync>,
}

impl ResolverCallbacks {
    pub fn new(
        on_complete: impl Fn(&str) + Send + Sync + 'static,
        on_dismissed: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            on_complete: Box::new(on_complete),
            on_dismissed: Box::new(on_dismissed),
        }
    }

    pub fn noop() -> Self {
        Self::new(|_| {}, || {})
    }
}

pub struct CampusResolver {
    identity: Identity,
    directory: CampusDirectory,
    location: Arc<dyn LocationProvider>,
    api: Arc<dyn CampusApi>,
    gate: CooldownGate,
    callbacks: ResolverCallbacks,
    position_options: PositionOptions,
    success_delay: Duration,
    state: ResolverState,
}

impl CampusResolver {
    pub fn new(
        identity: Identity,
        directory: CampusDirectory,
        location: Arc<dyn LocationProvider>,
        api: Arc<dyn CampusApi>,
        gate: CooldownGate,
        callbacks: ResolverCallbacks,
    ) -> Self {
        Self {
            identity,
            directory,
            location,
            api,
            gate,
            callbacks,
            position_options: PositionOptions::default(),
            success_delay: DEFAULT_SUCCESS_DELAY,
            state: ResolverState::Detecting,
        }
    }

    pub fn with_success_delay(mut self, delay: Duration) -> Self {
        self.success_delay = delay;
        self
    }

    pub fn with_position_options(mut self, opts: PositionOptions) -> Self {
        self.position_options = opts;
        self
    }

    pub fn state(&self) -> &ResolverState {
        &self.state
    }

    fn invalid(&self, action: &'static str) -> InvalidTransition {
        debug!(state = self.state.name(), action, "ignored resolver action");
        InvalidTransition {
            state: self.state.name(),
            action,
        }
    }

    /// Requests one position fix and classifies it. Offered on mount, as
    /// the retry from `Error`, and when the user rejects a suggestion in
    /// `Confirm` and wants to try again.
    pub async fn detect(&mut self) -> Result<&ResolverState, InvalidTransition> {
        match self.state {
            ResolverState::Detecting | ResolverState::Confirm { .. } | ResolverState::Error { .. } => {}
            _ => return Err(self.invalid("detect")),
        }
        self.state = ResolverState::Detecting;

        self.state = match self.location.current_position(&self.position_options).await {
            Ok(fix) => match self.directory.classify(fix) {
                Proximity::OnCampus(resolution) => {
                    info!(
                        campus = %resolution.campus.name,
                        distance_km = resolution.distance_km,
                        "campus detected"
                    );
                    ResolverState::Confirm { resolution }
                }
                Proximity::OffCampus(nearest) => {
                    info!(
                        nearest_km = nearest.as_ref().map(|r| r.distance_km),
                        max_km = self.directory.max_distance_km(),
                        "not near any campus"
                    );
                    ResolverState::NotOnCampus { nearest }
                }
            },
            Err(kind) => {
                warn!(error = %kind, "location request failed");
                ResolverState::Error {
                    failure: ResolverFailure::Location(kind),
                }
            }
        };
        Ok(&self.state)
    }

    /// `Confirm` → `FinalConfirm` with an empty token.
    pub fn accept(&mut self) -> Result<&ResolverState, InvalidTransition> {
        let ResolverState::Confirm { resolution } = &self.state else {
            return Err(self.invalid("accept"));
        };
        self.state = ResolverState::FinalConfirm {
            resolution: resolution.clone(),
            typed: String::new(),
        };
        Ok(&self.state)
    }

    /// Declines the suggested campus and closes the prompt.
    pub fn reject(&mut self) -> Result<&ResolverState, InvalidTransition> {
        if !matches!(self.state, ResolverState::Confirm { .. }) {
            return Err(self.invalid("reject"));
        }
        self.dismiss();
        Ok(&self.state)
    }

    /// Replaces the typed confirmation text.
    pub fn type_confirmation(&mut self, text: &str) -> Result<bool, InvalidTransition> {
        let ResolverState::FinalConfirm { typed, .. } = &mut self.state else {
            return Err(self.invalid("type_confirmation"));
        };
        *typed = text.to_string();
        Ok(self.can_save())
    }

    /// True in `FinalConfirm` once the typed text equals the token, ignoring case.
    pub fn can_save(&self) -> bool {
        match &self.state {
            ResolverState::FinalConfirm { typed, .. } => {
                typed.eq_ignore_ascii_case(CONFIRMATION_TOKEN)
            }
            _ => false,
        }
    }

    /// `FinalConfirm` → `Confirm`, discarding the typed text.
    pub fn back(&mut self) -> Result<&ResolverState, InvalidTransition> {
        let ResolverState::FinalConfirm { resolution, .. } = &self.state else {
            return Err(self.invalid("back"));
        };
        self.state = ResolverState::Confirm {
            resolution: resolution.clone(),
        };
        Ok(&self.state)
    }

    /// Writes the campus. On success waits the success delay, then fires
    /// the completion callback with the campus name.
    pub async fn save(&mut self) -> Result<&ResolverState, InvalidTransition> {
        if !self.can_save() {
            return Err(self.invalid("save"));
        }
        let Some(resolution) = self.state.resolution().cloned() else {
            return Err(self.invalid("save"));
        };
        self.state = ResolverState::Saving {
            resolution: resolution.clone(),
        };

        match self.api.save_campus(&self.identity, &resolution.campus.name).await {
            Ok(()) => {
                let campus = resolution.campus.name.clone();
                self.state = ResolverState::Success { resolution };
                tokio::time::sleep(self.success_delay).await;
                (self.callbacks.on_complete)(&campus);
            }
            Err(e) => {
                warn!(error = %e, campus = %resolution.campus.name, "saving campus failed");
                self.state = ResolverState::Error {
                    failure: ResolverFailure::Save {
                        message: e.user_message(),
                    },
                };
            }
        }
        Ok(&self.state)
    }

    /// From `Error`: give up for now and start the cooldown.
    pub fn try_later(&mut self) -> Result<&ResolverState, InvalidTransition> {
        if !matches!(self.state, ResolverState::Error { .. }) {
            return Err(self.invalid("try_later"));
        }
        self.dismiss();
        Ok(&self.state)
    }

    /// From `NotOnCampus`: acknowledge and start the cooldown.
    pub fn acknowledge(&mut self) -> Result<&ResolverState, InvalidTransition> {
        if !matches!(self.state, ResolverState::NotOnCampus { .. }) {
            return Err(self.invalid("acknowledge"));
        }
        self.dismiss();
        Ok(&self.state)
    }

    fn dismiss(&mut self) {
        let record = self.gate.mark_dismissed();
        debug!(
            from = self.state.name(),
            at_ms = record.timestamp_ms,
            "campus prompt dismissed"
        );
        self.state = ResolverState::Dismissed;
        (self.callbacks.on_dismissed)();
    }
}
