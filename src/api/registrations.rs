use super::{decode, require_email, ApiClient};
use crate::errors::ApiError;
use crate::identity::Identity;
use crate::models::registration::{dedup_by_event_id, Registration, RegistrationsBody};

impl ApiClient {
    /// `GET /api/registrations?email=`, deduplicated by `event_id`.
    pub async fn fetch_registrations(&self, identity: &Identity) -> Result<Vec<Registration>, ApiError> {
        let email = require_email(identity)?;
        let resp = self
            .authed(self.http.get(self.url("/api/registrations")), identity)
            .query(&[("email", email)])
            .send()
            .await?;
        let body: RegistrationsBody = decode(resp).await?;
        let raw = body.into_vec();
        let total = raw.len();
        let unique = dedup_by_event_id(raw);
        if unique.len() != total {
            tracing::debug!(total, unique = unique.len(), "dropped duplicate registrations");
        }
        Ok(unique)
    }
}
