use async_trait::async_trait;
use serde::Serialize;

use super::{check, decode, encode_segment, require_email, ApiClient};
use crate::errors::ApiError;
use crate::identity::Identity;
use crate::models::user::{ProfileBody, UserProfile};

/// Persists the user's campus. Writing the same value twice is harmless.
#[async_trait]
pub trait CampusApi: Send + Sync {
    async fn save_campus(&self, identity: &Identity, campus: &str) -> Result<(), ApiError>;
}

#[derive(Serialize)]
struct CampusBody<'a> {
    campus: &'a str,
}

#[async_trait]
impl CampusApi for ApiClient {
    async fn save_campus(&self, identity: &Identity, campus: &str) -> Result<(), ApiError> {
        let email = require_email(identity)?;
        let url = self.url(&format!("/api/users/{}/campus", encode_segment(email)));

        let resp = self
            .authed(self.http.put(&url), identity)
            .json(&CampusBody { campus })
            .send()
            .await?;
        check(resp).await?;

        tracing::info!(campus, "campus saved");
        Ok(())
    }
}

impl ApiClient {
    /// `GET /api/users/{email}`.
    pub async fn fetch_profile(&self, identity: &Identity) -> Result<UserProfile, ApiError> {
        let email = require_email(identity)?;
        let url = self.url(&format!("/api/users/{}", encode_segment(email)));

        let resp = self.authed(self.http.get(&url), identity).send().await?;
        let body: ProfileBody = decode(resp).await?;
        Ok(body.into_profile())
    }
}
