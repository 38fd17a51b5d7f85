//! SOCIO backend client.
//!
//! Every call is scoped to the caller's [`Identity`]: the email goes into
//! the path or query string and the access token, when present, into a
//! bearer `Authorization` header.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::errors::ApiError;
use crate::identity::Identity;

pub mod campus;
pub mod notifications;
pub mod registrations;

pub use campus::CampusApi;
pub use notifications::NotificationApi;

/// HTTP client for the SOCIO REST API.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    /// `base_url` is the backend origin; paths are joined as `{base_url}/api/...`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("socio/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            base_url: crate::config::normalize_api_url(&base_url.into()),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, req: RequestBuilder, identity: &Identity) -> RequestBuilder {
        match identity.token() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

fn require_email(identity: &Identity) -> Result<&str, ApiError> {
    identity.email().ok_or(ApiError::MissingEmail)
}

fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Maps non-2xx responses to [`ApiError::Status`], keeping a bounded body excerpt.
async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let excerpt: String = body.chars().take(200).collect();
    Err(ApiError::Status {
        status: status.as_u16(),
        body: excerpt,
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
    let body = check(resp).await?.text().await?;
    Ok(serde_json::from_str(&body)?)
}
