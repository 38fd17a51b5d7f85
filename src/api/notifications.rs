use async_trait::async_trait;
use serde::Serialize;

use super::{check, decode, encode_segment, require_email, ApiClient};
use crate::errors::ApiError;
use crate::identity::Identity;
use crate::models::notification::FeedPage;

/// Notification feed endpoints.
#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn fetch(&self, identity: &Identity, page: u32, limit: u32) -> Result<FeedPage, ApiError>;
    async fn mark_one_read(&self, identity: &Identity, id: &str) -> Result<(), ApiError>;
    async fn mark_all_read(&self, identity: &Identity) -> Result<(), ApiError>;
    async fn delete_one(&self, identity: &Identity, id: &str) -> Result<(), ApiError>;
    async fn delete_all(&self, identity: &Identity) -> Result<(), ApiError>;
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[async_trait]
impl NotificationApi for ApiClient {
    async fn fetch(&self, identity: &Identity, page: u32, limit: u32) -> Result<FeedPage, ApiError> {
        let email = require_email(identity)?;
        let resp = self
            .authed(self.http.get(self.url("/api/notifications")), identity)
            .query(&[
                ("email", email.to_string()),
                ("page", page.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;
        decode(resp).await
    }

    async fn mark_one_read(&self, identity: &Identity, id: &str) -> Result<(), ApiError> {
        let email = require_email(identity)?;
        let url = self.url(&format!("/api/notifications/{}/read", encode_segment(id)));
        let resp = self
            .authed(self.http.patch(&url), identity)
            .json(&EmailBody { email })
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    async fn mark_all_read(&self, identity: &Identity) -> Result<(), ApiError> {
        let email = require_email(identity)?;
        let resp = self
            .authed(self.http.patch(self.url("/api/notifications/mark-read")), identity)
            .json(&EmailBody { email })
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    async fn delete_one(&self, identity: &Identity, id: &str) -> Result<(), ApiError> {
        let email = require_email(identity)?;
        let url = self.url(&format!("/api/notifications/{}", encode_segment(id)));
        let resp = self
            .authed(self.http.delete(&url), identity)
            .query(&[("email", email)])
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }

    async fn delete_all(&self, identity: &Identity) -> Result<(), ApiError> {
        let email = require_email(identity)?;
        let resp = self
            .authed(self.http.delete(self.url("/api/notifications")), identity)
            .query(&[("email", email)])
            .send()
            .await?;
        check(resp).await.map(|_| ())
    }
}
