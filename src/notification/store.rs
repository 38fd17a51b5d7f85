//! Client-side cache of the user's notification feed.
//!
//! Mutations are optimistic: the local change is applied before the call
//! returns and the backend request is spawned in the background. Failed
//! requests are logged and never rolled back; the next successful fetch
//! replaces the cache and is the authority.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use super::alerts::DesktopAlerts;
use crate::api::NotificationApi;
use crate::errors::ApiError;
use crate::identity::Identity;
use crate::models::notification::{FeedPage, Notification, NotificationFeedState};

pub const DEFAULT_PAGE_LIMIT: u32 = 30;

/// A feed fetch detached from the store, so it can run on another task.
pub struct FeedRequest {
    api: Arc<dyn NotificationApi>,
    identity: Identity,
    page: u32,
    limit: u32,
}

impl FeedRequest {
    pub async fn run(self) -> Result<FeedPage, ApiError> {
        self.api.fetch(&self.identity, self.page, self.limit).await
    }
}

pub struct NotificationStore {
    identity: Identity,
    api: Arc<dyn NotificationApi>,
    alerts: Option<DesktopAlerts>,
    page: u32,
    limit: u32,
    state: NotificationFeedState,
    in_flight: usize,
}

impl NotificationStore {
    pub fn new(identity: Identity, api: Arc<dyn NotificationApi>) -> Self {
        Self {
            identity,
            api,
            alerts: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
            state: NotificationFeedState::default(),
            in_flight: 0,
        }
    }

    pub fn with_alerts(mut self, alerts: DesktopAlerts) -> Self {
        self.alerts = Some(alerts);
        self
    }

    pub fn with_page(mut self, page: u32, limit: u32) -> Self {
        self.page = page.max(1);
        self.limit = limit.max(1);
        self
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> &NotificationFeedState {
        &self.state
    }

    pub fn items(&self) -> &[Notification] {
        &self.state.items
    }

    pub fn unread_count(&self) -> u64 {
        self.state.unread_count
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    /// `None` while signed out.
    pub fn fetch_request(&self) -> Option<FeedRequest> {
        self.identity.email()?;
        Some(FeedRequest {
            api: self.api.clone(),
            identity: self.identity.clone(),
            page: self.page,
            limit: self.limit,
        })
    }

    pub fn begin_fetch(&mut self) {
        self.in_flight += 1;
        self.state.is_loading = true;
    }

    /// Applies a fetch outcome. Overlapping fetches are not cancelled; the
    /// one that finishes last wins.
    pub fn finish_fetch(&mut self, result: Result<FeedPage, ApiError>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state.is_loading = self.in_flight > 0;
        match result {
            Ok(page) => self.apply_page(page),
            Err(e) => warn!(error = %e, "notification fetch failed, keeping cached feed"),
        }
    }

    /// Replaces the cache with `page`. Repeated ids keep their first entry.
    pub fn apply_page(&mut self, page: FeedPage) {
        let mut seen = HashSet::new();
        let items: Vec<Notification> = page
            .notifications
            .into_iter()
            .filter(|n| seen.insert(n.id.clone()))
            .collect();

        self.state.items = items;
        let local = self.state.local_unread();
        self.state.unread_count = page.unread_count.unwrap_or(local);
        debug!(
            items = self.state.items.len(),
            unread = self.state.unread_count,
            "notification feed loaded"
        );

        if let Some(alerts) = &self.alerts {
            alerts.on_feed_loaded(&self.state.items);
        }
    }

    /// Fetches the configured page and replaces the cache. No-op while
    /// signed out.
    pub async fn refresh(&mut self) {
        if let Err(e) = self.try_refresh().await {
            warn!(error = %e, "notification fetch failed, keeping cached feed");
        }
    }

    /// Like [`refresh`](Self::refresh) but hands a failed fetch back to
    /// the caller. The cache is left untouched on error. Signed out is
    /// `Ok` with nothing loaded.
    pub async fn try_refresh(&mut self) -> Result<(), ApiError> {
        let Some(request) = self.fetch_request() else {
            debug!("refresh skipped: signed out");
            return Ok(());
        };
        self.begin_fetch();
        let result = request.run().await;
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state.is_loading = self.in_flight > 0;
        self.apply_page(result?);
        Ok(())
    }

    /// Marks one unread item read. Returns whether anything changed.
    pub fn mark_read(&mut self, id: &str) -> bool {
        if !self.identity.is_signed_in() {
            return false;
        }
        let Some(item) = self.state.items.iter_mut().find(|n| n.id == id) else {
            debug!(id, "mark_read: not in feed");
            return false;
        };
        if item.read {
            return false;
        }
        item.read = true;
        self.state.unread_count = self.state.unread_count.saturating_sub(1);

        let (api, identity, id) = (self.api.clone(), self.identity.clone(), id.to_string());
        spawn_mutation("mark_one_read", async move {
            api.mark_one_read(&identity, &id).await
        });
        true
    }

    pub fn mark_all_read(&mut self) -> bool {
        if !self.identity.is_signed_in() {
            return false;
        }
        for item in &mut self.state.items {
            item.read = true;
        }
        self.state.unread_count = 0;

        let (api, identity) = (self.api.clone(), self.identity.clone());
        spawn_mutation("mark_all_read", async move { api.mark_all_read(&identity).await });
        true
    }

    /// Removes one item from the cache. Returns whether it was present.
    pub fn dismiss(&mut self, id: &str) -> bool {
        if !self.identity.is_signed_in() {
            return false;
        }
        let Some(pos) = self.state.items.iter().position(|n| n.id == id) else {
            debug!(id, "dismiss: not in feed");
            return false;
        };
        let removed = self.state.items.remove(pos);
        if !removed.read {
            self.state.unread_count = self.state.unread_count.saturating_sub(1);
        }

        let (api, identity, id) = (self.api.clone(), self.identity.clone(), id.to_string());
        spawn_mutation("delete_one", async move { api.delete_one(&identity, &id).await });
        true
    }

    pub fn dismiss_all(&mut self) -> bool {
        if !self.identity.is_signed_in() {
            return false;
        }
        self.state.items.clear();
        self.state.unread_count = 0;

        let (api, identity) = (self.api.clone(), self.identity.clone());
        spawn_mutation("delete_all", async move { api.delete_all(&identity).await });
        true
    }
}

/// Fire-and-forget backend write; failures are only logged. Outside a
/// Tokio runtime the write is skipped and the next fetch reconciles.
fn spawn_mutation<F>(op: &'static str, call: F)
where
    F: Future<Output = Result<(), ApiError>> + Send + 'static,
{
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        warn!(op, "no async runtime, notification update not sent");
        return;
    };
    runtime.spawn(async move {
        if let Err(e) = call.await {
            warn!(op, error = %e, "notification update failed, next refresh will reconcile");
        }
    });
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::notification::alerts::tests::{notif, RecordingNotifier};
    use crate::platform::MemoryStore;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory backend: serves queued pages and records mutation calls.
    #[derive(Default)]
    pub(crate) struct FakeNotificationApi {
        pub(crate) pages: Mutex<VecDeque<Result<FeedPage, ApiError>>>,
        pub(crate) last_page: Mutex<Option<FeedPage>>,
        pub(crate) calls: Mutex<Vec<String>>,
        pub(crate) fetches: Mutex<Vec<(Option<String>, u32, u32)>>,
        pub(crate) fail_mutations: bool,
        pub(crate) fetch_delay: Option<Duration>,
    }

    impl FakeNotificationApi {
        pub(crate) fn serving(pages: Vec<FeedPage>) -> Self {
            Self {
                pages: Mutex::new(pages.into_iter().map(Ok).collect()),
                ..Default::default()
            }
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn fetch_count(&self) -> usize {
            self.fetches.lock().unwrap().len()
        }

        fn record(&self, call: String) -> Result<(), ApiError> {
            self.calls.lock().unwrap().push(call);
            if self.fail_mutations {
                Err(ApiError::Status {
                    status: 500,
                    body: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl NotificationApi for FakeNotificationApi {
        async fn fetch(&self, identity: &Identity, page: u32, limit: u32) -> Result<FeedPage, ApiError> {
            self.fetches
                .lock()
                .unwrap()
                .push((identity.email.clone(), page, limit));
            if let Some(delay) = self.fetch_delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.pages.lock().unwrap().pop_front();
            match next {
                Some(Ok(page)) => {
                    *self.last_page.lock().unwrap() = Some(page.clone());
                    Ok(page)
                }
                Some(Err(e)) => Err(e),
                None => Ok(self.last_page.lock().unwrap().clone().unwrap_or_default()),
            }
        }

        async fn mark_one_read(&self, _identity: &Identity, id: &str) -> Result<(), ApiError> {
            self.record(format!("read:{}", id))
        }

        async fn mark_all_read(&self, _identity: &Identity) -> Result<(), ApiError> {
            self.record("read_all".into())
        }

        async fn delete_one(&self, _identity: &Identity, id: &str) -> Result<(), ApiError> {
            self.record(format!("delete:{}", id))
        }

        async fn delete_all(&self, _identity: &Identity) -> Result<(), ApiError> {
            self.record("delete_all".into())
        }
    }

    pub(crate) fn page(items: Vec<Notification>, unread: Option<u64>) -> FeedPage {
        FeedPage {
            notifications: items,
            unread_count: unread,
        }
    }

    fn signed_in() -> Identity {
        Identity::new("student@christuniversity.in", Some("tok".into()))
    }

    async fn loaded(items: Vec<Notification>, unread: Option<u64>) -> (NotificationStore, Arc<FakeNotificationApi>) {
        let api = Arc::new(FakeNotificationApi::serving(vec![page(items, unread)]));
        let mut store = NotificationStore::new(signed_in(), api.clone());
        store.refresh().await;
        (store, api)
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_refresh_computes_unread_when_server_omits_it() {
        let (store, api) = loaded(vec![notif("a", false, 1), notif("b", true, 2), notif("c", false, 3)], None).await;
        assert_eq!(store.items().len(), 3);
        assert_eq!(store.unread_count(), 2);
        assert_eq!(store.unread_count(), store.state().local_unread());
        assert!(!store.is_loading());
        assert_eq!(
            api.fetches.lock().unwrap()[0],
            (Some("student@christuniversity.in".to_string()), 1, DEFAULT_PAGE_LIMIT)
        );
    }

    #[tokio::test]
    async fn test_refresh_accepts_server_unread_count() {
        let (store, _) = loaded(vec![notif("a", false, 1)], Some(12)).await;
        assert_eq!(store.unread_count(), 12);
    }

    #[tokio::test]
    async fn test_refresh_drops_duplicate_ids() {
        let mut dup = notif("a", true, 9);
        dup.title = "second copy".into();
        let (store, _) = loaded(vec![notif("a", false, 1), notif("b", false, 2), dup], None).await;
        assert_eq!(store.items().len(), 2);
        assert_eq!(store.items()[0].title, "title a");
        assert_eq!(store.unread_count(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cache() {
        let api = Arc::new(FakeNotificationApi::serving(vec![page(vec![notif("a", false, 1)], None)]));
        api.pages.lock().unwrap().push_back(Err(ApiError::Status {
            status: 502,
            body: "bad gateway".into(),
        }));
        let mut store = NotificationStore::new(signed_in(), api.clone());
        store.refresh().await;
        store.refresh().await;
        assert_eq!(store.items().len(), 1);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_mark_read_is_optimistic() {
        let (mut store, api) = loaded(vec![notif("a", false, 1), notif("b", false, 2)], None).await;

        assert!(store.mark_read("a"));
        // before the spawned request has had a chance to run
        assert!(api.calls().is_empty());
        assert!(store.state().get("a").unwrap().read);
        assert_eq!(store.unread_count(), 1);

        settle().await;
        assert_eq!(api.calls(), vec!["read:a".to_string()]);
    }

    #[tokio::test]
    async fn test_mark_read_never_goes_below_zero() {
        let (mut store, api) = loaded(vec![notif("a", false, 1)], Some(0)).await;
        assert!(store.mark_read("a"));
        assert_eq!(store.unread_count(), 0);
        // already read: nothing to do
        assert!(!store.mark_read("a"));
        assert!(!store.mark_read("missing"));
        settle().await;
        assert_eq!(api.calls(), vec!["read:a".to_string()]);
    }

    #[tokio::test]
    async fn test_mark_all_read_is_optimistic() {
        let (mut store, api) = loaded(vec![notif("a", false, 1), notif("b", true, 2), notif("c", false, 3)], None).await;
        assert_eq!(store.unread_count(), 2);

        assert!(store.mark_all_read());
        assert_eq!(store.unread_count(), 0);
        assert!(store.items().iter().all(|n| n.read));
        assert!(api.calls().is_empty());

        settle().await;
        assert_eq!(api.calls(), vec!["read_all".to_string()]);
    }

    #[tokio::test]
    async fn test_dismiss_unread_and_read_items() {
        let (mut store, api) = loaded(vec![notif("a", false, 1), notif("b", true, 2)], None).await;

        assert!(store.dismiss("b"));
        assert_eq!(store.unread_count(), 1);
        assert!(store.dismiss("a"));
        assert_eq!(store.unread_count(), 0);
        assert!(store.items().is_empty());

        settle().await;
        assert_eq!(api.calls(), vec!["delete:b".to_string(), "delete:a".to_string()]);
    }

    #[tokio::test]
    async fn test_dismiss_absent_id_is_noop() {
        let (mut store, api) = loaded(vec![notif("a", false, 1)], None).await;
        assert!(!store.dismiss("zzz"));
        assert_eq!(store.unread_count(), 1);
        assert_eq!(store.items().len(), 1);
        settle().await;
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_dismiss_all_clears_everything() {
        let (mut store, api) = loaded(vec![notif("a", false, 1), notif("b", false, 2)], Some(5)).await;
        assert!(store.dismiss_all());
        assert!(store.items().is_empty());
        assert_eq!(store.unread_count(), 0);
        settle().await;
        assert_eq!(api.calls(), vec!["delete_all".to_string()]);
    }

    #[tokio::test]
    async fn test_signed_out_store_ignores_everything() {
        let api = Arc::new(FakeNotificationApi::serving(vec![page(vec![notif("a", false, 1)], None)]));
        let mut store = NotificationStore::new(Identity::anonymous(), api.clone());
        store.refresh().await;
        assert_eq!(api.fetch_count(), 0);

        store.apply_page(page(vec![notif("a", false, 1)], None));
        assert!(!store.mark_read("a"));
        assert!(!store.mark_all_read());
        assert!(!store.dismiss("a"));
        assert!(!store.dismiss_all());
        assert_eq!(store.unread_count(), 1);
        settle().await;
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_mutation_is_not_rolled_back() {
        let api = Arc::new(FakeNotificationApi {
            fail_mutations: true,
            ..FakeNotificationApi::serving(vec![page(vec![notif("a", false, 1)], None)])
        });
        let mut store = NotificationStore::new(signed_in(), api.clone());
        store.refresh().await;
        store.mark_read("a");
        settle().await;
        assert_eq!(api.calls(), vec!["read:a".to_string()]);
        assert!(store.state().get("a").unwrap().read);
        assert_eq!(store.unread_count(), 0);
    }

    #[tokio::test]
    async fn test_refresh_reconciles_local_drift() {
        // server never applied the read; the next fetch is authoritative
        let api = Arc::new(FakeNotificationApi::serving(vec![
            page(vec![notif("a", false, 1)], None),
            page(vec![notif("a", false, 1)], None),
        ]));
        let mut store = NotificationStore::new(signed_in(), api.clone());
        store.refresh().await;
        store.mark_read("a");
        assert_eq!(store.unread_count(), 0);
        store.refresh().await;
        assert_eq!(store.unread_count(), 1);
        assert!(!store.state().get("a").unwrap().read);
    }

    #[tokio::test]
    async fn test_desktop_alert_fires_once_across_refreshes() {
        let notifier = Arc::new(RecordingNotifier::granted());
        let alerts = DesktopAlerts::new(notifier.clone(), Arc::new(MemoryStore::new()));
        let api = Arc::new(FakeNotificationApi::serving(vec![
            page(vec![notif("n1", false, 1)], None),
            page(vec![notif("n1", false, 1)], None),
        ]));
        let mut store = NotificationStore::new(signed_in(), api).with_alerts(alerts);

        store.refresh().await;
        store.refresh().await;
        assert_eq!(notifier.shown_tags(), vec!["n1".to_string()]);
    }

    #[test]
    fn test_mutations_outside_runtime_stay_local() {
        let api = Arc::new(FakeNotificationApi::default());
        let mut store = NotificationStore::new(signed_in(), api.clone());
        store.apply_page(page(vec![notif("a", false, 1), notif("b", false, 2), notif("c", false, 3)], None));

        assert!(store.mark_read("a"));
        assert_eq!(store.unread_count(), 2);
        assert!(store.dismiss("b"));
        assert_eq!(store.unread_count(), 1);
        assert!(store.mark_all_read());
        assert_eq!(store.unread_count(), 0);
        assert!(store.dismiss_all());
        assert!(store.items().is_empty());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_try_refresh_surfaces_failure_and_keeps_cache() {
        let api = Arc::new(FakeNotificationApi::serving(vec![page(vec![notif("a", false, 1)], None)]));
        api.pages.lock().unwrap().push_back(Err(ApiError::Status {
            status: 503,
            body: "down".into(),
        }));
        let mut store = NotificationStore::new(signed_in(), api.clone());

        tokio_test::assert_ok!(store.try_refresh().await);
        let err = tokio_test::assert_err!(store.try_refresh().await);
        assert!(matches!(err, ApiError::Status { status: 503, .. }));
        assert_eq!(store.items().len(), 1);
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_try_refresh_signed_out_is_ok_and_empty() {
        let api = Arc::new(FakeNotificationApi::default());
        let mut store = NotificationStore::new(Identity::anonymous(), api.clone());
        tokio_test::assert_ok!(store.try_refresh().await);
        assert!(store.items().is_empty());
        assert_eq!(api.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_with_page_is_used_for_fetch() {
        let api = Arc::new(FakeNotificationApi::default());
        let mut store = NotificationStore::new(signed_in(), api.clone()).with_page(2, 10);
        store.refresh().await;
        assert_eq!(api.fetches.lock().unwrap()[0].1, 2);
        assert_eq!(api.fetches.lock().unwrap()[0].2, 10);
    }
}
