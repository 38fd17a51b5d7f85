//! Background task that owns a [`NotificationStore`]: polls the feed on an
//! interval, applies commands from the UI and publishes every state change.
//!
//! Fetches run on their own tasks and report back through a channel, so a
//! mutation can be applied while a fetch is in flight. A response that was
//! requested before the mutation may then overwrite its optimistic effect;
//! the next poll corrects it. This race is accepted rather than guarded.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::debug;

use super::store::NotificationStore;
use crate::errors::ApiError;
use crate::models::notification::{FeedPage, NotificationFeedState};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    Refresh,
    MarkRead(String),
    MarkAllRead,
    Dismiss(String),
    DismissAll,
}

/// UI side of a running feed. Dropping it stops the task.
pub struct FeedHandle {
    commands: mpsc::UnboundedSender<FeedCommand>,
    state: watch::Receiver<NotificationFeedState>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    fn send(&self, cmd: FeedCommand) {
        if self.commands.send(cmd).is_err() {
            debug!("notification feed already stopped");
        }
    }

    pub fn refresh(&self) {
        self.send(FeedCommand::Refresh);
    }

    pub fn mark_read(&self, id: impl Into<String>) {
        self.send(FeedCommand::MarkRead(id.into()));
    }

    pub fn mark_all_read(&self) {
        self.send(FeedCommand::MarkAllRead);
    }

    pub fn dismiss(&self, id: impl Into<String>) {
        self.send(FeedCommand::Dismiss(id.into()));
    }

    pub fn dismiss_all(&self) {
        self.send(FeedCommand::DismissAll);
    }

    /// Latest published state.
    pub fn state(&self) -> NotificationFeedState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<NotificationFeedState> {
        self.state.clone()
    }

    /// Stops polling and waits for the task to exit. Fetches still in
    /// flight are discarded.
    pub async fn shutdown(self) {
        let FeedHandle { commands, task, .. } = self;
        drop(commands);
        let _ = task.await;
    }
}

/// Starts the feed task. The first fetch happens immediately.
pub fn spawn_feed(store: NotificationStore, poll_interval: Duration) -> FeedHandle {
    let (commands, command_rx) = mpsc::unbounded_channel();
    let (state_tx, state) = watch::channel(store.state().clone());
    let task = tokio::spawn(run(store, poll_interval, command_rx, state_tx));
    FeedHandle {
        commands,
        state,
        task,
    }
}

async fn run(
    mut store: NotificationStore,
    poll_interval: Duration,
    mut commands: mpsc::UnboundedReceiver<FeedCommand>,
    state_tx: watch::Sender<NotificationFeedState>,
) {
    let (results_tx, mut results) = mpsc::unbounded_channel::<Result<FeedPage, ApiError>>();
    let mut ticker = time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => start_fetch(&mut store, &results_tx),
            cmd = commands.recv() => match cmd {
                Some(FeedCommand::Refresh) => start_fetch(&mut store, &results_tx),
                Some(FeedCommand::MarkRead(id)) => { store.mark_read(&id); }
                Some(FeedCommand::MarkAllRead) => { store.mark_all_read(); }
                Some(FeedCommand::Dismiss(id)) => { store.dismiss(&id); }
                Some(FeedCommand::DismissAll) => { store.dismiss_all(); }
                None => break,
            },
            Some(result) = results.recv() => store.finish_fetch(result),
        }

        let next = store.state();
        state_tx.send_if_modified(|current| {
            if *current == *next {
                return false;
            }
            *current = next.clone();
            true
        });
    }

    debug!("notification feed stopped");
}

fn start_fetch(
    store: &mut NotificationStore,
    results: &mpsc::UnboundedSender<Result<FeedPage, ApiError>>,
) {
    let Some(request) = store.fetch_request() else {
        return;
    };
    store.begin_fetch();
    let results = results.clone();
    tokio::spawn(async move {
        // receiver is gone once the feed stops
        let _ = results.send(request.run().await);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::notification::alerts::tests::notif;
    use crate::notification::store::tests::{page, FakeNotificationApi};
    use std::sync::Arc;

    fn store(api: Arc<FakeNotificationApi>) -> NotificationStore {
        NotificationStore::new(Identity::new("s@christuniversity.in", None), api)
    }

    async fn wait_until(
        rx: &mut watch::Receiver<NotificationFeedState>,
        pred: impl FnMut(&NotificationFeedState) -> bool,
    ) -> NotificationFeedState {
        time::timeout(Duration::from_secs(2), rx.wait_for(pred))
            .await
            .expect("feed state never matched")
            .expect("feed task stopped")
            .clone()
    }

    #[tokio::test]
    async fn test_feed_loads_on_start() {
        let api = Arc::new(FakeNotificationApi::serving(vec![page(
            vec![notif("a", false, 1), notif("b", false, 2), notif("c", true, 3)],
            None,
        )]));
        let handle = spawn_feed(store(api.clone()), Duration::from_secs(3600));
        let mut rx = handle.subscribe();

        let state = wait_until(&mut rx, |s| s.items.len() == 3 && !s.is_loading).await;
        assert_eq!(state.unread_count, 2);
        assert_eq!(api.fetch_count(), 1);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_feed_commands_apply_optimistically() {
        let api = Arc::new(FakeNotificationApi::serving(vec![page(
            vec![notif("a", false, 1), notif("b", false, 2), notif("c", true, 3)],
            None,
        )]));
        let handle = spawn_feed(store(api.clone()), Duration::from_secs(3600));
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| s.items.len() == 3).await;

        handle.mark_read("a");
        let state = wait_until(&mut rx, |s| s.unread_count == 1).await;
        assert!(state.get("a").unwrap().read);

        handle.dismiss("b");
        let state = wait_until(&mut rx, |s| s.items.len() == 2).await;
        assert_eq!(state.unread_count, 0);

        handle.dismiss_all();
        wait_until(&mut rx, |s| s.items.is_empty()).await;

        handle.shutdown().await;
        time::sleep(Duration::from_millis(20)).await;
        assert_eq!(
            api.calls(),
            vec!["read:a".to_string(), "delete:b".to_string(), "delete_all".to_string()]
        );
    }

    #[tokio::test]
    async fn test_feed_polls_on_interval_and_stops_on_shutdown() {
        let api = Arc::new(FakeNotificationApi::serving(vec![page(vec![notif("a", false, 1)], None)]));
        let handle = spawn_feed(store(api.clone()), Duration::from_millis(20));

        time::sleep(Duration::from_millis(110)).await;
        let polled = api.fetch_count();
        assert!(polled >= 3, "expected repeated polling, got {polled}");

        handle.shutdown().await;
        let after_shutdown = api.fetch_count();
        time::sleep(Duration::from_millis(80)).await;
        assert_eq!(api.fetch_count(), after_shutdown);
    }

    #[tokio::test]
    async fn test_manual_refresh_replaces_items() {
        let api = Arc::new(FakeNotificationApi::serving(vec![
            page(vec![notif("a", false, 1)], None),
            page(vec![notif("b", false, 2), notif("a", true, 1)], None),
        ]));
        let handle = spawn_feed(store(api.clone()), Duration::from_secs(3600));
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| s.items.len() == 1).await;

        handle.refresh();
        let state = wait_until(&mut rx, |s| s.items.len() == 2).await;
        assert_eq!(state.items[0].id, "b");
        assert_eq!(state.unread_count, 1);
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_signed_out_feed_never_fetches() {
        let api = Arc::new(FakeNotificationApi::default());
        let handle = spawn_feed(
            NotificationStore::new(Identity::anonymous(), api.clone()),
            Duration::from_millis(10),
        );
        handle.refresh();
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(api.fetch_count(), 0);
        assert_eq!(handle.state(), NotificationFeedState::default());
        handle.shutdown().await;
    }

    #[tokio::test]
    async fn test_stale_fetch_can_overwrite_mutation_until_next_poll() {
        let api = Arc::new(FakeNotificationApi {
            fetch_delay: Some(Duration::from_millis(30)),
            ..FakeNotificationApi::serving(vec![page(vec![notif("a", false, 1)], None)])
        });
        let handle = spawn_feed(store(api.clone()), Duration::from_secs(3600));
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| s.items.len() == 1 && !s.is_loading).await;

        // fetch in flight, then an optimistic read lands before it returns
        handle.refresh();
        handle.mark_read("a");
        wait_until(&mut rx, |s| s.unread_count == 0).await;
        let state = wait_until(&mut rx, |s| !s.is_loading && s.unread_count == 1).await;
        assert!(!state.get("a").unwrap().read);
        handle.shutdown().await;
    }
}
