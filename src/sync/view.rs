//! View-state tracker: the active message and its viewed flag.
//!
//! Opening a message flips it to viewed locally right away (`Pending`) and
//! tells the server in the background. The server's answer moves it to
//! `Confirmed` or `Failed`; a failure is logged but the local flag stays set.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::{ApiResult, MailApi, QueryParam};
use crate::mail::{MessageId, MessageSummary};

use super::ids::IdResolver;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    /// Shown as viewed, server not yet answered
    Pending,
    Confirmed,
    /// Server rejected or unreachable; local state kept
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMessage {
    pub message: MessageSummary,
    pub state: ViewState,
    /// Bumped on every activation, so reopening a message is distinct
    pub activation: u64,
}

type Slot = Arc<Mutex<Option<ActiveMessage>>>;

fn lock(slot: &Slot) -> MutexGuard<'_, Option<ActiveMessage>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ViewTracker {
    api: Arc<dyn MailApi>,
    ids: IdResolver,
    active: Slot,
    activations: AtomicU64,
}

impl ViewTracker {
    pub fn new(api: Arc<dyn MailApi>, ids: IdResolver) -> Self {
        Self {
            api,
            ids,
            active: Arc::new(Mutex::new(None)),
            activations: AtomicU64::new(0),
        }
    }

    pub fn active(&self) -> Option<ActiveMessage> {
        lock(&self.active).clone()
    }

    pub fn clear(&self) {
        *lock(&self.active) = None;
        self.ids.update(|s| s.active_message = None);
    }

    /// Make `message` active now and mark it viewed on the server in the
    /// background. The returned handle completes once the server answered.
    pub fn set_active(&self, mut message: MessageSummary) -> JoinHandle<()> {
        let mid = message.mid;
        let activation = self.activations.fetch_add(1, Ordering::Relaxed) + 1;
        message.is_viewed = true;
        *lock(&self.active) = Some(ActiveMessage {
            message,
            state: ViewState::Pending,
            activation,
        });
        self.ids.update(|s| s.active_message = Some(mid));

        let api = Arc::clone(&self.api);
        let active = Arc::clone(&self.active);
        let account = self.ids.account_id();
        let msgid = self.ids.message_id();

        tokio::spawn(async move {
            let result = api
                .set_viewed(&account, &msgid, &IdResolver::viewed_param(true))
                .await;
            resolve(&active, activation, &msgid, result);
        })
    }

    /// Set the viewed flag on the server for any message. Not optimistic.
    pub async fn mark_viewed(&self, mid: MessageId, viewed: bool) -> ApiResult<()> {
        let result = self
            .api
            .set_viewed(
                &self.ids.account_id(),
                &IdResolver::message_param(mid),
                &IdResolver::viewed_param(viewed),
            )
            .await;
        if let Err(e) = &result {
            warn!("Failed to set viewed={} on message {}: {}", viewed, mid, e);
        }
        result
    }
}

/// Apply the server's answer. Answers for an activation that is no longer
/// current are dropped, even when the same message was opened again.
fn resolve(active: &Slot, activation: u64, msgid: &QueryParam, result: ApiResult<()>) {
    if let Err(e) = &result {
        warn!("Marking message {} viewed failed: {}", msgid.value, e);
    }

    let mut slot = lock(active);
    match slot.as_mut() {
        Some(current) if current.activation == activation => {
            current.state = match result {
                Ok(()) => ViewState::Confirmed,
                Err(e) => ViewState::Failed(e.to_string()),
            };
        }
        _ => debug!(
            "Viewed answer for {} arrived after selection moved on",
            msgid.value
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeMailApi, Failure, account};
    use std::time::Duration;

    fn message(mid: u64) -> MessageSummary {
        MessageSummary {
            mid: MessageId(mid),
            sender_email: "a@x.com".to_string(),
            recipients: vec!["me@x.com".to_string()],
            subject: "Hello".to_string(),
            sent_at: None,
            is_viewed: false,
            body: String::new(),
        }
    }

    fn logged_in() -> IdResolver {
        let ids = IdResolver::new();
        ids.update(|s| {
            s.account = Some(account(12, "me@x.com"));
            s.logged_in = true;
        });
        ids
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_active_is_immediate() {
        let api = Arc::new(FakeMailApi::new());
        api.set_viewed_delay(Duration::from_secs(5));
        let ids = logged_in();
        let tracker = ViewTracker::new(api.clone(), ids.clone());

        let handle = tracker.set_active(message(0x1f));

        let active = tracker.active().unwrap();
        assert_eq!(active.message.mid, MessageId(0x1f));
        assert!(active.message.is_viewed);
        assert_eq!(active.state, ViewState::Pending);
        assert_eq!(ids.message_id().value, "1f");

        handle.await.unwrap();
        assert_eq!(tracker.active().unwrap().state, ViewState::Confirmed);
        assert_eq!(
            api.viewed_calls(),
            vec![("12".to_string(), "1f".to_string(), "1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_failure_is_flagged_not_reverted() {
        let api = Arc::new(FakeMailApi::new());
        api.fail_viewed(Some(Failure::Network));
        let tracker = ViewTracker::new(api, logged_in());

        tracker.set_active(message(4)).await.unwrap();

        let active = tracker.active().unwrap();
        assert!(active.message.is_viewed);
        assert!(matches!(active.state, ViewState::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_answer_ignored_after_switch() {
        let api = Arc::new(FakeMailApi::new());
        api.set_viewed_delay(Duration::from_millis(500));
        api.fail_viewed(Some(Failure::Network));
        let tracker = ViewTracker::new(api.clone(), logged_in());

        let first = tracker.set_active(message(1));
        tokio::task::yield_now().await;
        api.fail_viewed(None);
        api.set_viewed_delay(Duration::from_millis(2000));
        let second = tracker.set_active(message(2));

        first.await.unwrap();
        let active = tracker.active().unwrap();
        assert_eq!(active.message.mid, MessageId(2));
        assert_eq!(active.state, ViewState::Pending);

        second.await.unwrap();
        assert_eq!(tracker.active().unwrap().state, ViewState::Confirmed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_answer_from_earlier_open_of_same_message_ignored() {
        let api = Arc::new(FakeMailApi::new());
        api.set_viewed_delay(Duration::from_millis(2000));
        api.fail_viewed(Some(Failure::Network));
        let tracker = ViewTracker::new(api.clone(), logged_in());

        let first = tracker.set_active(message(7));
        tokio::task::yield_now().await;
        api.fail_viewed(None);
        api.set_viewed_delay(Duration::from_millis(10));
        let second = tracker.set_active(message(8));
        tokio::task::yield_now().await;
        let third = tracker.set_active(message(7));

        second.await.unwrap();
        third.await.unwrap();
        let active = tracker.active().unwrap();
        assert_eq!(active.message.mid, MessageId(7));
        assert_eq!(active.state, ViewState::Confirmed);

        first.await.unwrap();
        assert_eq!(tracker.active().unwrap().state, ViewState::Confirmed);
        assert_eq!(api.viewed_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_mark_viewed_false() {
        let api = Arc::new(FakeMailApi::new());
        let tracker = ViewTracker::new(api.clone(), logged_in());
        tracker.mark_viewed(MessageId(255), false).await.unwrap();
        assert_eq!(api.viewed_calls()[0].1, "ff");
        assert_eq!(api.viewed_calls()[0].2, "0");
    }

    #[tokio::test]
    async fn test_clear() {
        let api = Arc::new(FakeMailApi::new());
        let ids = logged_in();
        let tracker = ViewTracker::new(api, ids.clone());
        tracker.set_active(message(3)).await.unwrap();
        tracker.clear();
        assert!(tracker.active().is_none());
        assert_eq!(ids.message_id().value, "");
    }
}
