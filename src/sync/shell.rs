//! The shell: session state, poller lifecycle and user actions.
//!
//! The shell owns the selection (account, folder, active message) and hands
//! read access to its children through the `IdResolver`. It starts the
//! folder-count and message pollers on login, the account directory poller
//! while composing, and cancels them all before logging out.

use std::sync::Arc;

use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{ApiError, ApiResult, MailApi};
use crate::config::{Config, PollingConfig};
use crate::mail::{
    Account, ComposeError, Draft, FolderCounts, FolderId, MessageId, ReplyKind, SentMessage,
};

use super::composer::Composer;
use super::directory::AccountDirectory;
use super::folders::FolderCounter;
use super::ids::{IdResolver, Selection};
use super::messages::{ListOutcome, MessageLister, MessageListing};
use super::scheduler::{PeriodicTask, Scheduler, Tick, TickFn, tick_fn};
use super::view::{ActiveMessage, ViewTracker};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Email address is empty")]
    EmptyEmail,
    #[error("Already logged in as {0}")]
    AlreadyLoggedIn(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Refresh the message list and push its counts into the folder counter
/// in the same step.
async fn refresh_listing(
    lister: &MessageLister,
    counter: &FolderCounter,
) -> ApiResult<ListOutcome> {
    let outcome = lister.refresh().await?;
    if let ListOutcome::Replaced { folder, counts } = outcome {
        counter.apply(folder, counts);
    }
    Ok(outcome)
}

fn counts_tick(counter: Arc<FolderCounter>) -> TickFn {
    tick_fn(move || {
        let counter = Arc::clone(&counter);
        async move {
            if counter.refresh_counts().await.connection_lost() {
                Tick::Stop
            } else {
                Tick::Continue
            }
        }
    })
}

fn messages_tick(lister: Arc<MessageLister>, counter: Arc<FolderCounter>) -> TickFn {
    tick_fn(move || {
        let lister = Arc::clone(&lister);
        let counter = Arc::clone(&counter);
        async move {
            match refresh_listing(&lister, &counter).await {
                Ok(_) => Tick::Continue,
                Err(_) => Tick::Stop,
            }
        }
    })
}

fn directory_tick(directory: Arc<AccountDirectory>) -> TickFn {
    tick_fn(move || {
        let directory = Arc::clone(&directory);
        async move {
            match directory.refresh().await {
                Ok(_) => Tick::Continue,
                Err(_) => Tick::Stop,
            }
        }
    })
}

pub struct Shell {
    api: Arc<dyn MailApi>,
    scheduler: Arc<dyn Scheduler>,
    polling: PollingConfig,
    ids: IdResolver,
    counter: Arc<FolderCounter>,
    lister: Arc<MessageLister>,
    view: ViewTracker,
    directory: Arc<AccountDirectory>,
    composer: Composer,
    counts_poller: Option<PeriodicTask>,
    message_poller: Option<PeriodicTask>,
    directory_poller: Option<PeriodicTask>,
}

impl Shell {
    pub fn new(api: Arc<dyn MailApi>, scheduler: Arc<dyn Scheduler>, config: &Config) -> Self {
        let ids = IdResolver::new();
        Self {
            counter: Arc::new(FolderCounter::new(Arc::clone(&api), ids.clone())),
            lister: Arc::new(MessageLister::new(
                Arc::clone(&api),
                ids.clone(),
                config.paging.first_page(),
            )),
            view: ViewTracker::new(Arc::clone(&api), ids.clone()),
            directory: Arc::new(AccountDirectory::new(Arc::clone(&api))),
            composer: Composer::new(Arc::clone(&api), ids.clone()),
            api,
            scheduler,
            polling: config.polling.clone(),
            ids,
            counts_poller: None,
            message_poller: None,
            directory_poller: None,
        }
    }

    // === Accessors ===

    pub fn selection(&self) -> Selection {
        self.ids.snapshot()
    }

    pub fn is_logged_in(&self) -> bool {
        self.ids.is_logged_in()
    }

    pub fn account(&self) -> Option<Account> {
        self.ids.snapshot().account
    }

    pub fn folder(&self) -> FolderId {
        self.ids.folder()
    }

    pub fn folder_counts(&self) -> Vec<(FolderId, FolderCounts)> {
        self.counter.snapshot()
    }

    pub fn listing(&self) -> MessageListing {
        self.lister.listing()
    }

    pub fn num_pages(&self) -> u32 {
        self.lister.num_pages()
    }

    pub fn active(&self) -> Option<ActiveMessage> {
        self.view.active()
    }

    pub fn directory(&self) -> &AccountDirectory {
        &self.directory
    }

    /// True while the message poller is scheduled.
    pub fn is_polling_messages(&self) -> bool {
        self.message_poller
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    pub fn is_polling_counts(&self) -> bool {
        self.counts_poller
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    // === Session ===

    pub async fn login(&mut self, email: &str) -> Result<Account, SessionError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(SessionError::EmptyEmail);
        }
        if let Some(current) = self.account()
            && self.is_logged_in()
        {
            return Err(SessionError::AlreadyLoggedIn(current.email));
        }

        let account = self.api.login(email).await.inspect_err(|e| {
            warn!("Login as {} failed: {}", email, e);
        })?;
        info!("Logged in as {} (account {})", account.email, account.id);

        let composing = self.ids.update(|s| {
            s.account = Some(account.clone());
            s.logged_in = true;
            s.active_message = None;
            s.composing
        });
        self.lister.reset_page();
        self.start_pollers();
        if composing {
            self.start_directory_poller().await;
        }

        // Errors already stopped the poller and were logged
        let _ = self.refresh_now().await;
        Ok(account)
    }

    /// Stop polling, tell the server, and forget everything session-scoped.
    /// Local state is cleared even when the server call fails.
    pub async fn logout(&mut self) -> ApiResult<()> {
        self.stop_pollers();
        if !self.is_logged_in() {
            return Ok(());
        }

        let result = self.api.logout().await;
        match &result {
            Ok(()) => info!("Logged out"),
            Err(e) => warn!("Logout request failed: {}", e),
        }

        self.ids.update(|s| {
            s.account = None;
            s.logged_in = false;
            s.active_message = None;
            s.composing = false;
        });
        self.lister.clear();
        self.lister.reset_page();
        self.counter.clear();
        self.view.clear();
        self.directory.clear();
        result
    }

    fn start_pollers(&mut self) {
        self.counts_poller = Some(self.scheduler.every(
            "folder-counts",
            self.polling.folder_counts_interval(),
            counts_tick(Arc::clone(&self.counter)),
        ));
        self.message_poller = Some(self.scheduler.every(
            "messages",
            self.polling.messages_interval(),
            messages_tick(Arc::clone(&self.lister), Arc::clone(&self.counter)),
        ));
    }

    fn stop_pollers(&mut self) {
        for poller in [
            self.counts_poller.take(),
            self.message_poller.take(),
            self.directory_poller.take(),
        ]
        .into_iter()
        .flatten()
        {
            tracing::debug!("Stopping {} poller", poller.name());
            poller.cancel();
        }
    }

    // === Navigation ===

    /// Refresh the message list now, outside the poll schedule. A network
    /// failure also stops the message poller.
    pub async fn refresh_now(&self) -> ApiResult<ListOutcome> {
        let result = refresh_listing(&self.lister, &self.counter).await;
        if result.is_err()
            && let Some(poller) = &self.message_poller
        {
            poller.cancel();
        }
        result
    }

    pub async fn select_folder(&mut self, folder: FolderId) -> ApiResult<ListOutcome> {
        self.close_compose();
        self.view.clear();
        self.ids.update(|s| s.folder = folder);
        self.lister.reset_page();
        self.refresh_now().await
    }

    /// `display_page` is one-based, as shown to the user.
    pub async fn change_page(&mut self, display_page: u32) -> ApiResult<ListOutcome> {
        self.lister.set_display_page(display_page);
        self.refresh_now().await
    }

    /// Open a message from the current page. Its row flips to viewed
    /// immediately; the server is told in the background.
    pub fn set_active(&self, mid: MessageId) -> Option<JoinHandle<()>> {
        let message = self.lister.message(mid)?;
        self.lister.mark_viewed_locally(mid);
        Some(self.view.set_active(message))
    }

    /// Open the message at `row` (zero-based) of the current page.
    pub fn set_active_row(&self, row: usize) -> Option<JoinHandle<()>> {
        let mid = self.lister.listing().messages.get(row)?.mid;
        self.set_active(mid)
    }

    pub async fn mark_viewed(&self, mid: MessageId, viewed: bool) -> ApiResult<()> {
        self.view.mark_viewed(mid, viewed).await
    }

    // === Compose ===

    pub async fn compose(&mut self) {
        if self.ids.update(|s| std::mem::replace(&mut s.composing, true)) {
            return;
        }
        if self.is_logged_in() {
            self.start_directory_poller().await;
        }
    }

    pub fn close_compose(&mut self) {
        self.ids.update(|s| s.composing = false);
        if let Some(poller) = self.directory_poller.take() {
            poller.cancel();
        }
    }

    async fn start_directory_poller(&mut self) {
        let poller = self.scheduler.every(
            "account-directory",
            self.polling.accounts_interval(),
            directory_tick(Arc::clone(&self.directory)),
        );
        if self.directory.refresh().await.is_err() {
            poller.cancel();
        }
        self.directory_poller = Some(poller);
    }

    /// A reply draft for the active message, if any.
    pub fn reply_draft(&self, kind: ReplyKind) -> Option<Draft> {
        let active = self.view.active()?;
        Some(self.composer.reply_draft(&active.message, kind))
    }

    pub async fn send(&self, draft: &mut Draft) -> Result<SentMessage, ComposeError> {
        self.composer.send(draft).await
    }
}
