//! Message lister: one page of the active folder.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::api::{ApiResult, MailApi, QueryParam};
use crate::mail::{FolderCounts, FolderId, MessageId, MessageSummary, PageRequest};

use super::ids::IdResolver;

/// What the local cache currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageListing {
    pub folder: FolderId,
    pub page: PageRequest,
    pub counts: FolderCounts,
    pub messages: Vec<MessageSummary>,
}

impl MessageListing {
    pub fn num_pages(&self) -> u32 {
        num_pages(self.counts.total, self.page.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListOutcome {
    /// The page was replaced from a good response
    Replaced {
        folder: FolderId,
        counts: FolderCounts,
    },
    /// Malformed response or logged out: the list is now empty
    Cleared,
}

/// `max(1, ceil(total / limit))`
pub fn num_pages(total: u32, limit: u32) -> u32 {
    if limit == 0 {
        return 1;
    }
    total.div_ceil(limit).max(1)
}

/// One-based page control value to a zero-based page index.
pub fn page_index_from_display(active_page: u32) -> u32 {
    active_page.saturating_sub(1)
}

struct ListState {
    page: PageRequest,
    listing: MessageListing,
}

pub struct MessageLister {
    api: Arc<dyn MailApi>,
    ids: IdResolver,
    state: Mutex<ListState>,
}

impl MessageLister {
    pub fn new(api: Arc<dyn MailApi>, ids: IdResolver, first_page: PageRequest) -> Self {
        Self {
            api,
            ids,
            state: Mutex::new(ListState {
                page: first_page,
                listing: MessageListing {
                    page: first_page,
                    ..Default::default()
                },
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn listing(&self) -> MessageListing {
        self.lock().listing.clone()
    }

    /// The page the next refresh will ask for.
    pub fn page(&self) -> PageRequest {
        self.lock().page
    }

    pub fn num_pages(&self) -> u32 {
        let state = self.lock();
        num_pages(state.listing.counts.total, state.page.limit)
    }

    pub fn set_page(&self, index: u32) {
        self.lock().page.page = index;
    }

    pub fn set_display_page(&self, active_page: u32) {
        self.set_page(page_index_from_display(active_page));
    }

    pub fn reset_page(&self) {
        self.set_page(0);
    }

    pub fn message(&self, mid: MessageId) -> Option<MessageSummary> {
        self.lock()
            .listing
            .messages
            .iter()
            .find(|m| m.mid == mid)
            .cloned()
    }

    /// Optimistically flip a cached row to viewed.
    pub fn mark_viewed_locally(&self, mid: MessageId) -> bool {
        let mut state = self.lock();
        match state.listing.messages.iter_mut().find(|m| m.mid == mid) {
            Some(msg) if !msg.is_viewed => {
                msg.is_viewed = true;
                true
            }
            _ => false,
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        let page = state.page;
        state.listing = MessageListing {
            page,
            ..Default::default()
        };
    }

    /// Refresh the current page of the selected folder.
    pub async fn refresh(&self) -> ApiResult<ListOutcome> {
        if !self.ids.is_logged_in() {
            self.clear();
            return Ok(ListOutcome::Cleared);
        }
        let account = self.ids.account_id();
        let folder = self.ids.folder();
        let page = self.page();
        self.refresh_messages(&account, folder, page).await
    }

    /// Fetch one page and replace the cached list with it.
    ///
    /// A network failure leaves the previous list in place and is returned
    /// so the caller can stop polling. An unreadable response empties the
    /// list.
    pub async fn refresh_messages(
        &self,
        account: &QueryParam,
        folder: FolderId,
        page: PageRequest,
    ) -> ApiResult<ListOutcome> {
        let param = IdResolver::folder_param(folder);
        match self.api.query_folder(account, &param, &page).await {
            Ok(response) => {
                let counts = response.reconciled_counts(&page);
                let messages = response.into_summaries();
                debug!(
                    "{} page {}: {} messages ({} total, {} unviewed)",
                    folder,
                    page.page,
                    messages.len(),
                    counts.total,
                    counts.unviewed
                );
                self.lock().listing = MessageListing {
                    folder,
                    page,
                    counts,
                    messages,
                };
                Ok(ListOutcome::Replaced { folder, counts })
            }
            Err(e) if e.is_malformed() => {
                warn!("Unreadable message list for {}: {}", folder, e);
                let mut state = self.lock();
                state.listing.folder = folder;
                state.listing.page = page;
                state.listing.messages.clear();
                Ok(ListOutcome::Cleared)
            }
            Err(e) => {
                warn!("Message list request for {} failed: {}", folder, e);
                Err(e)
            }
        }
    }
}
