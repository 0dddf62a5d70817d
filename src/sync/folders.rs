//! Folder counter: per-folder total/unviewed counts.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::{debug, warn};

use crate::api::MailApi;
use crate::mail::{FolderCounts, FolderId, PageRequest};

use super::ids::IdResolver;

/// Outcome of one `refresh_counts` round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountsRefresh {
    pub updated: usize,
    pub malformed: usize,
    pub network_failures: usize,
}

impl CountsRefresh {
    /// Every request of the round failed at the network level.
    pub fn connection_lost(&self) -> bool {
        self.updated == 0 && self.malformed == 0 && self.network_failures > 0
    }
}

pub struct FolderCounter {
    api: Arc<dyn MailApi>,
    ids: IdResolver,
    counts: Mutex<[FolderCounts; FolderId::ALL.len()]>,
}

impl FolderCounter {
    pub fn new(api: Arc<dyn MailApi>, ids: IdResolver) -> Self {
        Self {
            api,
            ids,
            counts: Mutex::new([FolderCounts::default(); FolderId::ALL.len()]),
        }
    }

    fn lock(&self) -> MutexGuard<'_, [FolderCounts; FolderId::ALL.len()]> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> Vec<(FolderId, FolderCounts)> {
        let counts = self.lock();
        FolderId::ALL
            .into_iter()
            .map(|f| (f, counts[f.index() as usize]))
            .collect()
    }

    /// Last applied wins, per folder.
    pub fn apply(&self, folder: FolderId, counts: FolderCounts) {
        self.lock()[folder.index() as usize] = counts;
    }

    pub fn clear(&self) {
        *self.lock() = [FolderCounts::default(); FolderId::ALL.len()];
    }

    /// Ask every folder for its counts in parallel and apply each answer as
    /// it arrives. One failing folder does not hold back the others.
    pub async fn refresh_counts(&self) -> CountsRefresh {
        let mut outcome = CountsRefresh::default();
        if !self.ids.is_logged_in() {
            return outcome;
        }

        let account = self.ids.account_id();
        let probe = PageRequest::counts_probe();
        let (account, probe) = (&account, &probe);

        let mut pending: FuturesUnordered<_> = FolderId::ALL
            .into_iter()
            .map(|folder| async move {
                let param = IdResolver::folder_param(folder);
                (folder, self.api.query_folder(account, &param, probe).await)
            })
            .collect();

        while let Some((folder, result)) = pending.next().await {
            match result {
                Ok(page) => {
                    self.apply(folder, page.counts());
                    outcome.updated += 1;
                }
                Err(e) if e.is_malformed() => {
                    debug!("Ignoring unreadable counts for {}: {}", folder, e);
                    outcome.malformed += 1;
                }
                Err(e) => {
                    warn!("Folder count request for {} failed: {}", folder, e);
                    outcome.network_failures += 1;
                }
            }
        }

        outcome
    }
}
