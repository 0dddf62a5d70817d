//! Identifier resolver: turns shell selection state into query parameters.
//!
//! Children never see the parameter names; they ask the resolver for a
//! `QueryParam` and pass it through to the API untouched.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::api::QueryParam;
use crate::mail::{Account, FolderId, MessageId};

pub const ACCOUNT_ID_PARAM: &str = "accid";
pub const FOLDER_ID_PARAM: &str = "folderid";
pub const MESSAGE_ID_PARAM: &str = "msgid";
pub const VIEWED_PARAM: &str = "viewed";

/// Selection state owned by the shell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub account: Option<Account>,
    pub logged_in: bool,
    pub folder: FolderId,
    pub active_message: Option<MessageId>,
    pub composing: bool,
}

/// Shared read access to the shell's selection. Cloning is cheap and every
/// clone observes the same state.
#[derive(Debug, Clone, Default)]
pub struct IdResolver {
    selection: Arc<Mutex<Selection>>,
}

impl IdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mutate the selection. Only the shell calls this.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Selection) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn snapshot(&self) -> Selection {
        self.lock().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().logged_in
    }

    pub fn folder(&self) -> FolderId {
        self.lock().folder
    }

    pub fn account_email(&self) -> String {
        self.lock()
            .account
            .as_ref()
            .map(|a| a.email.clone())
            .unwrap_or_default()
    }

    /// Empty value when no account is set; the server rejects it.
    pub fn account_id(&self) -> QueryParam {
        let value = self
            .lock()
            .account
            .as_ref()
            .map(|a| a.id.to_string())
            .unwrap_or_default();
        QueryParam::new(ACCOUNT_ID_PARAM, value)
    }

    /// The active message id, or empty when nothing is active.
    pub fn message_id(&self) -> QueryParam {
        let value = self
            .lock()
            .active_message
            .map(MessageId::to_hex)
            .unwrap_or_default();
        QueryParam::new(MESSAGE_ID_PARAM, value)
    }

    pub fn folder_param(folder: FolderId) -> QueryParam {
        QueryParam::new(FOLDER_ID_PARAM, folder.index().to_string())
    }

    pub fn message_param(mid: MessageId) -> QueryParam {
        QueryParam::new(MESSAGE_ID_PARAM, mid.to_hex())
    }

    pub fn viewed_param(viewed: bool) -> QueryParam {
        QueryParam::new(VIEWED_PARAM, if viewed { "1" } else { "0" })
    }
}
