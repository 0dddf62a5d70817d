//! Scripted in-memory backend for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::mail::types::AccountId;
use crate::mail::{Account, FolderId, FolderPage, OutgoingMessage, PageRequest, SentMessage};

use super::{ApiError, ApiResult, MailApi, QueryParam};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Network,
    Malformed,
}

impl Failure {
    fn to_error(self) -> ApiError {
        match self {
            Self::Network => ApiError::Status {
                status: 503,
                body: "connection refused".to_string(),
            },
            Self::Malformed => ApiError::Parse("expected value at line 1 column 1".to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FolderCall {
    pub account: String,
    pub folder: FolderId,
    pub page: PageRequest,
}

#[derive(Default)]
struct FakeState {
    login: Option<Result<Account, Failure>>,
    logout_fails: bool,
    folders: HashMap<FolderId, Result<FolderPage, Failure>>,
    folder_delays: HashMap<FolderId, Duration>,
    accounts: Option<Result<Vec<Account>, Failure>>,
    send: Option<Failure>,
    viewed: Option<Failure>,
    viewed_delay: Duration,

    login_calls: usize,
    logout_calls: usize,
    folder_calls: Vec<FolderCall>,
    account_calls: usize,
    sent: Vec<OutgoingMessage>,
    viewed_calls: Vec<(String, String, String)>,
}

#[derive(Default)]
pub struct FakeMailApi {
    state: Mutex<FakeState>,
}

pub fn account(id: u64, email: &str) -> Account {
    Account {
        id: AccountId(id),
        email: email.to_string(),
        first_name: String::new(),
        last_name: String::new(),
    }
}

impl FakeMailApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_login(self, result: Result<Account, Failure>) -> Self {
        self.lock().login = Some(result);
        self
    }

    pub fn set_folder(&self, folder: FolderId, result: Result<FolderPage, Failure>) {
        self.lock().folders.insert(folder, result);
    }

    pub fn set_folder_delay(&self, folder: FolderId, delay: Duration) {
        self.lock().folder_delays.insert(folder, delay);
    }

    pub fn set_accounts(&self, result: Result<Vec<Account>, Failure>) {
        self.lock().accounts = Some(result);
    }

    pub fn fail_send(&self, failure: Option<Failure>) {
        self.lock().send = failure;
    }

    pub fn fail_viewed(&self, failure: Option<Failure>) {
        self.lock().viewed = failure;
    }

    pub fn set_viewed_delay(&self, delay: Duration) {
        self.lock().viewed_delay = delay;
    }

    pub fn fail_logout(&self) {
        self.lock().logout_fails = true;
    }

    pub fn login_calls(&self) -> usize {
        self.lock().login_calls
    }

    pub fn logout_calls(&self) -> usize {
        self.lock().logout_calls
    }

    pub fn folder_calls(&self) -> Vec<FolderCall> {
        self.lock().folder_calls.clone()
    }

    /// Folder queries that asked for more than the counts probe.
    pub fn listing_calls(&self) -> Vec<FolderCall> {
        self.lock()
            .folder_calls
            .iter()
            .filter(|c| c.page != PageRequest::counts_probe())
            .cloned()
            .collect()
    }

    pub fn account_calls(&self) -> usize {
        self.lock().account_calls
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.lock().sent.clone()
    }

    pub fn viewed_calls(&self) -> Vec<(String, String, String)> {
        self.lock().viewed_calls.clone()
    }
}

#[async_trait]
impl MailApi for FakeMailApi {
    async fn login(&self, email: &str) -> ApiResult<Account> {
        let mut state = self.lock();
        state.login_calls += 1;
        match state.login.clone() {
            Some(Ok(account)) => Ok(account),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Ok(account(1, email)),
        }
    }

    async fn logout(&self) -> ApiResult<()> {
        let mut state = self.lock();
        state.logout_calls += 1;
        if state.logout_fails {
            return Err(Failure::Network.to_error());
        }
        Ok(())
    }

    async fn query_folder(
        &self,
        account: &QueryParam,
        folder: &QueryParam,
        page: &PageRequest,
    ) -> ApiResult<FolderPage> {
        let folder_id = folder
            .value
            .parse::<FolderId>()
            .map_err(|e| ApiError::Status {
                status: 404,
                body: e,
            })?;
        let (result, delay) = {
            let mut state = self.lock();
            state.folder_calls.push(FolderCall {
                account: account.value.clone(),
                folder: folder_id,
                page: *page,
            });
            let result = state
                .folders
                .get(&folder_id)
                .cloned()
                .unwrap_or_else(|| Ok(FolderPage::default()));
            let delay = state
                .folder_delays
                .get(&folder_id)
                .copied()
                .unwrap_or_default();
            (result, delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result.map_err(Failure::to_error)
    }

    async fn list_accounts(&self) -> ApiResult<Vec<Account>> {
        let mut state = self.lock();
        state.account_calls += 1;
        state
            .accounts
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
            .map_err(Failure::to_error)
    }

    async fn create_message(
        &self,
        _account: &QueryParam,
        message: &OutgoingMessage,
    ) -> ApiResult<SentMessage> {
        let mut state = self.lock();
        if let Some(failure) = state.send {
            return Err(failure.to_error());
        }
        state.sent.push(message.clone());
        Ok(SentMessage {
            mid: crate::mail::MessageId(state.sent.len() as u64),
        })
    }

    async fn set_viewed(
        &self,
        account: &QueryParam,
        message: &QueryParam,
        viewed: &QueryParam,
    ) -> ApiResult<()> {
        let (failure, delay) = {
            let mut state = self.lock();
            state.viewed_calls.push((
                account.value.clone(),
                message.value.clone(),
                viewed.value.clone(),
            ));
            (state.viewed, state.viewed_delay)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match failure {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}
