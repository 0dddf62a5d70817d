//! Backend REST API.
//!
//! This module is split into:
//! - `mod.rs` - The `MailApi` trait and query parameter type
//! - `client.rs` - reqwest implementation against the real server
//! - `error.rs` - Error taxonomy shared by every caller

mod client;
mod error;
#[cfg(test)]
pub mod fake;

use async_trait::async_trait;

use crate::mail::{Account, FolderPage, OutgoingMessage, PageRequest, SentMessage};

pub use client::HttpMailApi;
pub use error::{ApiError, ApiResult};

/// A `{name, value}` pair placed verbatim into a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParam {
    pub name: &'static str,
    pub value: String,
}

impl QueryParam {
    pub fn new(name: &'static str, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }

    pub fn pair(&self) -> (&'static str, String) {
        (self.name, self.value.clone())
    }
}

/// Everything the sync core asks of the server.
///
/// Scoping parameters come from the identifier resolver and are passed
/// through untouched; the server decides what an empty account id means.
#[async_trait]
pub trait MailApi: Send + Sync {
    /// `POST /login?email=`
    async fn login(&self, email: &str) -> ApiResult<Account>;

    /// `POST /logout`
    async fn logout(&self) -> ApiResult<()>;

    /// `GET /folder?accid=&folderid=&limit=&page=&sort=&sortorder=`
    async fn query_folder(
        &self,
        account: &QueryParam,
        folder: &QueryParam,
        page: &PageRequest,
    ) -> ApiResult<FolderPage>;

    /// `GET /accountList`
    async fn list_accounts(&self) -> ApiResult<Vec<Account>>;

    /// `POST /message?accid=`
    async fn create_message(
        &self,
        account: &QueryParam,
        message: &OutgoingMessage,
    ) -> ApiResult<SentMessage>;

    /// `PUT /message?accid=&msgid=&viewed=`
    async fn set_viewed(
        &self,
        account: &QueryParam,
        message: &QueryParam,
        viewed: &QueryParam,
    ) -> ApiResult<()>;
}
