use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ServerConfig;
use crate::mail::{Account, FolderPage, OutgoingMessage, PageRequest, SentMessage};

use super::{ApiError, ApiResult, MailApi, QueryParam};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// HTTP client for the messaging server. The endpoint is fixed at
/// construction; nothing reads it from global state.
#[derive(Clone)]
pub struct HttpMailApi {
    client: Client,
    endpoint: String,
}

impl HttpMailApi {
    pub fn new(config: &ServerConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// Check the status, then decode the body ourselves so that decode
    /// failures surface as `Parse` rather than as transport errors.
    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let text = Self::checked_text(response).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn checked_text(response: Response) -> ApiResult<String> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }
        Ok(response.text().await?)
    }
}

/// Query pairs for `GET /folder`, in the order the server documents them.
pub(crate) fn folder_query(
    account: &QueryParam,
    folder: &QueryParam,
    page: &PageRequest,
) -> Vec<(&'static str, String)> {
    vec![
        account.pair(),
        folder.pair(),
        ("limit", page.limit.to_string()),
        ("page", page.page.to_string()),
        ("sort", page.sort.wire_value().to_string()),
        ("sortorder", page.order.wire_value().to_string()),
    ]
}

#[async_trait]
impl MailApi for HttpMailApi {
    async fn login(&self, email: &str) -> ApiResult<Account> {
        debug!("POST /login email={}", email);
        let response = self
            .client
            .post(self.url("/login"))
            .query(&[("email", email)])
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .send()
            .await?;
        let account: Account = Self::decode(response).await?;
        Ok(account)
    }

    async fn logout(&self) -> ApiResult<()> {
        debug!("POST /logout");
        let response = self.client.post(self.url("/logout")).send().await?;
        Self::checked_text(response).await?;
        Ok(())
    }

    async fn query_folder(
        &self,
        account: &QueryParam,
        folder: &QueryParam,
        page: &PageRequest,
    ) -> ApiResult<FolderPage> {
        let query = folder_query(account, folder, page);
        debug!("GET /folder {:?}", query);
        let response = self
            .client
            .get(self.url("/folder"))
            .query(&query)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn list_accounts(&self) -> ApiResult<Vec<Account>> {
        let response = self.client.get(self.url("/accountList")).send().await?;
        Self::decode(response).await
    }

    async fn create_message(
        &self,
        account: &QueryParam,
        message: &OutgoingMessage,
    ) -> ApiResult<SentMessage> {
        debug!(
            "POST /message to {} recipient(s), parent {}",
            message.recipients.len(),
            message.parent_mid
        );
        let response = self
            .client
            .post(self.url("/message"))
            .query(&[account.pair()])
            .json(message)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn set_viewed(
        &self,
        account: &QueryParam,
        message: &QueryParam,
        viewed: &QueryParam,
    ) -> ApiResult<()> {
        let query = [account.pair(), message.pair(), viewed.pair()];
        debug!("PUT /message {:?}", query);
        let response = self
            .client
            .put(self.url("/message"))
            .query(&query)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .send()
            .await?;
        Self::checked_text(response).await?;
        Ok(())
    }
}
