//! Sends drafts and starts replies on behalf of the signed-in account.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::MailApi;
use crate::mail::{ComposeError, Draft, MessageSummary, ReplyKind, SentMessage};

use super::ids::IdResolver;

pub struct Composer {
    api: Arc<dyn MailApi>,
    ids: IdResolver,
}

impl Composer {
    pub fn new(api: Arc<dyn MailApi>, ids: IdResolver) -> Self {
        Self { api, ids }
    }

    /// Reply to `original` as the signed-in account.
    pub fn reply_draft(&self, original: &MessageSummary, kind: ReplyKind) -> Draft {
        Draft::reply(original, &self.ids.account_email(), kind)
    }

    /// Post the draft. On success the body is cleared; on any failure the
    /// draft is left as typed so the user can retry.
    pub async fn send(&self, draft: &mut Draft) -> Result<SentMessage, ComposeError> {
        let result = self.try_send(draft).await;
        match &result {
            Ok(sent) => {
                info!("Message {} sent", sent.mid);
                draft.mark_sent();
            }
            Err(e) => {
                warn!("Send failed: {}", e);
                draft.mark_failed();
            }
        }
        result
    }

    async fn try_send(&self, draft: &Draft) -> Result<SentMessage, ComposeError> {
        let outgoing = draft.to_outgoing(&self.ids.account_email())?;
        let sent = self
            .api
            .create_message(&self.ids.account_id(), &outgoing)
            .await?;
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeMailApi, Failure, account};
    use crate::mail::MessageId;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;

    fn logged_in() -> IdResolver {
        let ids = IdResolver::new();
        ids.update(|s| {
            s.account = Some(account(6, "me@x.com"));
            s.logged_in = true;
        });
        ids
    }

    fn draft(to: &str, body: &str) -> Draft {
        Draft {
            to: to.to_string(),
            subject: "Hi".to_string(),
            body: body.to_string(),
            ..Draft::new()
        }
    }

    #[tokio::test]
    async fn test_send_clears_body() {
        let api = Arc::new(FakeMailApi::new());
        let composer = Composer::new(api.clone(), logged_in());
        let mut d = draft("a@x.com, b@x.com", "hello");

        let sent = composer.send(&mut d).await.unwrap();
        assert_eq!(sent.mid, MessageId(1));
        assert!(d.sent);
        assert!(d.body.is_empty());
        assert_eq!(d.to, "a@x.com, b@x.com");

        let out = &api.sent()[0];
        assert_eq!(out.sender_email, "me@x.com");
        assert_eq!(out.recipients, vec!["a@x.com", "b@x.com"]);
        assert_eq!(STANDARD.decode(&out.body).unwrap(), b"hello");
        assert_eq!(out.parent_mid, MessageId(0));
    }

    #[tokio::test]
    async fn test_failed_send_keeps_draft() {
        let api = Arc::new(FakeMailApi::new());
        api.fail_send(Some(Failure::Network));
        let composer = Composer::new(api.clone(), logged_in());
        let mut d = draft("a@x.com", "keep me");

        assert!(matches!(composer.send(&mut d).await, Err(ComposeError::Api(_))));
        assert!(!d.sent);
        assert_eq!(d.body, "keep me");
    }

    #[tokio::test]
    async fn test_no_recipients_never_hits_server() {
        let api = Arc::new(FakeMailApi::new());
        let composer = Composer::new(api.clone(), logged_in());
        let mut d = draft(" ", "text");

        assert!(matches!(
            composer.send(&mut d).await,
            Err(ComposeError::NoRecipients)
        ));
        assert!(api.sent().is_empty());
        assert_eq!(d.body, "text");
    }

    #[test]
    fn test_reply_uses_account_email() {
        let composer = Composer::new(Arc::new(FakeMailApi::new()), logged_in());
        let original = MessageSummary {
            mid: MessageId(5),
            sender_email: "a@x.com".to_string(),
            recipients: vec!["a@x.com".to_string(), "b@x.com".to_string()],
            subject: "Plans".to_string(),
            sent_at: None,
            is_viewed: true,
            body: String::new(),
        };
        let reply = composer.reply_draft(&original, ReplyKind::Reply);
        assert_eq!(reply.recipients(), vec!["me@x.com", "b@x.com"]);
        assert_eq!(reply.subject, "Re:Plans");
        assert_eq!(reply.parent, Some(MessageId(5)));
    }
}
