//! Compose buffer and reply helpers

use thiserror::Error;

use crate::constants::REPLY_PREFIX;

use super::types::{MessageId, MessageSummary, OutgoingMessage};

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("No recipients given")]
    NoRecipients,
    #[error(transparent)]
    Api(#[from] crate::api::ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Reply,
    ReplyAll,
}

/// The user's in-progress message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Comma or space separated recipient list, as typed
    pub to: String,
    pub subject: String,
    pub body: String,
    /// Set for replies
    pub parent: Option<MessageId>,
    /// Outcome of the last send attempt, for UI feedback
    pub sent: bool,
}

impl Draft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a reply to `original` from `my_email`.
    ///
    /// Reply and reply-all currently resolve to the same recipient set.
    pub fn reply(original: &MessageSummary, my_email: &str, kind: ReplyKind) -> Self {
        let recipients = match kind {
            ReplyKind::Reply | ReplyKind::ReplyAll => reply_recipients(original, my_email),
        };
        Self {
            to: recipients.join(", "),
            subject: reply_subject(&original.subject),
            body: String::new(),
            parent: Some(original.mid),
            sent: false,
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        parse_recipients(&self.to)
    }

    /// Build the wire message. Only an empty recipient list is rejected.
    pub fn to_outgoing(&self, sender_email: &str) -> Result<OutgoingMessage, ComposeError> {
        let recipients = self.recipients();
        if recipients.is_empty() {
            return Err(ComposeError::NoRecipients);
        }
        Ok(OutgoingMessage::new(
            self.parent,
            sender_email,
            recipients,
            &self.subject,
            &self.body,
        ))
    }

    /// Clear the body after a confirmed send
    pub fn mark_sent(&mut self) {
        self.body.clear();
        self.sent = true;
    }

    /// Keep everything the user typed
    pub fn mark_failed(&mut self) {
        self.sent = false;
    }
}

/// Split a recipient string on commas and whitespace, dropping empties.
pub fn parse_recipients(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(str::trim)
        .filter(|addr| !addr.is_empty())
        .map(str::to_string)
        .collect()
}

/// Prefix with "Re:" unless already prefixed.
pub fn reply_subject(subject: &str) -> String {
    if subject.starts_with(REPLY_PREFIX) {
        subject.to_string()
    } else {
        format!("{}{}", REPLY_PREFIX, subject)
    }
}

/// Original recipients with the original sender swapped for the replier.
pub fn reply_recipients(original: &MessageSummary, my_email: &str) -> Vec<String> {
    original
        .recipients
        .iter()
        .map(|addr| {
            if addr.eq_ignore_ascii_case(&original.sender_email) {
                my_email.to_string()
            } else {
                addr.clone()
            }
        })
        .collect()
}
