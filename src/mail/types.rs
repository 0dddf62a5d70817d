use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PAGE_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl MessageId {
    /// Message ids travel as lowercase hex in query strings.
    pub fn to_hex(self) -> String {
        format!("{:x}", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "ID")]
    pub id: AccountId,
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "FirstName", default)]
    pub first_name: String,
    #[serde(rename = "LastName", default)]
    pub last_name: String,
}

impl Account {
    /// Full name, falling back to the email address
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }
}

/// The fixed set of folders every account owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FolderId {
    #[default]
    Inbox,
    Archive,
    Sent,
    Scheduled,
}

impl FolderId {
    pub const ALL: [FolderId; 4] = [Self::Inbox, Self::Archive, Self::Sent, Self::Scheduled];

    pub fn index(self) -> u8 {
        match self {
            Self::Inbox => 0,
            Self::Archive => 1,
            Self::Sent => 2,
            Self::Scheduled => 3,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Inbox),
            1 => Some(Self::Archive),
            2 => Some(Self::Sent),
            3 => Some(Self::Scheduled),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Inbox => "Inbox",
            Self::Archive => "Archive",
            Self::Sent => "Sent",
            Self::Scheduled => "Scheduled",
        }
    }

    /// Only received mail carries a viewed flag.
    pub fn tracks_viewed(self) -> bool {
        match self {
            Self::Inbox | Self::Archive => true,
            Self::Sent | Self::Scheduled => false,
        }
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FolderId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(index) = s.parse::<u8>() {
            return Self::from_index(index).ok_or_else(|| format!("Unknown folder id: {}", s));
        }
        Self::ALL
            .into_iter()
            .find(|f| f.display_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown folder: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Time,
    Subject,
    Sender,
}

impl SortKey {
    pub fn wire_value(self) -> u8 {
        match self {
            Self::Time => 0,
            Self::Subject => 1,
            Self::Sender => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

impl SortOrder {
    pub fn wire_value(self) -> i8 {
        match self {
            Self::Descending => -1,
            Self::Ascending => 1,
        }
    }
}

/// Query parameters for one page of a folder. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub sort: SortKey,
    pub order: SortOrder,
    pub limit: u32,
    /// Zero-based
    pub page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            sort: SortKey::default(),
            order: SortOrder::default(),
            limit: DEFAULT_PAGE_LIMIT,
            page: 0,
        }
    }
}

impl PageRequest {
    /// Smallest request that still returns the folder totals.
    pub fn counts_probe() -> Self {
        Self {
            sort: SortKey::Time,
            order: SortOrder::Descending,
            limit: 1,
            page: 0,
        }
    }

    /// Number of messages that precede this page in the folder.
    pub fn offset(&self) -> u32 {
        self.page.saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FolderCounts {
    pub total: u32,
    pub unviewed: u32,
}

/// Envelope returned by `GET /folder`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FolderPage {
    #[serde(rename = "NumTotal", default)]
    pub num_total: u32,
    #[serde(rename = "NumUnviewed", default)]
    pub num_unviewed: u32,
    #[serde(rename = "NumElems", default, skip_serializing_if = "Option::is_none")]
    pub num_elems: Option<u32>,
    #[serde(rename = "FolderName", default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,
    #[serde(rename = "QueriedAt", default, skip_serializing_if = "Option::is_none")]
    pub queried_at: Option<DateTime<FixedOffset>>,
    #[serde(rename = "Elems", default)]
    pub elems: Option<Vec<MessageEntry>>,
}

impl FolderPage {
    pub fn counts(&self) -> FolderCounts {
        FolderCounts {
            total: self.num_total,
            unviewed: self.num_unviewed,
        }
    }

    /// Counts adjusted so the total never undercounts what this page holds.
    pub fn reconciled_counts(&self, request: &PageRequest) -> FolderCounts {
        let fetched = self.elems.as_ref().map_or(0, |e| e.len()) as u32;
        let seen = request.offset().saturating_add(fetched);
        FolderCounts {
            total: self.num_total.max(seen),
            unviewed: self.num_unviewed,
        }
    }

    pub fn into_summaries(self) -> Vec<MessageSummary> {
        self.elems
            .unwrap_or_default()
            .into_iter()
            .map(MessageSummary::from)
            .collect()
    }
}

/// A folder row as the server sends it: `{Mid, IsViewed, M: {SentAt, M: {...}}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageEntry {
    #[serde(rename = "Mid", default)]
    pub mid: MessageId,
    #[serde(rename = "IsViewed", default)]
    pub is_viewed: bool,
    #[serde(rename = "M", default)]
    pub message: StoredMessage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(rename = "Mid", default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<MessageId>,
    #[serde(rename = "SentAt", default)]
    pub sent_at: Option<DateTime<FixedOffset>>,
    #[serde(rename = "M", default)]
    pub base: MessageBase,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageBase {
    #[serde(rename = "SenderEmail", default)]
    pub sender_email: String,
    #[serde(rename = "Recipients", default)]
    pub recipients: Option<Vec<String>>,
    #[serde(rename = "Subject", default)]
    pub subject: String,
    /// Base64, as the server encodes byte slices
    #[serde(rename = "Body", default)]
    pub body: Option<String>,
}

/// Flattened message row kept in the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    pub mid: MessageId,
    pub sender_email: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub sent_at: Option<DateTime<FixedOffset>>,
    pub is_viewed: bool,
    /// Base64-encoded body
    pub body: String,
}

impl MessageSummary {
    /// Decode the body for display. Invalid base64 yields None.
    pub fn decoded_body(&self) -> Option<String> {
        BASE64
            .decode(self.body.trim())
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    pub fn format_sent_at(&self, format: &str) -> String {
        self.sent_at
            .map(|dt| dt.format(format).to_string())
            .unwrap_or_default()
    }
}

impl From<MessageEntry> for MessageSummary {
    fn from(entry: MessageEntry) -> Self {
        let base = entry.message.base;
        Self {
            mid: entry.mid,
            sender_email: base.sender_email,
            recipients: base.recipients.unwrap_or_default(),
            subject: base.subject,
            sent_at: entry.message.sent_at,
            is_viewed: entry.is_viewed,
            body: base.body.unwrap_or_default(),
        }
    }
}

/// Body of `POST /message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    #[serde(rename = "ParentMid")]
    pub parent_mid: MessageId,
    #[serde(rename = "ScheduledAt")]
    pub scheduled_at: Option<DateTime<FixedOffset>>,
    #[serde(rename = "SenderEmail")]
    pub sender_email: String,
    #[serde(rename = "Recipients")]
    pub recipients: Vec<String>,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Body")]
    pub body: String,
}

impl OutgoingMessage {
    /// Build a message, base64-encoding the plain text body.
    pub fn new(
        parent: Option<MessageId>,
        sender_email: &str,
        recipients: Vec<String>,
        subject: &str,
        plain_body: &str,
    ) -> Self {
        Self {
            parent_mid: parent.unwrap_or_default(),
            scheduled_at: None,
            sender_email: sender_email.to_string(),
            recipients,
            subject: subject.to_string(),
            body: BASE64.encode(plain_body.as_bytes()),
        }
    }
}

/// The message echoed back after a successful `POST /message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SentMessage {
    #[serde(rename = "Mid", default)]
    pub mid: MessageId,
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOLDER_JSON: &str = r#"{
        "Requested": {"FolderIdx": 0},
        "QueriedAt": "2020-01-04T10:35:58.8690175-07:00",
        "FolderName": "Inbox",
        "NumTotal": 25,
        "NumUnviewed": 2,
        "NumElems": 1,
        "Elems": [{
            "Mid": 42,
            "ViewedAt": "0001-01-01T00:00:00Z",
            "IsViewed": false,
            "IsStarred": false,
            "M": {
                "Mid": 42,
                "Tid": 0,
                "SentAt": "2020-01-04T10:35:58.8690175-07:00",
                "SenderID": 7,
                "M": {
                    "ParentMid": 0,
                    "ScheduledAt": "0001-01-01T00:00:00Z",
                    "SenderEmail": "a@x.com",
                    "Recipients": ["b@x.com"],
                    "Subject": "Hello",
                    "Body": "aGVsbG8gd29ybGQ="
                }
            }
        }]
    }"#;

    #[test]
    fn test_decode_folder_page() {
        let page: FolderPage = serde_json::from_str(FOLDER_JSON).unwrap();
        assert_eq!(page.counts(), FolderCounts { total: 25, unviewed: 2 });
        assert_eq!(page.folder_name.as_deref(), Some("Inbox"));

        let summaries = page.into_summaries();
        assert_eq!(summaries.len(), 1);
        let msg = &summaries[0];
        assert_eq!(msg.mid, MessageId(42));
        assert_eq!(msg.sender_email, "a@x.com");
        assert_eq!(msg.recipients, vec!["b@x.com".to_string()]);
        assert!(!msg.is_viewed);
        assert_eq!(msg.decoded_body().as_deref(), Some("hello world"));
        assert_eq!(msg.format_sent_at("%Y-%m-%d %H:%M"), "2020-01-04 10:35");
    }

    #[test]
    fn test_null_elems_is_empty() {
        let page: FolderPage =
            serde_json::from_str(r#"{"NumTotal": 0, "NumUnviewed": 0, "Elems": null}"#).unwrap();
        assert!(page.into_summaries().is_empty());
    }

    #[test]
    fn test_reconciled_counts_never_undercount() {
        let mut page = FolderPage {
            num_total: 3,
            num_unviewed: 1,
            elems: Some(vec![MessageEntry::default(); 4]),
            ..Default::default()
        };
        let request = PageRequest {
            page: 1,
            ..Default::default()
        };
        assert_eq!(page.reconciled_counts(&request).total, 14);

        page.num_total = 40;
        assert_eq!(page.reconciled_counts(&request).total, 40);
    }

    #[test]
    fn test_outgoing_message_encodes_body() {
        let msg = OutgoingMessage::new(
            Some(MessageId(9)),
            "me@x.com",
            vec!["you@x.com".to_string()],
            "Re:Hi",
            "hello world",
        );
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["Body"], "aGVsbG8gd29ybGQ=");
        assert_eq!(json["ParentMid"], 9);
        assert!(json["ScheduledAt"].is_null());
        assert_eq!(json["Recipients"][0], "you@x.com");
    }

    #[test]
    fn test_folder_parsing() {
        assert_eq!("inbox".parse::<FolderId>(), Ok(FolderId::Inbox));
        assert_eq!("Scheduled".parse::<FolderId>(), Ok(FolderId::Scheduled));
        assert_eq!("2".parse::<FolderId>(), Ok(FolderId::Sent));
        assert!("4".parse::<FolderId>().is_err());
        assert!("drafts".parse::<FolderId>().is_err());
        for folder in FolderId::ALL {
            assert_eq!(FolderId::from_index(folder.index()), Some(folder));
        }
    }

    #[test]
    fn test_message_id_hex() {
        assert_eq!(MessageId(255).to_hex(), "ff");
        assert_eq!(MessageId(0).to_hex(), "0");
    }

    #[test]
    fn test_account_display_name() {
        let mut account = Account {
            id: AccountId(1),
            email: "a@x.com".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        };
        assert_eq!(account.display_name(), "a@x.com");
        account.first_name = "Ada".to_string();
        assert_eq!(account.display_name(), "Ada");
    }
}
