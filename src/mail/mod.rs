pub mod compose;
pub mod types;

pub use compose::{ComposeError, Draft, ReplyKind};
pub use types::{
    Account, FolderCounts, FolderId, FolderPage, MessageId, MessageSummary,
    OutgoingMessage, PageRequest, SentMessage, SortKey, SortOrder,
};
