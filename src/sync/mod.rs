//! Polling sync core.
//!
//! - `ids.rs` - Selection state and query parameter resolution
//! - `scheduler.rs` - Cancellable periodic tasks
//! - `folders.rs` - Per-folder counts
//! - `messages.rs` - The current page of the active folder
//! - `view.rs` - Active message and its viewed state
//! - `directory.rs` - Account directory for recipient suggestions
//! - `composer.rs` - Sending and replying
//! - `shell.rs` - Session lifecycle tying the above together

mod composer;
mod directory;
mod folders;
mod ids;
mod messages;
mod scheduler;
mod shell;
mod view;

pub use messages::MessageListing;
pub use scheduler::{Scheduler, TokioScheduler};
pub use shell::Shell;
pub use view::{ActiveMessage, ViewState};
