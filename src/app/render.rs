//! Plain-text rendering of shell state.
//!
//! Everything here is a pure function of a snapshot so the event loop can
//! compare frames and only print when something changed.

use std::fmt::Write;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::command::CommandHelp;
use crate::mail::{FolderCounts, FolderId, MessageSummary};
use crate::sync::{ActiveMessage, MessageListing, ViewState};

const SENDER_WIDTH: usize = 24;
const SUBJECT_WIDTH: usize = 40;

/// Cut `s` to at most `width` terminal columns, ending in `…` when cut.
fn truncate(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Truncate, then pad with spaces to exactly `width` columns.
fn fit(s: &str, width: usize) -> String {
    let mut out = truncate(s, width);
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat_n(' ', pad));
    out
}

/// `[Inbox 3/10]  Archive 0/20  Sent 7  Scheduled 2`
pub fn render_counts(counts: &[(FolderId, FolderCounts)], active: FolderId) -> String {
    counts
        .iter()
        .map(|(folder, c)| {
            let label = if folder.tracks_viewed() {
                format!("{} {}/{}", folder, c.unviewed, c.total)
            } else {
                format!("{} {}", folder, c.total)
            };
            if *folder == active {
                format!("[{}]", label)
            } else {
                label
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

pub fn render_row(row: usize, msg: &MessageSummary, date_format: &str) -> String {
    let marker = if msg.is_viewed { ' ' } else { '*' };
    format!(
        "{:>3} {} {}  {}  {}",
        row,
        marker,
        fit(&msg.sender_email, SENDER_WIDTH),
        fit(&msg.subject, SUBJECT_WIDTH),
        msg.format_sent_at(date_format),
    )
}

/// Folder header plus one line per message, rows numbered from 1.
pub fn render_listing(listing: &MessageListing, date_format: &str) -> String {
    let mut out = format!(
        "{} - page {}/{} ({} messages)\n",
        listing.folder,
        listing.page.page + 1,
        listing.num_pages(),
        listing.counts.total
    );
    if listing.messages.is_empty() {
        out.push_str("    (no messages)\n");
    }
    for (i, msg) in listing.messages.iter().enumerate() {
        let _ = writeln!(out, "{}", render_row(i + 1, msg, date_format));
    }
    out
}

pub fn render_message(active: &ActiveMessage, date_format: &str) -> String {
    let msg = &active.message;
    let status = match &active.state {
        ViewState::Pending => "marking viewed".to_string(),
        ViewState::Confirmed => "viewed".to_string(),
        ViewState::Failed(e) => format!("not marked viewed: {}", e),
    };
    let body = msg
        .decoded_body()
        .unwrap_or_else(|| "(body could not be decoded)".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "From:    {}", msg.sender_email);
    let _ = writeln!(out, "To:      {}", msg.recipients.join(", "));
    let _ = writeln!(out, "Date:    {}", msg.format_sent_at(date_format));
    let _ = writeln!(out, "Subject: {}", msg.subject);
    let _ = writeln!(out, "Status:  {}", status);
    out.push('\n');
    out.push_str(&body);
    out.push('\n');
    out
}

pub fn render_help(commands: &[CommandHelp]) -> String {
    let width = commands.iter().map(|c| c.name.len()).max().unwrap_or(0);
    commands
        .iter()
        .map(|c| format!("  {:<width$}  {}\n", c.name, c.description, width = width))
        .collect()
}
