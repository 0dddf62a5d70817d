//! Command execution against the shell

use crate::command::{CommandResult, ParsedCommand, available_commands};
use crate::mail::Draft;
use crate::mail::compose::parse_recipients;

use super::App;
use super::render::render_message;

impl App {
    pub(crate) async fn execute_command(&mut self, cmd: ParsedCommand) -> CommandResult {
        match cmd {
            ParsedCommand::Folder(folder) => {
                self.dirty = true;
                match self.shell.select_folder(folder).await {
                    Ok(_) => CommandResult::Success(String::new()),
                    Err(e) => CommandResult::Error(format!("Could not load {}: {}", folder, e)),
                }
            }
            ParsedCommand::Page(page) => {
                let pages = self.shell.num_pages();
                if page > pages {
                    return CommandResult::Error(format!("Only {} page(s)", pages));
                }
                self.dirty = true;
                match self.shell.change_page(page).await {
                    Ok(_) => CommandResult::Success(String::new()),
                    Err(e) => CommandResult::Error(format!("Could not load page {}: {}", page, e)),
                }
            }
            ParsedCommand::Open(row) => {
                let opened = row
                    .checked_sub(1)
                    .and_then(|index| self.shell.set_active_row(index));
                if opened.is_none() {
                    return CommandResult::Error(format!("No message at row {}", row));
                }
                match self.shell.active() {
                    Some(active) => CommandResult::Success(render_message(
                        &active,
                        &self.config.ui.date_format,
                    )),
                    None => CommandResult::Error(format!("No message at row {}", row)),
                }
            }
            ParsedCommand::Unread(row) => {
                let listing = self.shell.listing();
                let Some(mid) = row
                    .checked_sub(1)
                    .and_then(|index| listing.messages.get(index))
                    .map(|m| m.mid)
                else {
                    return CommandResult::Error(format!("No message at row {}", row));
                };
                match self.shell.mark_viewed(mid, false).await {
                    Ok(()) => CommandResult::Success(format!("Marked row {} unviewed", row)),
                    Err(e) => CommandResult::Error(format!("Could not mark unviewed: {}", e)),
                }
            }
            ParsedCommand::Reply { kind, body } => match self.shell.reply_draft(kind) {
                Some(mut draft) => {
                    draft.body = body;
                    self.send_draft(draft).await
                }
                None => CommandResult::Error("Open a message first (o <row>)".to_string()),
            },
            ParsedCommand::Compose => {
                if self.shell.selection().composing {
                    self.shell.close_compose();
                    CommandResult::Success("Compose mode off".to_string())
                } else {
                    self.shell.compose().await;
                    CommandResult::Success(format!(
                        "Compose mode on ({} known accounts)",
                        self.shell.directory().accounts().len()
                    ))
                }
            }
            ParsedCommand::Send { to, subject, body } => {
                let draft = Draft {
                    to: self.complete_recipients(&to),
                    subject,
                    body,
                    ..Draft::new()
                };
                self.send_draft(draft).await
            }
            ParsedCommand::Retry => match self.failed_draft.take() {
                Some(draft) => self.send_draft(draft).await,
                None => CommandResult::Error("Nothing to retry".to_string()),
            },
            ParsedCommand::Help => CommandResult::ShowHelp(available_commands()),
            ParsedCommand::Quit => CommandResult::Success(String::new()),
        }
    }

    /// In compose mode, a bare name that matches exactly one known account
    /// is replaced by that account's address.
    fn complete_recipients(&self, to: &str) -> String {
        if !self.shell.selection().composing {
            return to.to_string();
        }
        parse_recipients(to)
            .into_iter()
            .map(|addr| {
                if addr.contains('@') {
                    return addr;
                }
                match self.shell.directory().suggest(&addr).as_slice() {
                    [only] => only.email.clone(),
                    _ => addr,
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    async fn send_draft(&mut self, mut draft: Draft) -> CommandResult {
        match self.shell.send(&mut draft).await {
            Ok(sent) => {
                self.failed_draft = None;
                CommandResult::Success(format!("Sent message {}", sent.mid))
            }
            Err(e) => {
                self.failed_draft = Some(draft);
                CommandResult::Error(format!("Send failed: {}. Type retry to resend.", e))
            }
        }
    }
}
