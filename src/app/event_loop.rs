//! Main event loop: stdin commands, Ctrl-C and periodic redraws

use anyhow::Result;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::command::{CommandResult, ParsedCommand, parse_command};
use crate::constants::RENDER_INTERVAL_MS;

use super::App;
use super::render::{render_counts, render_help, render_listing};

/// What the loop does after one read from stdin.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Continue,
    Quit,
    Closed,
}

impl App {
    pub(crate) async fn event_loop(&mut self) -> Result<()> {
        let mut lines = Some(BufReader::new(tokio::io::stdin()).lines());
        let mut redraw = tokio::time::interval(Duration::from_millis(RENDER_INTERVAL_MS));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("Interrupted");
                    break;
                }
                line = async {
                    match lines.as_mut() {
                        Some(lines) => lines.next_line().await,
                        None => std::future::pending().await,
                    }
                } => {
                    match self.handle_line(line).await {
                        Input::Continue => {}
                        Input::Quit => break,
                        Input::Closed => {
                            // stdin closed; keep watching until Ctrl-C
                            tracing::debug!("stdin closed");
                            lines = None;
                        }
                    }
                }
                _ = redraw.tick() => {}
            }

            self.redraw();
        }

        Ok(())
    }

    /// Run one line of input. A line that cannot be read is reported and
    /// skipped; only end of input stops reading.
    pub(crate) async fn handle_line(&mut self, line: io::Result<Option<String>>) -> Input {
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => return Input::Closed,
            Err(e) => {
                tracing::warn!("Skipping unreadable input line: {}", e);
                print_result(&CommandResult::Error(format!("Could not read input: {}", e)));
                return Input::Continue;
            }
        };
        if line.trim().is_empty() {
            return Input::Continue;
        }
        match parse_command(&line) {
            Ok(ParsedCommand::Quit) => Input::Quit,
            Ok(cmd) => {
                let result = self.execute_command(cmd).await;
                print_result(&result);
                Input::Continue
            }
            Err(e) => {
                print_result(&CommandResult::Error(e));
                Input::Continue
            }
        }
    }

    /// Print the counts line and current page when they changed or a
    /// command asked for it.
    pub(crate) fn redraw(&mut self) {
        let frame = self.frame();
        if self.dirty || frame != self.last_frame {
            println!("{}", frame);
            self.last_frame = frame;
            self.dirty = false;
        }
    }

    pub(crate) fn frame(&self) -> String {
        let mut frame = format!(
            "{}\n{}",
            render_counts(&self.shell.folder_counts(), self.shell.folder()),
            render_listing(&self.shell.listing(), &self.config.ui.date_format)
        );
        if !self.shell.is_polling_messages() || !self.shell.is_polling_counts() {
            frame.push_str("(server unreachable, polling stopped)\n");
        }
        frame
    }
}

fn print_result(result: &CommandResult) {
    match result {
        CommandResult::Success(msg) if msg.is_empty() => {}
        CommandResult::Success(msg) => println!("{}", msg),
        CommandResult::Error(msg) => eprintln!("error: {}", msg),
        CommandResult::ShowHelp(commands) => print!("{}", render_help(commands)),
    }
}
