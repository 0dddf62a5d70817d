//! Command types and parsing for the line-driven watch mode

use crate::mail::{FolderId, ReplyKind};

/// Result of command execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Success(String),
    Error(String),
    ShowHelp(Vec<CommandHelp>),
}

/// Help information for a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHelp {
    pub name: &'static str,
    pub description: &'static str,
}

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedCommand {
    Folder(FolderId),
    /// One-based page number
    Page(u32),
    /// One-based row on the current page
    Open(usize),
    /// One-based row to mark unviewed
    Unread(usize),
    Reply { kind: ReplyKind, body: String },
    Compose,
    Send {
        to: String,
        subject: String,
        body: String,
    },
    /// Resend the last draft that failed
    Retry,
    Help,
    Quit,
}

fn parse_number<T: std::str::FromStr>(arg: &str, what: &str) -> Result<T, String> {
    arg.trim()
        .parse()
        .map_err(|_| format!("Expected a {} number, got '{}'", what, arg.trim()))
}

fn parse_row(arg: &str) -> Result<usize, String> {
    match parse_number::<usize>(arg, "row")? {
        0 => Err("Rows start at 1".to_string()),
        row => Ok(row),
    }
}

/// Parse a command line into a ParsedCommand
pub fn parse_command(input: &str) -> Result<ParsedCommand, String> {
    let trimmed = input.trim();
    let (cmd, rest) = trimmed
        .split_once(char::is_whitespace)
        .map_or((trimmed, ""), |(cmd, rest)| (cmd, rest.trim()));

    match cmd {
        "f" | "folder" => rest.parse().map(ParsedCommand::Folder),
        "p" | "page" => match parse_number::<u32>(rest, "page")? {
            0 => Err("Pages start at 1".to_string()),
            page => Ok(ParsedCommand::Page(page)),
        },
        "o" | "open" => parse_row(rest).map(ParsedCommand::Open),
        "u" | "unread" => parse_row(rest).map(ParsedCommand::Unread),
        "r" | "reply" => Ok(ParsedCommand::Reply {
            kind: ReplyKind::Reply,
            body: rest.to_string(),
        }),
        "ra" | "replyall" | "reply-all" => Ok(ParsedCommand::Reply {
            kind: ReplyKind::ReplyAll,
            body: rest.to_string(),
        }),
        "c" | "compose" => Ok(ParsedCommand::Compose),
        "send" => {
            let mut parts = rest.splitn(3, '|').map(str::trim);
            let to = parts.next().unwrap_or_default();
            let subject = parts.next().unwrap_or_default();
            let body = parts.next().unwrap_or_default();
            if to.is_empty() {
                return Err("Usage: send <to> | <subject> | <body>".to_string());
            }
            Ok(ParsedCommand::Send {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            })
        }
        "retry" => Ok(ParsedCommand::Retry),
        "help" | "h" | "?" => Ok(ParsedCommand::Help),
        "q" | "quit" => Ok(ParsedCommand::Quit),
        "" => Err("Empty command".to_string()),
        other => Err(format!(
            "Unknown command: {}. Type help for available commands.",
            other
        )),
    }
}

/// Get all available commands for help display
pub fn available_commands() -> Vec<CommandHelp> {
    vec![
        CommandHelp {
            name: "f <folder>",
            description: "Switch to inbox, archive, sent or scheduled",
        },
        CommandHelp {
            name: "p <n>",
            description: "Show page n of the current folder",
        },
        CommandHelp {
            name: "o <row>",
            description: "Open a message and mark it viewed",
        },
        CommandHelp {
            name: "u <row>",
            description: "Mark a message unviewed",
        },
        CommandHelp {
            name: "r <text>",
            description: "Reply to the open message",
        },
        CommandHelp {
            name: "ra <text>",
            description: "Reply to everyone on the open message",
        },
        CommandHelp {
            name: "c",
            description: "Toggle compose mode (loads recipient suggestions)",
        },
        CommandHelp {
            name: "send <to> | <subject> | <body>",
            description: "Send a new message",
        },
        CommandHelp {
            name: "retry",
            description: "Resend the last message that failed to send",
        },
        CommandHelp {
            name: "help",
            description: "Show this help message",
        },
        CommandHelp {
            name: "q",
            description: "Log out and exit",
        },
    ]
}
