mod api;
mod app;
mod command;
mod config;
mod constants;
mod mail;
mod sync;

use anyhow::{Context, Result};
use std::env;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{HttpMailApi, MailApi};
use crate::app::App;
use crate::config::Config;

fn setup_logging() {
    use std::fs::OpenOptions;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tcmail=debug"));

    // Try to create a log file in the config directory
    let log_file = Config::config_dir()
        .ok()
        .and_then(|dir| std::fs::create_dir_all(&dir).ok().map(|_| dir))
        .map(|dir| dir.join("tcmail.log"))
        .and_then(|path| {
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&path)
                .ok()
        });

    if let Some(file) = log_file {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::sync::Mutex::new(file))
                    .with_ansi(false),
            )
            .init();
    } else {
        // Fallback to stderr if file logging fails
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_usage() {
    eprintln!(
        r#"tcmail - Polling client for the TC Messaging webmail service

Usage: tcmail <command>

Commands:
    watch <email>   Log in and follow folders; type help once running
    accounts        List every account known to the server
    config          Write a default configuration file
    help            Show this help message

Configuration file: ~/.config/tcmail/config.toml
Environment: TCMAIL_ENDPOINT overrides the server endpoint
"#
    );
}

async fn list_accounts(config: &Config) -> Result<()> {
    let api = HttpMailApi::new(&config.server).context("Failed to build HTTP client")?;
    let accounts = api
        .list_accounts()
        .await
        .with_context(|| format!("Failed to list accounts at {}", api.endpoint()))?;

    if accounts.is_empty() {
        println!("No accounts.");
    }
    for account in accounts {
        println!("{:>6}  {:<32}  {}", account.id, account.email, account.display_name());
    }
    Ok(())
}

fn write_default_config() -> Result<()> {
    let config_path = Config::config_path()?;
    if config_path.exists() {
        println!("Configuration already exists at {}", config_path.display());
        return Ok(());
    }
    let path = Config::default().save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("help") | Some("--help") | Some("-h") | None => {
            print_usage();
            Ok(())
        }
        Some("config") => write_default_config(),
        Some("accounts") => {
            setup_logging();
            let config = Config::load()?;
            list_accounts(&config).await
        }
        Some("watch") => {
            let Some(email) = args.get(2) else {
                eprintln!("Missing email address.");
                print_usage();
                std::process::exit(1);
            };
            setup_logging();

            let config = Config::load()?;
            config.ensure_dirs()?;

            let mut app = App::new(config)?;
            app.run(email).await
        }
        Some(cmd) => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
            std::process::exit(1);
        }
    }
}
