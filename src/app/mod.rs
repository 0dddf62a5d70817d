//! Watch mode - drives a `Shell` from stdin commands and prints its state

mod actions;
mod event_loop;
pub mod render;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::api::{HttpMailApi, MailApi};
use crate::config::Config;
use crate::mail::Draft;
use crate::sync::{Scheduler, Shell, TokioScheduler};

pub struct App {
    pub(crate) config: Config,
    pub(crate) shell: Shell,
    /// Last printed frame; nothing is printed while it stays the same
    pub(crate) last_frame: String,
    /// Last draft that failed to send, kept so nothing typed is lost
    pub(crate) failed_draft: Option<Draft>,
    pub(crate) dirty: bool,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let api = HttpMailApi::new(&config.server).context("Failed to build HTTP client")?;
        tracing::info!("Using backend at {}", api.endpoint());
        Ok(Self::with_backend(config, Arc::new(api), Arc::new(TokioScheduler)))
    }

    pub fn with_backend(
        config: Config,
        api: Arc<dyn MailApi>,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let shell = Shell::new(api, scheduler, &config);
        Self {
            config,
            shell,
            last_frame: String::new(),
            failed_draft: None,
            dirty: true,
        }
    }

    pub async fn run(&mut self, email: &str) -> Result<()> {
        let account = self
            .shell
            .login(email)
            .await
            .with_context(|| format!("Login as {} failed", email))?;
        println!(
            "Logged in as {} <{}>. Type help for commands.",
            account.display_name(),
            account.email
        );

        let result = self.event_loop().await;

        if let Err(e) = self.shell.logout().await {
            eprintln!("Logout failed: {}", e);
        }
        println!("Logged out.");

        result
    }
}
