//! Account directory used for recipient suggestions while composing.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::api::{ApiResult, MailApi};
use crate::mail::Account;

pub struct AccountDirectory {
    api: Arc<dyn MailApi>,
    accounts: Mutex<Vec<Account>>,
}

impl AccountDirectory {
    pub fn new(api: Arc<dyn MailApi>) -> Self {
        Self {
            api,
            accounts: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Replace the directory. Returns how many accounts are known.
    /// An unreadable answer empties it; a network failure is returned.
    pub async fn refresh(&self) -> ApiResult<usize> {
        match self.api.list_accounts().await {
            Ok(accounts) => {
                let count = accounts.len();
                debug!("Account directory has {} entries", count);
                *self.lock() = accounts;
                Ok(count)
            }
            Err(e) if e.is_malformed() => {
                warn!("Unreadable account list: {}", e);
                self.clear();
                Ok(0)
            }
            Err(e) => {
                warn!("Account list request failed: {}", e);
                Err(e)
            }
        }
    }

    /// Accounts whose email or name starts with `prefix`, case-insensitive.
    pub fn suggest(&self, prefix: &str) -> Vec<Account> {
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Vec::new();
        }
        self.lock()
            .iter()
            .filter(|a| {
                a.email.to_lowercase().starts_with(&prefix)
                    || a.first_name.to_lowercase().starts_with(&prefix)
                    || a.last_name.to_lowercase().starts_with(&prefix)
            })
            .cloned()
            .collect()
    }
}
