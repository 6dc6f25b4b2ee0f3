// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::SessionKey;
use crate::config::AppConfig;
use crate::imaging::{Dispatcher, UploadIntake};
use crate::storage::{AccountError, AccountStore, PasswordHasher};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to prepare data directories: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open account store: {0}")]
    Account(#[from] AccountError),
}

/// Everything a request handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub accounts: Arc<AccountStore>,
    pub session_key: SessionKey,
    pub intake: Arc<UploadIntake>,
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Create the data layout and open the account store.
    pub fn new(config: AppConfig, session_key: SessionKey) -> Result<Self, StateError> {
        Self::with_hasher(config, session_key, PasswordHasher::default())
    }

    /// Same as [`AppState::new`] with an explicit password hasher.
    pub fn with_hasher(
        config: AppConfig,
        session_key: SessionKey,
        hasher: PasswordHasher,
    ) -> Result<Self, StateError> {
        config.paths.ensure_layout()?;
        let accounts = AccountStore::open(&config.paths.accounts_db())?.with_hasher(hasher);

        Ok(Self {
            intake: Arc::new(UploadIntake::new(&config.paths)),
            dispatcher: Arc::new(Dispatcher::new(&config.paths)),
            accounts: Arc::new(accounts),
            session_key,
            config: Arc::new(config),
        })
    }
}
