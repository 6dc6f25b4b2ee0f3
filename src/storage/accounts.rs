// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account store backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: user id → serialized [`User`]
//! - `users_by_email`: canonical email → user id (uniqueness index)
//! - `account_meta`: key → value (`next_user_id` counter)
//!
//! Emails are compared in canonical form: trimmed, NFKC-normalized and
//! lowercased. The record keeps the address as the user typed it.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use super::password::{PasswordError, PasswordHasher};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: user id → serialized User (JSON bytes).
const USERS: TableDefinition<u64, &[u8]> = TableDefinition::new("users");

/// Index: canonical email → user id.
const USERS_BY_EMAIL: TableDefinition<&str, u64> = TableDefinition::new("users_by_email");

/// Store metadata: key → u64.
const ACCOUNT_META: TableDefinition<&str, u64> = TableDefinition::new("account_meta");

const NEXT_USER_ID: &str = "next_user_id";

// =============================================================================
// Types
// =============================================================================

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Generated numeric identifier, starting at 1.
    pub id: u64,
    pub username: String,
    /// Email as entered at signup.
    pub email: String,
    /// PBKDF2 hash, never the plaintext password.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("an account with email {0} already exists")]
    DuplicateEmail(String),

    #[error("{0}")]
    Validation(&'static str),

    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    Password(#[from] PasswordError),
}

pub type AccountResult<T> = Result<T, AccountError>;

/// Canonical form of an email used for uniqueness and lookups.
pub fn canonical_email(email: &str) -> String {
    email.trim().nfkc().collect::<String>().to_lowercase()
}

// =============================================================================
// AccountStore
// =============================================================================

/// Persistent table of user accounts.
pub struct AccountStore {
    db: Database,
    hasher: PasswordHasher,
}

impl AccountStore {
    /// Open (or create) the account database at the given path.
    ///
    /// Creates all tables up front so read transactions never fail on a
    /// fresh database.
    pub fn open(path: &Path) -> AccountResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(USERS_BY_EMAIL)?;
            let _ = write_txn.open_table(ACCOUNT_META)?;
        }
        write_txn.commit()?;

        Ok(Self {
            db,
            hasher: PasswordHasher::default(),
        })
    }

    /// Replace the password hasher.
    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// Register a new user.
    ///
    /// Fails with [`AccountError::DuplicateEmail`] if the canonical email is
    /// already taken. The uniqueness check and the insert share one write
    /// transaction, so racing signups cannot create a second row.
    pub fn create_user(&self, username: &str, email: &str, password: &str) -> AccountResult<User> {
        let username = username.trim();
        let key = canonical_email(email);
        if username.is_empty() {
            return Err(AccountError::Validation("Username is required."));
        }
        if key.is_empty() {
            return Err(AccountError::Validation("Email is required."));
        }
        if password.is_empty() {
            return Err(AccountError::Validation("Password is required."));
        }

        // Hash outside the write transaction; redb serializes writers.
        let password_hash = self.hasher.hash(password)?;

        let write_txn = self.db.begin_write()?;
        let user = {
            let mut by_email = write_txn.open_table(USERS_BY_EMAIL)?;
            if by_email.get(key.as_str())?.is_some() {
                drop(by_email);
                write_txn.abort()?;
                return Err(AccountError::DuplicateEmail(email.trim().to_string()));
            }

            let mut meta = write_txn.open_table(ACCOUNT_META)?;
            let id = meta.get(NEXT_USER_ID)?.map(|v| v.value()).unwrap_or(1);
            meta.insert(NEXT_USER_ID, id + 1)?;

            let user = User {
                id,
                username: username.to_string(),
                email: email.trim().to_string(),
                password_hash,
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&user)?;

            let mut users = write_txn.open_table(USERS)?;
            users.insert(id, json.as_slice())?;
            by_email.insert(key.as_str(), id)?;
            user
        };
        write_txn.commit()?;

        Ok(user)
    }

    /// Look up a user by email.
    pub fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        let key = canonical_email(email);
        let read_txn = self.db.begin_read()?;
        let by_email = read_txn.open_table(USERS_BY_EMAIL)?;
        let Some(id) = by_email.get(key.as_str())?.map(|v| v.value()) else {
            return Ok(None);
        };

        let users = read_txn.open_table(USERS)?;
        match users.get(id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Look up a user by email and verify the password.
    ///
    /// Returns `None` for an unknown email and for a wrong password alike.
    pub fn find_by_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> AccountResult<Option<User>> {
        Ok(self
            .find_by_email(email)?
            .filter(|user| self.hasher.verify(password, &user.password_hash)))
    }

    /// Number of registered users.
    pub fn count(&self) -> AccountResult<u64> {
        let read_txn = self.db.begin_read()?;
        let users = read_txn.open_table(USERS)?;
        Ok(users.len()?)
    }
}

// =============================================================================
// Tests
// =============================================================================
