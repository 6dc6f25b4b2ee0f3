// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Storage Module
//!
//! Persistent state lives under a single data root:
//!
//! ```text
//! <data_dir>/
//!   users.redb        # Account database (users, email index, id counter)
//!   uploads/          # Staged uploads, named by sanitized client filename
//!   static/           # Processed artifacts, served under /static
//! ```
//!
//! Uploads and artifacts are plain files with no ownership tracking. They
//! are removed by the artifact sweeper once older than the configured TTL.

pub mod accounts;
pub mod password;
pub mod paths;

pub use accounts::{canonical_email, AccountError, AccountResult, AccountStore, User};
pub use password::{PasswordError, PasswordHasher};
pub use paths::StoragePaths;
