// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the on-disk data layout.

use std::path::{Path, PathBuf};

/// Default base directory for all persistent data.
pub const DATA_ROOT: &str = "./data";

/// File name of the embedded account database.
pub const ACCOUNTS_DB_FILE: &str = "users.redb";

/// Storage path utilities for the data directory.
///
/// The upload and output directories default to children of the root but
/// can be relocated independently (e.g. to put artifacts behind a CDN mount).
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
    uploads_dir: PathBuf,
    output_dir: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            uploads_dir: root.join("uploads"),
            output_dir: root.join("static"),
            root,
        }
    }

    /// Override the staging directory for incoming uploads.
    pub fn with_uploads_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.uploads_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Override the directory processed artifacts are written to.
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Account Paths ==========

    /// Path to the redb account database.
    pub fn accounts_db(&self) -> PathBuf {
        self.root.join(ACCOUNTS_DB_FILE)
    }

    // ========== Image Paths ==========

    /// Directory holding staged uploads.
    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Path to a staged upload.
    pub fn staged_upload(&self, filename: &str) -> PathBuf {
        self.uploads_dir.join(filename)
    }

    /// Directory holding processed artifacts (served under `/static`).
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path of the artifact named `<stem><suffix>`.
    pub fn artifact_path(&self, stem: &str, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{stem}{suffix}"))
    }

    /// Create every directory in the layout. Idempotent.
    pub fn ensure_layout(&self) -> std::io::Result<()> {
        for dir in [self.root.as_path(), &self.uploads_dir, &self.output_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
