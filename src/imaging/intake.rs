// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upload intake: extension allow-list, filename sanitization and staging.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use unicode_normalization::UnicodeNormalization;

use super::IntakeError;
use crate::storage::StoragePaths;

/// Extensions accepted for upload (compared lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "webp", "jpg", "jpeg", "gif"];

const WINDOWS_DEVICE_FILES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// A validated upload written to the staging directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpload {
    /// Sanitized filename, relative to the staging directory.
    pub filename: String,
    /// Lowercased extension of `filename`.
    pub extension: String,
    pub path: PathBuf,
}

/// Lowercased text after the last dot, if the name has one.
pub fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Whether a filename carries an allowed image extension.
pub fn allowed_file(filename: &str) -> bool {
    file_extension(filename).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

/// Reduce a client-supplied filename to a safe, flat ASCII name.
///
/// Path components collapse into the name itself, so the result can be
/// joined onto a directory without escaping it. May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename.nfkd().filter(char::is_ascii).collect();
    let flattened = ascii.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let filtered: String = joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let trimmed = filtered.trim_matches(|c| c == '.' || c == '_');

    let device = trimmed.split('.').next().unwrap_or_default();
    if WINDOWS_DEVICE_FILES
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(device))
    {
        format!("_{trimmed}")
    } else {
        trimmed.to_string()
    }
}

/// Validates and stages uploads under the configured directory.
#[derive(Debug, Clone)]
pub struct UploadIntake {
    uploads_dir: PathBuf,
}

impl UploadIntake {
    pub fn new(paths: &StoragePaths) -> Self {
        Self {
            uploads_dir: paths.uploads_dir().to_path_buf(),
        }
    }

    /// Validate and write an upload, returning its sanitized name.
    ///
    /// `filename` is `None` when the form had no file part. Nothing is
    /// written unless every check passes. An existing file with the same
    /// sanitized name is replaced.
    pub fn stage(&self, filename: Option<&str>, bytes: &[u8]) -> Result<StagedUpload, IntakeError> {
        let original = filename.ok_or(IntakeError::MissingFile)?;
        if original.is_empty() {
            return Err(IntakeError::EmptyFilename);
        }
        if !allowed_file(original) {
            return Err(IntakeError::DisallowedExtension(
                file_extension(original).unwrap_or_default(),
            ));
        }

        let sanitized = secure_filename(original);
        let Some(extension) = file_extension(&sanitized).filter(|_| allowed_file(&sanitized))
        else {
            return Err(IntakeError::InvalidFilename(original.to_string()));
        };

        fs::create_dir_all(&self.uploads_dir)?;
        let path = self.uploads_dir.join(&sanitized);

        // Write beside the target and rename so readers never see a partial file.
        let temp_path = self
            .uploads_dir
            .join(format!(".{sanitized}.{}.part", uuid::Uuid::new_v4()));
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            writer.write_all(bytes)?;
            writer.flush()?;
        }
        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }

        tracing::debug!(filename = %sanitized, bytes = bytes.len(), "Staged upload");

        Ok(StagedUpload {
            filename: sanitized,
            extension,
            path,
        })
    }
}
