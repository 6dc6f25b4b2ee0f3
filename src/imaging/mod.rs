// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Image Pipeline
//!
//! Upload intake, operation parsing and the dispatcher that turns a staged
//! upload into a processed artifact. Decoding, transforms and most encoders
//! come from the `image` crate. PDF wrapping is done in [`pdf`].
//!
//! Everything here is synchronous and blocking; HTTP handlers call into it
//! from `spawn_blocking`.

pub mod dispatch;
pub mod intake;
pub mod operation;
pub mod pdf;
pub mod sweeper;

pub use dispatch::Dispatcher;
pub use intake::{StagedUpload, UploadIntake, ALLOWED_EXTENSIONS};
pub use operation::{Operation, ReencodeFormat};
pub use sweeper::ArtifactSweeper;

/// Upload validation failures.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error("no file part in request")]
    MissingFile,

    #[error("no file selected")]
    EmptyFilename,

    #[error("file extension {0:?} is not allowed")]
    DisallowedExtension(String),

    #[error("filename {0:?} is not usable after sanitization")]
    InvalidFilename(String),

    #[error("upload exceeds the size limit")]
    TooLarge,

    #[error("malformed upload: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Processing failures. None of them leave an artifact behind.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("invalid operation {0:?}")]
    InvalidOperation(String),

    #[error("image could not be loaded: {0}")]
    Decode(#[source] image::ImageError),

    #[error("format .{0} is not supported for encoding")]
    UnsupportedFormat(String),

    #[error("image could not be encoded as .{extension}: {source}")]
    Encode {
        extension: String,
        #[source]
        source: image::ImageError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
