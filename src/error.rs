// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request-boundary error type.
//!
//! Every failure a handler can hit ends the same way: a flash message on the
//! session and a redirect. Internal failures are logged and shown as a
//! generic message; the process never aborts on a request error.

use axum::{
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use crate::auth::{Flash, PendingFlash};
use crate::imaging::{DispatchError, IntakeError};
use crate::storage::AccountError;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("authentication required")]
    Unauthenticated,

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl AppError {
    /// Message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Intake(e) => match e {
                IntakeError::MissingFile => "No file part".to_string(),
                IntakeError::EmptyFilename => "No selected file".to_string(),
                IntakeError::DisallowedExtension(_) => {
                    "File type not allowed. Upload a PNG, WebP, JPG, JPEG or GIF image.".to_string()
                }
                IntakeError::InvalidFilename(_) => "Invalid file name.".to_string(),
                IntakeError::TooLarge => "File is too large.".to_string(),
                IntakeError::Malformed(_) => "The upload could not be read.".to_string(),
                IntakeError::Io(_) => GENERIC_FAILURE.to_string(),
            },
            AppError::Dispatch(e) => match e {
                DispatchError::InvalidOperation(_) => "Invalid operation!".to_string(),
                DispatchError::Decode(_) => "Error loading image!".to_string(),
                DispatchError::UnsupportedFormat(ext) => {
                    format!("Converting to .{ext} is not supported.")
                }
                DispatchError::Encode { extension, .. } => {
                    format!("The image could not be converted to .{extension}.")
                }
                DispatchError::Io(_) => GENERIC_FAILURE.to_string(),
            },
            AppError::Account(e) => match e {
                AccountError::DuplicateEmail(_) => "Email already exists. Please log in.".to_string(),
                AccountError::Validation(message) => (*message).to_string(),
                _ => GENERIC_FAILURE.to_string(),
            },
            AppError::InvalidCredentials => "Invalid credentials. Please try again.".to_string(),
            AppError::Unauthenticated => "You must sign up or log in first!".to_string(),
            AppError::Task(_) => GENERIC_FAILURE.to_string(),
        }
    }

    /// Page the user is sent back to.
    pub fn redirect_target(&self) -> &'static str {
        match self {
            AppError::Unauthenticated | AppError::InvalidCredentials => "/login",
            AppError::Account(AccountError::DuplicateEmail(_)) => "/login",
            AppError::Account(AccountError::Validation(_)) => "/signup",
            _ => "/",
        }
    }

    /// Whether this is a server-side fault rather than a user mistake.
    pub fn is_internal(&self) -> bool {
        match self {
            AppError::Intake(IntakeError::Io(_)) | AppError::Dispatch(DispatchError::Io(_)) => {
                true
            }
            AppError::Account(e) => !matches!(
                e,
                AccountError::DuplicateEmail(_) | AccountError::Validation(_)
            ),
            AppError::Task(_) => true,
            _ => false,
        }
    }

    pub fn flash(&self) -> Flash {
        Flash::error(self.user_message())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::info!(error = %self, "Request rejected");
        }

        let flash = self.flash();
        (
            Extension(PendingFlash(flash)),
            Redirect::to(self.redirect_target()),
        )
            .into_response()
    }
}
