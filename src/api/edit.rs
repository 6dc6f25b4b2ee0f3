// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upload and process an image.
//!
//! The request is checked in a fixed order so that cheap rejections never
//! touch the disk:
//!
//! 1. session (via [`RequireUser`], before the body is read)
//! 2. presence of the `file` part and a non-empty filename
//! 3. the operation code
//! 4. extension allow-list and staging
//! 5. decode, transform, encode

use axum::{
    extract::{
        multipart::{Field, MultipartError},
        Multipart, State,
    },
    http::StatusCode,
    response::{Html, Redirect},
    Extension,
};
use utoipa::ToSchema;

use super::site::show;
use crate::{
    auth::{CurrentSession, Flash, RequireUser, Session},
    error::AppError,
    imaging::{IntakeError, Operation},
    pages::Page,
    state::AppState,
};

/// Multipart body accepted by `POST /edit`.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct EditUpload {
    /// Image file (png, webp, jpg, jpeg or gif).
    #[schema(value_type = String)]
    file: Vec<u8>,
    /// Operation code, e.g. `cgray` or `cresized`.
    operation: String,
}

#[utoipa::path(
    get,
    path = "/edit",
    tag = "Edit",
    responses(
        (status = 200, description = "Home page with the edit form", content_type = "text/html", body = String),
        (status = 303, description = "Not logged in, redirect to /login")
    )
)]
pub async fn edit_form(
    RequireUser(_user): RequireUser,
    CurrentSession(session): CurrentSession,
) -> (Extension<Session>, Html<String>) {
    show(Page::Home, session)
}

/// Stage the upload, apply the operation and flash a link to the artifact.
#[utoipa::path(
    post,
    path = "/edit",
    tag = "Edit",
    request_body(content = EditUpload, content_type = "multipart/form-data"),
    responses(
        (status = 303, description = "Redirect to / with a flash describing the outcome, or to /login without a session")
    )
)]
pub async fn edit(
    RequireUser(user): RequireUser,
    CurrentSession(mut session): CurrentSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(Extension<Session>, Redirect), AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut code: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("file") if file.is_none() => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = read_field(field).await?;
                file = Some((filename, bytes));
            }
            Some("operation") if code.is_none() => {
                code = Some(field.text().await.map_err(multipart_error)?);
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or(IntakeError::MissingFile)?;
    if filename.is_empty() {
        return Err(IntakeError::EmptyFilename.into());
    }
    let operation = Operation::from_code(code.as_deref().unwrap_or_default())?;

    let intake = state.intake.clone();
    let dispatcher = state.dispatcher.clone();
    let artifact = tokio::task::spawn_blocking(move || -> Result<_, AppError> {
        let staged = intake.stage(Some(&filename), &bytes)?;
        Ok(dispatcher.process(&staged.filename, operation)?)
    })
    .await??;

    let name = artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    tracing::info!(
        user_id = user.user_id,
        operation = %operation,
        artifact = %name,
        "Image processed"
    );

    session.flash(
        Flash::success("Your image has been processed and is available")
            .with_link(format!("/static/{name}")),
    );
    Ok((Extension(session), Redirect::to("/")))
}

async fn read_field(field: Field<'_>) -> Result<Vec<u8>, IntakeError> {
    Ok(field.bytes().await.map_err(multipart_error)?.to_vec())
}

fn multipart_error(error: MultipartError) -> IntakeError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IntakeError::TooLarge
    } else {
        IntakeError::Malformed(error.body_text())
    }
}
