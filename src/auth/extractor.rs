// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the session boundary.
//!
//! Both read the [`Session`] placed in the request extensions by
//! [`session_middleware`](super::middleware::session_middleware).
//!
//! ```rust,ignore
//! async fn edit(RequireUser(user): RequireUser, multipart: Multipart) -> Response {
//!     // only reached with an authenticated session
//! }
//! ```

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use super::session::{Session, SessionUser};
use crate::error::AppError;

/// The caller's session, anonymous if there is none.
///
/// Return `Extension(session)` from the handler to persist changes.
pub struct CurrentSession(pub Session);

impl<S: Send + Sync> FromRequestParts<S> for CurrentSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentSession(
            parts.extensions.get::<Session>().cloned().unwrap_or_default(),
        ))
    }
}

/// Extractor that requires an authenticated session.
///
/// Rejects with [`AppError::Unauthenticated`], which redirects to the login
/// page with a flash message before the request body is read.
pub struct RequireUser(pub SessionUser);

impl<S: Send + Sync> FromRequestParts<S> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .and_then(Session::user)
            .map(RequireUser)
            .ok_or(AppError::Unauthenticated)
    }
}
