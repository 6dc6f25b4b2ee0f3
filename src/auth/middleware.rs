// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session cookie middleware.
//!
//! Decodes the session cookie before the handler runs and stores the
//! [`Session`] in the request extensions, where the extractors pick it up.
//! After the handler, the response may carry:
//!
//! - a replacement [`Session`] extension (login, logout, consumed flashes),
//! - a [`PendingFlash`] extension (error responses add one).
//!
//! If the resulting session differs from the incoming one, a fresh
//! `Set-Cookie` header is appended.

use axum::{
    extract::{Request, State},
    http::{
        header::{COOKIE, SET_COOKIE},
        HeaderValue,
    },
    middleware::Next,
    response::Response,
};

use super::session::{find_session_cookie, Flash, Session, SessionKey};
use crate::state::AppState;

/// A flash message attached to a response by code that cannot reach the
/// session directly (e.g. `IntoResponse` for errors).
#[derive(Debug, Clone)]
pub struct PendingFlash(pub Flash);

/// Read the session cookie from the request headers.
pub fn session_from_headers(key: &SessionKey, headers: &axum::http::HeaderMap) -> Session {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(find_session_cookie)
        .and_then(|value| key.decode(value))
        .unwrap_or_default()
}

/// Session middleware function.
///
/// Install with `axum::middleware::from_fn_with_state(state, session_middleware)`.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let incoming = session_from_headers(&state.session_key, request.headers());
    request.extensions_mut().insert(incoming.clone());

    let mut response = next.run(request).await;

    let mut session = response
        .extensions_mut()
        .remove::<Session>()
        .unwrap_or_else(|| incoming.clone());
    if let Some(PendingFlash(flash)) = response.extensions_mut().remove::<PendingFlash>() {
        session.flash(flash);
    }

    if session != incoming {
        match HeaderValue::from_str(&state.session_key.set_cookie(&session)) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => tracing::error!(error = %e, "Session cookie is not a valid header value"),
        }
    }

    response
}
