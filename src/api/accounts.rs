// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signup, login and logout.
//!
//! Password hashing and redb transactions are blocking, so the store is
//! always called from `spawn_blocking`.

use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use utoipa::ToSchema;

use super::site::show;
use crate::{
    auth::{CurrentSession, Flash, Session},
    error::AppError,
    pages::{self, Page},
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[utoipa::path(
    get,
    path = "/signup",
    tag = "Accounts",
    responses((status = 200, description = "Signup form", content_type = "text/html", body = String))
)]
pub async fn signup_form(
    CurrentSession(session): CurrentSession,
) -> (Extension<Session>, Html<String>) {
    show(Page::Signup, session)
}

/// Register a new account and send the visitor to the login page.
#[utoipa::path(
    post,
    path = "/signup",
    tag = "Accounts",
    request_body(content = SignupForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Redirect to /login on success or duplicate email, /signup on missing fields")
    )
)]
pub async fn signup(
    CurrentSession(mut session): CurrentSession,
    State(state): State<AppState>,
    Form(form): Form<SignupForm>,
) -> Result<(Extension<Session>, Redirect), AppError> {
    let accounts = state.accounts.clone();
    let user = tokio::task::spawn_blocking(move || {
        accounts.create_user(&form.username, &form.email, &form.password)
    })
    .await??;

    tracing::info!(user_id = user.id, "Account created");
    session.flash(Flash::info("Signup successful! Please log in."));
    Ok((Extension(session), Redirect::to("/login")))
}

#[utoipa::path(
    get,
    path = "/login",
    tag = "Accounts",
    responses((status = 200, description = "Login form", content_type = "text/html", body = String))
)]
pub async fn login_form(
    CurrentSession(session): CurrentSession,
) -> (Extension<Session>, Html<String>) {
    show(Page::Login, session)
}

/// Verify credentials and establish the session.
///
/// A failed login re-renders the form in place instead of redirecting.
#[utoipa::path(
    post,
    path = "/login",
    tag = "Accounts",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, redirect to /"),
        (status = 200, description = "Invalid credentials, login form re-rendered", content_type = "text/html", body = String)
    )
)]
pub async fn login(
    CurrentSession(mut session): CurrentSession,
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let accounts = state.accounts.clone();
    let user = tokio::task::spawn_blocking(move || {
        accounts.find_by_email_and_password(&form.email, &form.password)
    })
    .await??;

    match user {
        Some(user) => {
            tracing::info!(user_id = user.id, "User logged in");
            session.establish(user.id, user.username);
            session.flash(Flash::info("Login successful!"));
            Ok((Extension(session), Redirect::to("/")).into_response())
        }
        None => {
            tracing::info!("Login rejected");
            let mut flashes = session.take_flashes();
            flashes.push(AppError::InvalidCredentials.flash());
            let html = pages::render(Page::Login, session.user().as_ref(), &flashes);
            Ok((Extension(session), html).into_response())
        }
    }
}

#[utoipa::path(
    get,
    path = "/logout",
    tag = "Accounts",
    responses((status = 303, description = "Session cleared, redirect to /"))
)]
pub async fn logout(
    CurrentSession(mut session): CurrentSession,
) -> (Extension<Session>, Redirect) {
    if let Some(user) = session.user() {
        tracing::info!(user_id = user.user_id, "User logged out");
    }
    session.clear();
    session.flash(Flash::info("Logged out successfully."));
    (Extension(session), Redirect::to("/"))
}
