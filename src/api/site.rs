// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{response::Html, Extension};

use crate::auth::{CurrentSession, Session};
use crate::pages::{self, Page};

/// Render a page and consume the pending flashes it shows.
pub(crate) fn show(page: Page, mut session: Session) -> (Extension<Session>, Html<String>) {
    let flashes = session.take_flashes();
    let html = pages::render(page, session.user().as_ref(), &flashes);
    (Extension(session), html)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Pages",
    responses((status = 200, description = "Home page with the edit form", content_type = "text/html", body = String))
)]
pub async fn home(CurrentSession(session): CurrentSession) -> (Extension<Session>, Html<String>) {
    show(Page::Home, session)
}

#[utoipa::path(
    get,
    path = "/about",
    tag = "Pages",
    responses((status = 200, description = "About page", content_type = "text/html", body = String))
)]
pub async fn about(CurrentSession(session): CurrentSession) -> (Extension<Session>, Html<String>) {
    show(Page::About, session)
}

#[utoipa::path(
    get,
    path = "/how",
    tag = "Pages",
    responses((status = 200, description = "Usage instructions and the list of operations", content_type = "text/html", body = String))
)]
pub async fn how(CurrentSession(session): CurrentSession) -> (Extension<Session>, Html<String>) {
    show(Page::How, session)
}

#[utoipa::path(
    get,
    path = "/contact",
    tag = "Pages",
    responses((status = 200, description = "Contact page", content_type = "text/html", body = String))
)]
pub async fn contact(CurrentSession(session): CurrentSession) -> (Extension<Session>, Html<String>) {
    show(Page::Contact, session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Flash;

    #[tokio::test]
    async fn pages_consume_flashes() {
        let mut session = Session::default();
        session.flash(Flash::info("Logged out successfully."));

        let (Extension(session), Html(body)) = home(CurrentSession(session)).await;

        assert!(body.contains("Logged out successfully."));
        assert!(session.flashes().is_empty());
    }

    #[tokio::test]
    async fn about_renders_for_anonymous_visitors() {
        let (Extension(session), Html(body)) = about(CurrentSession(Session::default())).await;
        assert!(body.contains("<h1>About</h1>"));
        assert!(session.is_empty());
    }
}
