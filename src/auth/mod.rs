// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Boundary
//!
//! Identity of the current caller for the lifetime of a browser session.
//!
//! ## Flow
//!
//! 1. `POST /login` verifies credentials against the account store
//! 2. The handler calls [`Session::establish`] and returns the session
//! 3. [`middleware::session_middleware`] signs it into the cookie
//! 4. Later requests decode the cookie; [`RequireUser`] gates `/edit`
//!
//! ## Security
//!
//! - Cookies are HMAC-SHA256 signed; tampered cookies are ignored
//! - Cookies are `HttpOnly` and `SameSite=Lax`
//! - There is no server-side expiry or rotation

pub mod extractor;
pub mod middleware;
pub mod session;

pub use extractor::{CurrentSession, RequireUser};
pub use middleware::{session_middleware, PendingFlash};
pub use session::{Flash, FlashLevel, Session, SessionError, SessionKey, SessionUser};
