// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed-cookie sessions.
//!
//! The server keeps no session table. The whole session (identity plus
//! pending flash messages) is serialized into the cookie and authenticated
//! with HMAC-SHA256:
//!
//! ```text
//! imagecraft_session = base64url(json(session)) "." base64url(hmac_sha256(key, body))
//! ```
//!
//! A cookie that fails verification is ignored and the request is treated
//! as anonymous.

use std::fmt;

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "imagecraft_session";

/// Length of generated signing keys.
const GENERATED_KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session secret must not be empty")]
    EmptySecret,
    #[error("system random number generator failed")]
    Rng,
}

/// Severity of a flash message, used for styling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlashLevel {
    Info,
    Success,
    Error,
}

/// A one-shot message shown on the next rendered page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
    /// Optional same-site link rendered after the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Flash {
    pub fn new(level: FlashLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            link: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(FlashLevel::Error, message)
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// Identity of an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: u64,
    pub username: String,
}

/// Per-browser session state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    flashes: Vec<Flash>,
}

impl Session {
    /// Mark the session as authenticated.
    pub fn establish(&mut self, user_id: u64, username: impl Into<String>) {
        self.user_id = Some(user_id);
        self.username = Some(username.into());
    }

    /// Drop the authentication markers. Pending flashes survive.
    pub fn clear(&mut self) {
        self.user_id = None;
        self.username = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn user(&self) -> Option<SessionUser> {
        Some(SessionUser {
            user_id: self.user_id?,
            username: self.username.clone().unwrap_or_default(),
        })
    }

    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    /// Remove and return all pending flashes.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    pub fn flashes(&self) -> &[Flash] {
        &self.flashes
    }

    /// True when there is nothing worth persisting.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() && self.username.is_none() && self.flashes.is_empty()
    }
}

/// HMAC key used to sign and verify session cookies.
#[derive(Clone)]
pub struct SessionKey {
    mac: HmacSha256,
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl SessionKey {
    /// Build a key from a configured secret.
    pub fn from_secret(secret: &[u8]) -> Result<Self, SessionError> {
        if secret.is_empty() {
            return Err(SessionError::EmptySecret);
        }
        let mac = HmacSha256::new_from_slice(secret).map_err(|_| SessionError::EmptySecret)?;
        Ok(Self { mac })
    }

    /// Generate a random per-process key. Sessions do not survive restarts.
    pub fn generate() -> Result<Self, SessionError> {
        let mut secret = [0u8; GENERATED_KEY_LEN];
        SystemRandom::new()
            .fill(&mut secret)
            .map_err(|_| SessionError::Rng)?;
        Self::from_secret(&secret)
    }

    /// Serialize and sign a session into a cookie value.
    pub fn encode(&self, session: &Session) -> String {
        // Serializing plain data into a Vec cannot fail.
        let json = serde_json::to_vec(session).unwrap_or_default();
        let body = Base64UrlUnpadded::encode_string(&json);
        let tag = self.sign(body.as_bytes());
        format!("{body}.{}", Base64UrlUnpadded::encode_string(&tag))
    }

    /// Verify and deserialize a cookie value.
    pub fn decode(&self, value: &str) -> Option<Session> {
        let (body, tag) = value.split_once('.')?;
        let tag = Base64UrlUnpadded::decode_vec(tag).ok()?;

        let mut mac = self.mac.clone();
        mac.update(body.as_bytes());
        mac.verify_slice(&tag).ok()?;

        let json = Base64UrlUnpadded::decode_vec(body).ok()?;
        serde_json::from_slice(&json).ok()
    }

    /// `Set-Cookie` value storing `session`, or expiring the cookie when
    /// the session is empty.
    pub fn set_cookie(&self, session: &Session) -> String {
        if session.is_empty() {
            format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
        } else {
            format!(
                "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
                self.encode(session)
            )
        }
    }

    fn sign(&self, body: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Find the session cookie value in a `Cookie` header.
pub fn find_session_cookie(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SessionKey {
        SessionKey::from_secret(b"test-secret").unwrap()
    }

    fn alice() -> Session {
        let mut session = Session::default();
        session.establish(7, "alice");
        session
    }

    #[test]
    fn establish_and_clear() {
        let mut session = alice();
        assert!(session.is_authenticated());
        assert_eq!(
            session.user(),
            Some(SessionUser {
                user_id: 7,
                username: "alice".into()
            })
        );

        session.flash(Flash::info("Logged out successfully."));
        session.clear();
        assert!(!session.is_authenticated());
        assert_eq!(session.user(), None);
        assert_eq!(session.flashes().len(), 1);
    }

    #[test]
    fn flashes_are_consumed_once() {
        let mut session = Session::default();
        session.flash(Flash::error("No file part"));
        session.flash(Flash::success("done").with_link("/static/a.png"));

        let taken = session.take_flashes();
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[1].link.as_deref(), Some("/static/a.png"));
        assert!(session.take_flashes().is_empty());
        assert!(session.is_empty());
    }

    #[test]
    fn encoded_session_decodes_with_same_key() {
        let key = key();
        let mut session = alice();
        session.flash(Flash::success("Login successful!"));

        let cookie = key.encode(&session);
        assert_eq!(key.decode(&cookie), Some(session));
    }

    #[test]
    fn tampered_cookie_is_rejected() {
        let key = key();
        let cookie = key.encode(&alice());
        let (body, tag) = cookie.split_once('.').unwrap();

        let mut forged = Session::default();
        forged.establish(1, "admin");
        let forged_body = Base64UrlUnpadded::encode_string(&serde_json::to_vec(&forged).unwrap());

        assert_eq!(key.decode(&format!("{forged_body}.{tag}")), None);
        assert_eq!(key.decode(body), None);
        assert_eq!(key.decode(""), None);
        assert_eq!(key.decode("garbage.garbage"), None);
    }

    #[test]
    fn cookie_from_other_key_is_rejected() {
        let cookie = key().encode(&alice());
        let other = SessionKey::from_secret(b"another-secret").unwrap();
        assert_eq!(other.decode(&cookie), None);
    }

    #[test]
    fn generated_keys_differ() {
        let cookie = SessionKey::generate().unwrap().encode(&alice());
        assert_eq!(SessionKey::generate().unwrap().decode(&cookie), None);
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(matches!(
            SessionKey::from_secret(b""),
            Err(SessionError::EmptySecret)
        ));
    }

    #[test]
    fn set_cookie_expires_empty_sessions() {
        let key = key();
        let header = key.set_cookie(&Session::default());
        assert!(header.contains("Max-Age=0"));

        let header = key.set_cookie(&alice());
        assert!(header.starts_with("imagecraft_session="));
        assert!(header.contains("HttpOnly"));
    }

    #[test]
    fn session_cookie_is_found_among_others() {
        assert_eq!(
            find_session_cookie("theme=dark; imagecraft_session=abc.def; lang=en"),
            Some("abc.def")
        );
        assert_eq!(find_session_cookie("theme=dark"), None);
    }
}
