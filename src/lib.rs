// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Imagecraft - Image Conversion Web Service
//!
//! Signed-up users upload an image, pick one operation (grayscale, resize,
//! rotate, flip or a format conversion) and receive a link to the result.
//!
//! ## Modules
//!
//! - `api` - HTTP handlers and router (Axum)
//! - `auth` - Signed-cookie sessions and the login gate
//! - `imaging` - Upload intake, operation dispatch and artifact cleanup
//! - `pages` - Server-rendered HTML
//! - `storage` - Account database (redb) and data directory layout

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod imaging;
pub mod pages;
pub mod state;
pub mod storage;
