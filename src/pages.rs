// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server-rendered HTML pages.
//!
//! Every page shares one layout: navigation, the pending flash messages and
//! a page-specific body. All dynamic text goes through [`escape`].

use std::fmt::Write;

use axum::response::Html;

use crate::auth::{Flash, FlashLevel, SessionUser};
use crate::imaging::{Operation, ALLOWED_EXTENSIONS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    About,
    How,
    Contact,
    Signup,
    Login,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Imagecraft",
            Page::About => "About",
            Page::How => "How it works",
            Page::Contact => "Contact",
            Page::Signup => "Sign up",
            Page::Login => "Log in",
        }
    }
}

/// Render `page` for the given visitor, consuming nothing.
///
/// Callers are responsible for removing the rendered flashes from the
/// session.
pub fn render(page: Page, user: Option<&SessionUser>, flashes: &[Flash]) -> Html<String> {
    let mut html = String::with_capacity(4096);
    let _ = write!(
        html,
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n</head>\n<body>\n",
        escape(page.title())
    );
    render_nav(&mut html, user);
    render_flashes(&mut html, flashes);
    html.push_str("<main>\n");
    match page {
        Page::Home => render_home(&mut html, user),
        Page::About => html.push_str(ABOUT),
        Page::How => render_how(&mut html),
        Page::Contact => html.push_str(CONTACT),
        Page::Signup => html.push_str(SIGNUP_FORM),
        Page::Login => html.push_str(LOGIN_FORM),
    }
    html.push_str("</main>\n</body>\n</html>\n");
    Html(html)
}

/// Minimal HTML escaping for text and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_nav(html: &mut String, user: Option<&SessionUser>) {
    html.push_str(
        "<nav>\n<a href=\"/\">Home</a>\n<a href=\"/about\">About</a>\n\
         <a href=\"/how\">How</a>\n<a href=\"/contact\">Contact</a>\n",
    );
    match user {
        Some(user) => {
            let _ = writeln!(
                html,
                "<span>Signed in as {}</span>\n<a href=\"/logout\">Log out</a>",
                escape(&user.username)
            );
        }
        None => html.push_str("<a href=\"/login\">Log in</a>\n<a href=\"/signup\">Sign up</a>\n"),
    }
    html.push_str("</nav>\n");
}

fn render_flashes(html: &mut String, flashes: &[Flash]) {
    if flashes.is_empty() {
        return;
    }
    html.push_str("<ul class=\"flashes\">\n");
    for flash in flashes {
        let class = match flash.level {
            FlashLevel::Info => "info",
            FlashLevel::Success => "success",
            FlashLevel::Error => "error",
        };
        let _ = write!(html, "<li class=\"{class}\">{}", escape(&flash.message));
        if let Some(link) = &flash.link {
            let _ = write!(
                html,
                " <a href=\"{}\" target=\"_blank\">here</a>",
                escape(link)
            );
        }
        html.push_str("</li>\n");
    }
    html.push_str("</ul>\n");
}

fn render_home(html: &mut String, user: Option<&SessionUser>) {
    html.push_str("<h1>Imagecraft</h1>\n<p>Convert, resize, rotate and flip images.</p>\n");
    if user.is_none() {
        html.push_str(
            "<p><a href=\"/signup\">Sign up</a> or <a href=\"/login\">log in</a> to edit images.</p>\n",
        );
    }

    let accept = ALLOWED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{ext}"))
        .collect::<Vec<_>>()
        .join(",");
    let _ = write!(
        html,
        "<form method=\"post\" action=\"/edit\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\"{accept}\" required>\n\
         <select name=\"operation\">\n"
    );
    for operation in Operation::ALL {
        let _ = writeln!(
            html,
            "<option value=\"{}\">{}</option>",
            operation.code(),
            escape(operation.label())
        );
    }
    html.push_str("</select>\n<button type=\"submit\">Edit</button>\n</form>\n");
}

fn render_how(html: &mut String) {
    html.push_str(
        "<h1>How it works</h1>\n<ol>\n<li>Create an account and log in.</li>\n\
         <li>Pick an image and an operation on the home page.</li>\n\
         <li>Follow the link to download the result.</li>\n</ol>\n\
         <p>Accepted uploads:",
    );
    for ext in ALLOWED_EXTENSIONS {
        let _ = write!(html, " .{ext}");
    }
    html.push_str("</p>\n<dl>\n");
    for operation in Operation::ALL {
        let _ = writeln!(
            html,
            "<dt><code>{}</code></dt><dd>{}</dd>",
            operation.code(),
            escape(operation.label())
        );
    }
    html.push_str("</dl>\n");
}

const ABOUT: &str = "<h1>About</h1>\n\
<p>Imagecraft is a small image editing service. Uploads and results are \
deleted automatically after a while.</p>\n";

const CONTACT: &str = "<h1>Contact</h1>\n\
<p>Questions or problems? Open an issue on the project tracker.</p>\n";

const SIGNUP_FORM: &str = "<h1>Sign up</h1>\n\
<form method=\"post\" action=\"/signup\">\n\
<label>Username <input type=\"text\" name=\"username\" required></label>\n\
<label>Email <input type=\"email\" name=\"email\" required></label>\n\
<label>Password <input type=\"password\" name=\"password\" required></label>\n\
<button type=\"submit\">Sign up</button>\n\
</form>\n";

const LOGIN_FORM: &str = "<h1>Log in</h1>\n\
<form method=\"post\" action=\"/login\">\n\
<label>Email <input type=\"email\" name=\"email\" required></label>\n\
<label>Password <input type=\"password\" name=\"password\" required></label>\n\
<button type=\"submit\">Log in</button>\n\
</form>\n";
