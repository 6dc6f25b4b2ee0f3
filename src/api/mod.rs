// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{auth::session_middleware, state::AppState};

pub mod accounts;
pub mod edit;
pub mod health;
pub mod site;

pub fn router(state: AppState) -> Router {
    let artifacts = ServeDir::new(state.config.paths.output_dir());
    let body_limit = state.config.max_upload_bytes;

    let site_routes = Router::new()
        .route("/", get(site::home))
        .route("/about", get(site::about))
        .route("/how", get(site::how))
        .route("/contact", get(site::contact))
        .route(
            "/signup",
            get(accounts::signup_form).post(accounts::signup),
        )
        .route("/login", get(accounts::login_form).post(accounts::login))
        .route("/logout", get(accounts::logout))
        .route("/edit", get(edit::edit_form).post(edit::edit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness));

    Router::new()
        .merge(site_routes)
        .merge(health_routes)
        .nest_service("/static", artifacts)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi(
    paths(
        site::home,
        site::about,
        site::how,
        site::contact,
        accounts::signup_form,
        accounts::signup,
        accounts::login_form,
        accounts::login,
        accounts::logout,
        edit::edit_form,
        edit::edit,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            accounts::SignupForm,
            accounts::LoginForm,
            edit::EditUpload,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Pages", description = "Informational pages"),
        (name = "Accounts", description = "Signup, login and logout"),
        (name = "Edit", description = "Image upload and processing"),
        (name = "Health", description = "Liveness and readiness checks")
    )
)]
struct ApiDoc;
