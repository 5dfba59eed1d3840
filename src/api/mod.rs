// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{AuthenticationKind, TokenClaims, TokenEnvelope},
    error::{ErrorBody, FailResponse},
    state::AppState,
};

pub mod client_ip;
pub mod health;
pub mod kauth;
pub mod oauth;

pub fn router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/oauth/token", get(oauth::token))
        .route("/oauth/authorize", post(oauth::authorize))
        .route("/oauth/trusted", post(oauth::trusted))
        .route("/kauth", get(kauth::kauth_query).post(kauth::kauth_form))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        oauth::token,
        oauth::authorize,
        oauth::trusted,
        kauth::kauth_query,
        kauth::kauth_form,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            TokenEnvelope,
            TokenClaims,
            AuthenticationKind,
            ErrorBody,
            FailResponse,
            kauth::KauthForm,
            kauth::KauthResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "OAuth", description = "Token issuance"),
        (name = "Kerberos", description = "Password login"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
