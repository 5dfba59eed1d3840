// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `/kauth` password login.
//!
//! Accepts `name`/`password` as query parameters (GET) or form fields
//! (POST). On success it sets the signed `auth-session` cookie and returns
//! the issued token together with its decoded claims.

use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::{header::SET_COOKIE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::auth::session::SESSION_TTL_HOURS;
use crate::auth::{TokenClaims, TokenEnvelope, SESSION_COOKIE};
use crate::error::FailResponse;
use crate::state::AppState;

#[derive(Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct KauthForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

/// Token page data.
#[derive(Debug, Serialize, ToSchema)]
pub struct KauthResponse {
    #[serde(flatten)]
    pub token: TokenEnvelope,
    pub claims: TokenClaims,
}

/// `Set-Cookie` value for a signed session.
fn session_header(value: &str, expires: DateTime<Utc>) -> Option<HeaderValue> {
    let cookie = format!(
        "{SESSION_COOKIE}={value}; Path=/; Max-Age={}; Expires={}; HttpOnly; SameSite=Lax",
        SESSION_TTL_HOURS * 3600,
        expires.format("%a, %d %b %Y %H:%M:%S GMT"),
    );
    HeaderValue::from_str(&cookie).ok()
}

/// Malformed input gets the same `fail` body as a refused login.
fn malformed(detail: String) -> Response {
    warn!(error = %detail, "unreadable login request");
    FailResponse::new(detail).into_response()
}

async fn login(state: AppState, form: KauthForm) -> Response {
    let login = match state.gateway.password_login(form.name, form.password).await {
        Ok(login) => login,
        Err(e) => {
            let status = if e.is_server_fault() {
                e.status_code()
            } else {
                StatusCode::BAD_REQUEST
            };
            return (status, Json(FailResponse::new(e.message()))).into_response();
        }
    };

    let mut response = Json(KauthResponse {
        token: login.envelope,
        claims: login.claims,
    })
    .into_response();

    if let Some((value, expires)) = login.session {
        match session_header(&value, expires) {
            Some(header) => {
                response.headers_mut().insert(SET_COOKIE, header);
            }
            None => warn!("session cookie is not a valid header value"),
        }
    }
    response
}

/// Password login (query parameters).
#[utoipa::path(
    get,
    path = "/kauth",
    tag = "Kerberos",
    params(KauthForm),
    responses(
        (status = 200, description = "Logged in; sets auth-session", body = KauthResponse),
        (status = 400, description = "Login failed", body = FailResponse),
    )
)]
pub async fn kauth_query(
    State(state): State<AppState>,
    query: Result<Query<KauthForm>, QueryRejection>,
) -> Response {
    match query {
        Ok(Query(form)) => login(state, form).await,
        Err(e) => malformed(e.body_text()),
    }
}

/// Password login (form body).
#[utoipa::path(
    post,
    path = "/kauth",
    tag = "Kerberos",
    request_body(content = KauthForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logged in; sets auth-session", body = KauthResponse),
        (status = 400, description = "Login failed", body = FailResponse),
    )
)]
pub async fn kauth_form(
    State(state): State<AppState>,
    form: Result<Form<KauthForm>, FormRejection>,
) -> Response {
    match form {
        Ok(Form(form)) => login(state, form).await,
        Err(e) => malformed(e.body_text()),
    }
}
