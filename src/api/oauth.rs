// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token endpoints.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, rejection::QueryRejection, Query, State},
    http::{header::COOKIE, HeaderMap},
    Json,
};

use super::client_ip::ClientIp;
use crate::auth::verifier::{
    ClientCredentialsInput, KerberosTicketRequest, TicketInput, TrustedClientInput,
};
use crate::auth::{AuthError, TokenEnvelope, SESSION_COOKIE};
use crate::error::{ApiError, ErrorBody};
use crate::state::AppState;

fn reject(state: &AppState, err: AuthError) -> ApiError {
    ApiError::from_auth(state.application(), &err)
}

/// Value of the `auth-session` cookie, if present.
pub(crate) fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Issue a token on a client-credentials grant.
#[utoipa::path(
    get,
    path = "/oauth/token",
    tag = "OAuth",
    params(ClientCredentialsInput),
    responses(
        (status = 200, description = "Token issued", body = TokenEnvelope),
        (status = 400, description = "Grant rejected", body = ErrorBody),
    )
)]
pub async fn token(
    State(state): State<AppState>,
    query: Result<Query<ClientCredentialsInput>, QueryRejection>,
) -> Result<Json<TokenEnvelope>, ApiError> {
    let Query(input) = query.map_err(|e| reject(&state, AuthError::Unmarshal(e.body_text())))?;
    state
        .gateway
        .client_credentials(input)
        .await
        .map(Json)
        .map_err(|e| reject(&state, e))
}

/// Issue a token for a Kerberos ticket or an `auth-session` cookie.
#[utoipa::path(
    post,
    path = "/oauth/authorize",
    tag = "OAuth",
    request_body = KerberosTicketRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenEnvelope),
        (status = 400, description = "Credentials or scope rejected", body = ErrorBody),
        (status = 504, description = "Realm or directory timed out", body = ErrorBody),
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TokenEnvelope>, ApiError> {
    let body = body.map_err(|e| reject(&state, AuthError::Reader(e.body_text())))?;
    let request: KerberosTicketRequest = serde_json::from_slice(&body)
        .map_err(|e| reject(&state, AuthError::Unmarshal(e.to_string())))?;

    let input = TicketInput {
        request,
        session: session_cookie(&headers),
    };
    state
        .gateway
        .kerberos(input)
        .await
        .map(Json)
        .map_err(|e| reject(&state, e))
}

/// Issue a `read+write` token for a registered host.
#[utoipa::path(
    post,
    path = "/oauth/trusted",
    tag = "OAuth",
    request_body(content = String, description = "Encrypted assertion, base64 or raw", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Token issued", body = TokenEnvelope),
        (status = 400, description = "Assertion rejected", body = ErrorBody),
    )
)]
pub async fn trusted(
    State(state): State<AppState>,
    ClientIp(client_ip): ClientIp,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<TokenEnvelope>, ApiError> {
    let body = body.map_err(|e| reject(&state, AuthError::Reader(e.body_text())))?;
    let input = TrustedClientInput {
        body: body.to_vec(),
        client_ip,
    };
    state
        .gateway
        .trusted(input)
        .await
        .map(Json)
        .map_err(|e| reject(&state, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; auth-session=bob.1.sig; lang=en"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("bob.1.sig"));
    }

    #[test]
    fn no_session_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_cookie(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_cookie(&headers), None);
    }
}
