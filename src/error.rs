// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;

/// Structured failure record returned by the token routes.
#[derive(Debug)]
pub struct ApiError {
    pub application: String,
    pub status: StatusCode,
    pub error_code: &'static str,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub application: String,
    pub http_status: u16,
    pub error_code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(
        application: impl Into<String>,
        status: StatusCode,
        error_code: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            application: application.into(),
            status,
            error_code,
            message: message.into(),
        }
    }

    /// Sanitized record for an authentication failure.
    pub fn from_auth(application: impl Into<String>, err: &AuthError) -> Self {
        Self::new(application, err.status_code(), err.error_code(), err.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            application: self.application,
            http_status: self.status.as_u16(),
            error_code: self.error_code.to_string(),
            message: self.message,
        });
        (self.status, body).into_response()
    }
}

/// `{status: "fail", error}` body used by `/kauth`.
#[derive(Debug, Serialize, ToSchema)]
pub struct FailResponse {
    pub status: String,
    pub error: String,
}

impl FailResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: "fail".to_string(),
            error: error.into(),
        }
    }
}

impl IntoResponse for FailResponse {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
