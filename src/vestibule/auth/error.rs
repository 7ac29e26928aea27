use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Why a login attempt was refused. No cookie is written for any of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Invalid or expired token.")]
    InvalidToken,
    #[error("Email not verified.")]
    EmailUnverified,
    #[error("This account doesn't have admin access.")]
    Forbidden,
}

impl LoginError {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::InvalidToken => "INVALID_TOKEN",
            Self::EmailUnverified => "EMAIL_UNVERIFIED",
            Self::Forbidden => "FORBIDDEN",
        }
    }

    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::EmailUnverified | Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginFailure {
    pub ok: bool,
    pub code: String,
    pub message: String,
}

impl From<LoginError> for LoginFailure {
    fn from(err: LoginError) -> Self {
        Self {
            ok: false,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for LoginError {
    fn into_response(self) -> Response {
        (self.status(), Json(LoginFailure::from(self))).into_response()
    }
}
