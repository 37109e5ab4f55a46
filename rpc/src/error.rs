//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use stakepgp_ledger::LedgerError;
use stakepgp_types::TypesError;
use stakepgp_verification::VerificationError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Verification(#[from] VerificationError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),
}

impl From<TypesError> for RpcError {
    fn from(e: TypesError) -> Self {
        RpcError::InvalidRequest(e.to_string())
    }
}

impl RpcError {
    /// The `error` field of the response body.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.name(),
            Self::Verification(e) => e.name(),
            Self::InvalidRequest(_) => "InvalidRequest",
            Self::Server(_) => "ServerError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(e) if e.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Ledger(LedgerError::OwnableUnauthorizedAccount(_)) => StatusCode::FORBIDDEN,
            Self::Ledger(_) | Self::Verification(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.name(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}
