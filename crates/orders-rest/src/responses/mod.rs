//! API response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use orders_core::{ErrorResponse, OrdersError};
use serde::{Deserialize, Serialize};

/// Error envelope returned by failing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub error: ErrorResponse,
}

impl ApiResponse {
    /// Creates an error response.
    #[must_use]
    pub fn error(error: ErrorResponse) -> Self {
        Self {
            success: false,
            error,
        }
    }
}

/// Application error type for Axum.
#[derive(Debug)]
pub struct AppError(pub OrdersError);

impl From<OrdersError> for AppError {
    fn from(err: OrdersError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let error_response = ErrorResponse::from_error(&self.0);
        let body = Json(ApiResponse::error(error_response));

        (status, body).into_response()
    }
}
