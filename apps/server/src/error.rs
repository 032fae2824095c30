use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use nexus_core::errors::Error as CoreError;
use nexus_registry::ResolutionError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Resolution(#[from] ResolutionError),
    #[error("{0}")]
    Core(#[from] CoreError),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after_secs: Option<u64>,
}

fn resolution_status(error: &ResolutionError) -> StatusCode {
    match error {
        ResolutionError::UnrecognizedIdentifier(_) => StatusCode::BAD_REQUEST,
        ResolutionError::NotFound { .. } => StatusCode::NOT_FOUND,
        ResolutionError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        ResolutionError::CircuitOpen { .. } => StatusCode::SERVICE_UNAVAILABLE,
        ResolutionError::Unavailable { .. }
        | ResolutionError::NoRouteAvailable
        | ResolutionError::MalformedResponse { .. } => StatusCode::BAD_GATEWAY,
        ResolutionError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, retry_after) = match &self {
            ApiError::Resolution(e) => (resolution_status(e), e.retry_after()),
            ApiError::Core(CoreError::Resolution(e)) => (resolution_status(e), e.retry_after()),
            ApiError::Core(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
        };
        if status.is_server_error() {
            tracing::warn!("Request failed with {}: {}", status, self);
        }

        // Retry-After is whole seconds; never advertise zero.
        let retry_after_secs = retry_after.map(|d| d.as_secs().max(1));
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
            retry_after_secs,
        });
        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
