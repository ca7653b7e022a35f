use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stockdex_core::AnalyzeError;

/// Handler error. Renders as `{"detail": ..}`.
#[derive(Debug)]
pub struct ApiError(AnalyzeError);

#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self.0 {
            AnalyzeError::NotFound(_) => (StatusCode::NOT_FOUND, "Stock not found".to_string()),
            AnalyzeError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg),
            AnalyzeError::Upstream(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "upstream failure");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(ErrorBody { detail })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
