use actix_web::{HttpResponse, ResponseError};
use acceptance::AcceptanceError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Malformed or incomplete request body
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unknown payment intent
    #[error("not found: {0}")]
    NotFound(String),

    /// The processor failed; the PSP should redeliver
    #[error("processing failed: {0}")]
    Processing(#[from] AcceptanceError),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::BadRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "bad_request",
                "message": msg
            })),
            ApiError::NotFound(msg) => HttpResponse::NotFound().json(serde_json::json!({
                "error": "not_found",
                "message": msg
            })),
            ApiError::Processing(e) => {
                tracing::error!(error = %e, "confirmation processing failed");
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "processing_failed",
                    "message": e.to_string()
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).error_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("pi_1".into()).error_response().status(),
            StatusCode::NOT_FOUND
        );
        let err: ApiError = AcceptanceError::Dispatch("insufficient liquidity".into()).into();
        assert_eq!(err.error_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
