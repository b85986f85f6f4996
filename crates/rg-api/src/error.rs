//! HTTP mapping of [`AppError`].
//!
//! Every failure leaves the API as `{"success": false, "message": "..."}`.
//! Internal errors are logged and replaced by a generic message.

use actix_web::http::{header, StatusCode};
use actix_web::{HttpResponse, ResponseError};
use rg_core::AppError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

impl ApiError {
    pub fn validation(reason: impl Into<String>) -> Self {
        ApiError(AppError::validation(reason))
    }

    pub fn unauthorized(reason: &str) -> Self {
        ApiError(AppError::Unauthorized(reason.to_string()))
    }

    fn client_message(&self) -> String {
        match &self.0 {
            AppError::NotFound(what, _) => format!("{what} not found"),
            AppError::ValidationError(m)
            | AppError::Unauthorized(m)
            | AppError::Forbidden(m)
            | AppError::Conflict(m) => m.clone(),
            AppError::Internal(detail) => {
                log::error!("internal error: {}", detail);
                "An internal error occurred".to_string()
            }
            AppError::External(e) => {
                log::error!("external service failed: {:#}", e);
                e.to_string()
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::External(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if matches!(self.0, AppError::Unauthorized(_)) {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(json!({ "success": false, "message": self.client_message() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_of(err: ApiError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_per_variant() {
        let cases = [
            (AppError::not_found("Image", 3), StatusCode::NOT_FOUND),
            (AppError::validation("bad"), StatusCode::BAD_REQUEST),
            (AppError::Unauthorized("no".into()), StatusCode::UNAUTHORIZED),
            (AppError::forbidden("no"), StatusCode::FORBIDDEN),
            (AppError::Conflict("dup".into()), StatusCode::CONFLICT),
            (AppError::Internal("db".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::External(anyhow::anyhow!("cdn down")), StatusCode::BAD_GATEWAY),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status_code(), status);
        }
    }

    #[actix_web::test]
    async fn internal_detail_is_hidden() {
        let body = body_of(ApiError(AppError::Internal("disk I/O error".into()))).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[actix_web::test]
    async fn domain_messages_pass_through() {
        let body = body_of(ApiError(AppError::forbidden("Operation forbidden"))).await;
        assert_eq!(body["message"], "Operation forbidden");
        let body = body_of(ApiError(AppError::not_found("Comment", 9))).await;
        assert_eq!(body["message"], "Comment not found");
    }

    #[test]
    fn unauthorized_challenges_bearer() {
        let resp = ApiError::unauthorized("Not authenticated").error_response();
        assert_eq!(resp.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }
}
