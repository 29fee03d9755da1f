//! API 에러 타입.
//!
//! 모든 실패는 [`ApiError`]로 모여 envelope 형식으로 렌더링됩니다.
//!
//! | 분류 | 상태 코드 |
//! |------|-----------|
//! | 검증 실패, 중복 이메일 | 400 |
//! | 인증 실패 | 401 |
//! | 권한 부족 | 403 |
//! | 리소스 없음 | 404 |
//! | 고유값 충돌 | 409 |
//! | 내부 오류, 핸들러 패닉 | 500 |
//!
//! 인증 실패 메시지는 의도적으로 뭉뚱그려져 있습니다.
//! (존재하지 않는 이메일과 잘못된 비밀번호, 만료와 위조 토큰을 구분하지 않음)

use std::any::Any;

use acdash_core::DomainError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{JwtError, PasswordError};
use crate::response::ApiResponse;
use crate::store::StoreError;

/// 필드 단위 검증 에러.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// API 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("phone and address are required for customer role")]
    MissingCustomerFields,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user account is deactivated")]
    AccountDeactivated,

    #[error("authorization header is required")]
    MissingAuthHeader,

    #[error("invalid authorization header format")]
    MalformedAuthHeader,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("invalid token type")]
    InvalidTokenType,

    #[error("insufficient permissions")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    /// 상세 원인은 로그에만 남고 응답에는 일반 메시지만 나갑니다.
    #[error("internal server error")]
    Internal(String),
}

/// 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// 단일 메시지 검증 에러.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. }
            | ApiError::MissingCustomerFields
            | ApiError::DuplicateEmail => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials
            | ApiError::AccountDeactivated
            | ApiError::MissingAuthHeader
            | ApiError::MalformedAuthHeader
            | ApiError::InvalidToken
            | ApiError::InvalidTokenType => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 기계 판독용 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::MissingCustomerFields => "MISSING_CUSTOMER_FIELDS",
            ApiError::DuplicateEmail => "DUPLICATE_EMAIL",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            ApiError::MissingAuthHeader | ApiError::MalformedAuthHeader => "INVALID_AUTH_HEADER",
            ApiError::InvalidToken => "INVALID_TOKEN",
            ApiError::InvalidTokenType => "INVALID_TOKEN_TYPE",
            ApiError::Forbidden => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "internal error");
        }

        let error = match &self {
            ApiError::Validation { fields, .. } if !fields.is_empty() => {
                json!({ "code": self.code(), "fields": fields })
            }
            _ => json!({ "code": self.code() }),
        };

        (status, Json(ApiResponse::failure(self.to_string(), error))).into_response()
    }
}

/// `CatchPanicLayer::custom`용 패닉 핸들러.
///
/// 패닉 메시지는 로그에만 남기고 응답은 일반 500 envelope입니다.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    ApiError::Internal(format!("handler panicked: {}", detail)).into_response()
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => ApiError::NotFound(entity),
            StoreError::UniqueViolation(field) => {
                ApiError::Conflict(format!("{} already exists", field))
            }
            StoreError::Backend(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::InvalidToken => ApiError::InvalidToken,
            JwtError::MissingAuthHeader => ApiError::MissingAuthHeader,
            JwtError::MalformedAuthHeader => ApiError::MalformedAuthHeader,
            JwtError::Encoding(e) => ApiError::Internal(format!("token signing failed: {}", e)),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort => ApiError::Validation {
                message: "validation failed".to_string(),
                fields: vec![FieldError {
                    field: "password".to_string(),
                    message: err.to_string(),
                }],
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed on '{}'", e.code)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::Validation {
            message: "validation failed".to_string(),
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let (status, json) =
            body_json(ApiError::Internal("connection refused at 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "internal server error");
        assert!(!json.to_string().contains("10.0.0.3"));
    }

    #[tokio::test]
    async fn test_status_mapping() {
        assert_eq!(ApiError::DuplicateEmail.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::InvalidTokenType.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("invoice").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Conflict("phone already exists".into()).status_code(),
            StatusCode::CONFLICT
        );

        let (_, json) = body_json(ApiError::NotFound("invoice")).await;
        assert_eq!(json["message"], "invoice not found");
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_validation_fields_rendered() {
        let err = ApiError::Validation {
            message: "validation failed".into(),
            fields: vec![FieldError {
                field: "email".into(),
                message: "invalid email".into(),
            }],
        };
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["fields"][0]["field"], "email");
    }

    #[tokio::test]
    async fn test_panicking_handler_renders_internal_envelope() {
        use axum::{body::Body, http::Request, routing::get, Router};
        use tower::ServiceExt;
        use tower_http::catch_panic::CatchPanicLayer;

        async fn explode() -> &'static str {
            panic!("compressor state corrupted at 10.0.0.3")
        }

        let app = Router::new()
            .route("/explode", get(explode))
            .route("/fine", get(|| async { "ok" }))
            .layer(CatchPanicLayer::custom(panic_response));

        let response = app
            .clone()
            .oneshot(Request::get("/explode").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "internal server error");
        assert_eq!(json["error"]["code"], "INTERNAL_ERROR");
        assert!(!json.to_string().contains("10.0.0.3"));

        // 패닉 이후에도 서비스는 계속 응답
        let response = app
            .oneshot(Request::get("/fine").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_store_error_conversion() {
        let err: ApiError = StoreError::UniqueViolation("customer phone").into();
        assert_eq!(err.to_string(), "customer phone already exists");
        assert!(matches!(
            ApiError::from(StoreError::Backend("boom".into())),
            ApiError::Internal(_)
        ));
    }
}
