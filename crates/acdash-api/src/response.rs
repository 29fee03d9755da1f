//! 응답 envelope.
//!
//! 단건 응답: `{status, message, data?, error?}`
//! 목록 응답: `{status, message, data, pagination}`

use acdash_core::PageMeta;
use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 단건 응답 envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// "success" | "error"
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<Value> {
    /// 데이터 없는 성공 응답 (삭제 등).
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: None,
            error: None,
        }
    }

    /// 에러 응답.
    pub fn failure(message: impl Into<String>, error: Value) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
            error: Some(error),
        }
    }
}

/// 페이지네이션 목록 envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Vec<T>,
    pub pagination: PageMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(message: impl Into<String>, data: Vec<T>, pagination: PageMeta) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
            pagination,
        }
    }
}

/// 200 OK 단건 응답.
pub fn ok<T>(message: impl Into<String>, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::OK, Json(ApiResponse::success(message, data)))
}

/// 201 Created 단건 응답.
pub fn created<T>(message: impl Into<String>, data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::success(message, data)))
}

/// 200 OK 목록 응답.
pub fn paginated<T>(
    message: impl Into<String>,
    data: Vec<T>,
    pagination: PageMeta,
) -> (StatusCode, Json<PaginatedResponse<T>>) {
    (StatusCode::OK, Json(PaginatedResponse::new(message, data, pagination)))
}
