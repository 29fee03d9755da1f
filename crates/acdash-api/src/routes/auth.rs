//! 인증 라우트.
//!
//! - `POST /api/v1/auth/register` - 회원가입 (201)
//! - `POST /api/v1/auth/login` - 로그인
//! - `POST /api/v1/auth/refresh` - 토큰 갱신
//! - `GET /api/v1/me` - 내 프로필 (인증 필요)

use std::sync::Arc;

use acdash_core::{AccountSummary, Role};
use axum::{extract::State, response::IntoResponse, routing::post, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::extract::ValidatedJson;
use crate::response::{created, ok};
use crate::services::{LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest};
use crate::state::AppState;

/// 내 프로필 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

/// 회원가입.
#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "가입 완료", body = AccountSummary),
        (status = 400, description = "검증 실패 또는 이메일 중복")
    )
)]
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let account = state.accounts.register(req).await?;
    Ok(created("User registered successfully", account))
}

/// 로그인.
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "로그인 성공", body = crate::services::LoginResponse),
        (status = 401, description = "자격 증명 오류 또는 비활성 계정")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let result = state.accounts.login(req).await?;
    Ok(ok("Login successful", result))
}

/// 토큰 갱신.
#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "새 토큰 페어", body = RefreshResponse),
        (status = 401, description = "유효하지 않은 토큰")
    )
)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let tokens = state.accounts.refresh(&req.refresh_token).await?;
    Ok(ok("Token refreshed successfully", RefreshResponse { tokens }))
}

/// 내 프로필.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "호출자 정보", body = ProfileResponse),
        (status = 401, description = "인증 필요")
    )
)]
pub async fn me(context: AuthContext) -> ApiResult<impl IntoResponse> {
    Ok(ok(
        "User profile retrieved successfully",
        ProfileResponse {
            id: context.account_id,
            email: context.email,
            role: context.role,
        },
    ))
}

/// 공개 인증 라우터.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}
