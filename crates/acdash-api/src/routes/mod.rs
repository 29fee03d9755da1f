//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health`, `/health/ready` - 헬스 체크
//! - `/api/v1/auth` - 회원가입/로그인/토큰 갱신 (공개)
//! - `/api/v1/me` - 내 프로필
//! - `/api/v1/users` - 사용자 관리 (관리자)
//! - `/api/v1/customers`, `/technicians`, `/services`, `/schedules`
//! - `/api/v1/invoices`, `/invoice-details`
//!
//! `/api/v1/auth`를 제외한 `/api/v1` 이하 전체는 access 토큰이 필요합니다.

pub mod auth;
pub mod customers;
pub mod health;
pub mod invoice_details;
pub mod invoices;
pub mod schedules;
pub mod services;
pub mod technicians;
pub mod users;

use std::str::FromStr;
use std::sync::Arc;

use acdash_core::{non_empty, PageRequest};
use axum::{middleware, routing::get, Router};
use serde::Deserialize;
use validator::Validate;

use crate::auth::authenticate;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub use auth::{auth_router, ProfileResponse};
pub use health::{health_router, HealthResponse};

/// 목록/검색 공통 페이지 파라미터.
///
/// 숫자가 아니거나 범위를 벗어난 값은 기본값으로 대체됩니다.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PageQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PageQuery {
    pub fn request(&self) -> PageRequest {
        let parse = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        PageRequest::new(parse(&self.page), parse(&self.limit))
    }
}

/// 검색 필터 값 파싱. 빈 문자열은 필터 없음으로 취급합니다.
pub(crate) fn parse_filter<T: FromStr>(
    field: &'static str,
    value: Option<String>,
) -> ApiResult<Option<T>> {
    match non_empty(value) {
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::validation(format!("invalid {}", field))),
        None => Ok(None),
    }
}

/// 전체 API 라우터를 생성합니다.
pub fn create_api_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/me", get(auth::me))
        .nest("/users", users::users_router())
        .nest("/customers", customers::customers_router())
        .nest("/technicians", technicians::technicians_router())
        .nest("/services", services::services_router())
        .nest("/schedules", schedules::schedules_router())
        .nest("/invoices", invoices::invoices_router())
        .nest("/invoice-details", invoice_details::invoice_details_router())
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            authenticate,
        ));

    let api = Router::new()
        .nest("/auth", auth_router())
        .merge(protected);

    Router::new()
        .nest("/health", health_router())
        .nest("/api/v1", api)
        .with_state(state)
}
