//! 방문 일정 라우트.
//!
//! - `GET /api/v1/schedules` - 일정 목록 (관리자, 기술자)
//! - `GET /api/v1/schedules/search` - 고객/기술자/서비스/상태/기간 검색 (관리자, 기술자)
//! - `POST /api/v1/schedules` - 일정 생성 (관리자)
//! - `GET /api/v1/schedules/{id}` - 일정 조회 (관리자, 기술자)
//! - `PUT /api/v1/schedules/{id}` - 일정 수정 (관리자, 기술자)
//! - `DELETE /api/v1/schedules/{id}` - 일정 삭제 (관리자)
//!
//! 목록은 방문 날짜, 시간 역순입니다.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{parse_filter, PageQuery};
use crate::auth::{AdminOnly, Authorized, Staff};
use crate::error::{ApiError, ApiResult};
use crate::extract::{PathParam, ValidatedJson, ValidatedQuery};
use crate::response::{created, ok, paginated, ApiResponse};
use crate::services::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::state::AppState;
use crate::store::ScheduleFilter;

// ================================================================================================
// Request Types
// ================================================================================================

/// 일정 검색 쿼리. 날짜는 `YYYY-MM-DD`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ScheduleSearchQuery {
    pub customer_id: Option<String>,
    pub technician_id: Option<String>,
    pub service_id: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

impl ScheduleSearchQuery {
    fn filter(self) -> ApiResult<ScheduleFilter> {
        let filter = ScheduleFilter {
            customer_id: parse_filter("customer_id", self.customer_id)?,
            technician_id: parse_filter("technician_id", self.technician_id)?,
            service_id: parse_filter("service_id", self.service_id)?,
            status: parse_filter("status", self.status)?,
            date_from: parse_filter("date_from", self.date_from)?,
            date_to: parse_filter("date_to", self.date_to)?,
        };

        if let (Some(from), Some(to)) = (filter.date_from, filter.date_to) {
            if from > to {
                return Err(ApiError::validation("date_from must not be after date_to"));
            }
        }
        Ok(filter)
    }
}

// ================================================================================================
// Handlers
// ================================================================================================

pub async fn list_schedules(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (schedules, meta) = state
        .schedules
        .search(ScheduleFilter::default(), query.request())
        .await?;
    Ok(paginated("Schedules retrieved successfully", schedules, meta))
}

pub async fn search_schedules(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ScheduleSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page.request();
    let (schedules, meta) = state.schedules.search(query.filter()?, page).await?;
    Ok(paginated("Schedule search completed successfully", schedules, meta))
}

pub async fn create_schedule(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateScheduleRequest>,
) -> ApiResult<impl IntoResponse> {
    let schedule = state.schedules.create(req).await?;
    Ok(created("Schedule created successfully", schedule))
}

pub async fn get_schedule(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let schedule = state.schedules.get(id).await?;
    Ok(ok("Schedule retrieved successfully", schedule))
}

/// 기술자도 진행 상태를 갱신할 수 있습니다.
pub async fn update_schedule(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateScheduleRequest>,
) -> ApiResult<impl IntoResponse> {
    let schedule = state.schedules.update(id, req).await?;
    Ok(ok("Schedule updated successfully", schedule))
}

pub async fn delete_schedule(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.schedules.delete(id).await?;
    Ok(Json(ApiResponse::message_only("Schedule deleted successfully")))
}

// ================================================================================================
// Router
// ================================================================================================

pub fn schedules_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_schedules).post(create_schedule))
        .route("/search", get(search_schedules))
        .route(
            "/{id}",
            get(get_schedule).put(update_schedule).delete(delete_schedule),
        )
}
