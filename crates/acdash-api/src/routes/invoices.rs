//! 인보이스 라우트.
//!
//! - `GET /api/v1/invoices` - 인보이스 목록 (관리자, 기술자)
//! - `GET /api/v1/invoices/search` - 고객/일정/상태/기간 검색 (관리자, 기술자)
//! - `POST /api/v1/invoices` - 인보이스 생성 (관리자)
//! - `GET|PUT|DELETE /api/v1/invoices/{id}`
//! - `GET /api/v1/invoices/{id}/details` - 인보이스 항목 (관리자, 기술자)
//! - `POST /api/v1/invoices/{id}/reconcile` - 총액 재계산 (관리자)
//!
//! `total_amount`는 항목 변경 시 서버가 계산하며 요청으로 지정할 수 없습니다.

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{parse_filter, PageQuery};
use crate::auth::{AdminOnly, Authorized, Staff};
use crate::error::{ApiError, ApiResult};
use crate::extract::{PathParam, ValidatedJson, ValidatedQuery};
use crate::response::{created, ok, paginated, ApiResponse};
use crate::services::{CreateInvoiceRequest, UpdateInvoiceRequest};
use crate::state::AppState;
use crate::store::InvoiceFilter;

// ================================================================================================
// Request Types
// ================================================================================================

#[derive(Debug, Default, Deserialize, Validate)]
pub struct InvoiceSearchQuery {
    pub customer_id: Option<String>,
    pub schedule_id: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

impl InvoiceSearchQuery {
    fn filter(self) -> ApiResult<InvoiceFilter> {
        let filter = InvoiceFilter {
            customer_id: parse_filter("customer_id", self.customer_id)?,
            schedule_id: parse_filter("schedule_id", self.schedule_id)?,
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

pub async fn list_invoices(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (invoices, meta) = state
        .invoices
        .search(InvoiceFilter::default(), query.request())
        .await?;
    Ok(paginated("Invoices retrieved successfully", invoices, meta))
}

pub async fn search_invoices(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<InvoiceSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page.request();
    let (invoices, meta) = state.invoices.search(query.filter()?, page).await?;
    Ok(paginated("Invoice search completed successfully", invoices, meta))
}

pub async fn create_invoice(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateInvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let invoice = state.invoices.create(req).await?;
    Ok(created("Invoice created successfully", invoice))
}

pub async fn get_invoice(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let invoice = state.invoices.get(id).await?;
    Ok(ok("Invoice retrieved successfully", invoice))
}

pub async fn update_invoice(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateInvoiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let invoice = state.invoices.update(id, req).await?;
    Ok(ok("Invoice updated successfully", invoice))
}

/// 항목까지 함께 삭제됩니다.
pub async fn delete_invoice(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.invoices.delete(id).await?;
    Ok(Json(ApiResponse::message_only("Invoice deleted successfully")))
}

pub async fn invoice_details(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let details = state.invoices.details(id).await?;
    Ok(ok("Invoice details retrieved successfully", details))
}

pub async fn reconcile_invoice(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let invoice = state.invoices.reconcile(id).await?;
    Ok(ok("Invoice total reconciled successfully", invoice))
}

// ================================================================================================
// Router
// ================================================================================================

pub fn invoices_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_invoices).post(create_invoice))
        .route("/search", get(search_invoices))
        .route(
            "/{id}",
            get(get_invoice).put(update_invoice).delete(delete_invoice),
        )
        .route("/{id}/details", get(invoice_details))
        .route("/{id}/reconcile", post(reconcile_invoice))
}
