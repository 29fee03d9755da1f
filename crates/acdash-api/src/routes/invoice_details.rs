//! 인보이스 항목 라우트.
//!
//! - `GET /api/v1/invoice-details` - 항목 목록 (관리자, 기술자)
//! - `GET /api/v1/invoice-details/search?invoice_id=` - 인보이스별 항목 (관리자, 기술자)
//! - `POST /api/v1/invoice-details` - 항목 추가 (관리자)
//! - `GET|PUT|DELETE /api/v1/invoice-details/{id}`
//!
//! 항목 추가/수정/삭제는 같은 트랜잭션에서 부모 인보이스 총액을 다시 계산합니다.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{parse_filter, PageQuery};
use crate::auth::{AdminOnly, Authorized, Staff};
use crate::error::ApiResult;
use crate::extract::{PathParam, ValidatedJson, ValidatedQuery};
use crate::response::{created, ok, paginated, ApiResponse};
use crate::services::{CreateInvoiceDetailRequest, UpdateInvoiceDetailRequest};
use crate::state::AppState;
use crate::store::InvoiceDetailFilter;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct InvoiceDetailSearchQuery {
    pub invoice_id: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

pub async fn list_details(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (details, meta) = state
        .invoice_details
        .search(InvoiceDetailFilter::default(), query.request())
        .await?;
    Ok(paginated("Invoice details retrieved successfully", details, meta))
}

pub async fn search_details(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<InvoiceDetailSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = InvoiceDetailFilter {
        invoice_id: parse_filter("invoice_id", query.invoice_id)?,
    };
    let (details, meta) = state
        .invoice_details
        .search(filter, query.page.request())
        .await?;
    Ok(paginated("Invoice detail search completed successfully", details, meta))
}

pub async fn create_detail(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateInvoiceDetailRequest>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.invoice_details.create(req).await?;
    Ok(created("Invoice detail created successfully", detail))
}

pub async fn get_detail(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.invoice_details.get(id).await?;
    Ok(ok("Invoice detail retrieved successfully", detail))
}

pub async fn update_detail(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateInvoiceDetailRequest>,
) -> ApiResult<impl IntoResponse> {
    let detail = state.invoice_details.update(id, req).await?;
    Ok(ok("Invoice detail updated successfully", detail))
}

pub async fn delete_detail(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.invoice_details.delete(id).await?;
    Ok(Json(ApiResponse::message_only(
        "Invoice detail deleted successfully",
    )))
}

pub fn invoice_details_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_details).post(create_detail))
        .route("/search", get(search_details))
        .route(
            "/{id}",
            get(get_detail).put(update_detail).delete(delete_detail),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{create_api_router, testing::call};
    use crate::services::testing::{booking, invoice_request};
    use crate::state::{bearer_for, create_test_state};
    use acdash_core::Role;
    use axum::http::{Method, StatusCode};
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    fn amount(value: &Value) -> Decimal {
        match value {
            Value::String(s) => s.parse().unwrap(),
            other => other.to_string().parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_detail_changes_keep_invoice_total_in_sync() {
        let state = Arc::new(create_test_state());
        let admin = bearer_for(&state, Role::Admin).await;
        let booking = booking(&state.store).await;
        let invoice = state
            .invoices
            .create(invoice_request(&booking))
            .await
            .unwrap();
        let app = create_api_router(state);
        let invoice_uri = format!("/api/v1/invoices/{}", invoice.id);

        // 단가 생략 시 카탈로그 가격 사용
        let (status, json) = call(
            &app,
            Method::POST,
            "/api/v1/invoice-details",
            Some(&admin),
            Some(json!({
                "invoice_id": invoice.id,
                "service_id": booking.cleaning_id,
                "quantity": 2
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(amount(&json["data"]["subtotal"]), Decimal::from(300_000));
        let detail_id = json["data"]["id"].as_str().unwrap().to_string();

        let (_, json) = call(&app, Method::GET, &invoice_uri, Some(&admin), None).await;
        assert_eq!(amount(&json["data"]["total_amount"]), Decimal::from(300_000));

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/invoice-details/{}", detail_id),
            Some(&admin),
            Some(json!({ "quantity": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, json) = call(&app, Method::GET, &invoice_uri, Some(&admin), None).await;
        assert_eq!(amount(&json["data"]["total_amount"]), Decimal::from(150_000));

        let (status, _) = call(
            &app,
            Method::DELETE,
            &format!("/api/v1/invoice-details/{}", detail_id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let (_, json) = call(&app, Method::GET, &invoice_uri, Some(&admin), None).await;
        assert_eq!(amount(&json["data"]["total_amount"]), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_rejected_line_leaves_total_untouched() {
        let state = Arc::new(create_test_state());
        let admin = bearer_for(&state, Role::Admin).await;
        let booking = booking(&state.store).await;
        let invoice = state
            .invoices
            .create(invoice_request(&booking))
            .await
            .unwrap();
        let app = create_api_router(state);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/invoice-details",
            Some(&admin),
            Some(json!({
                "invoice_id": invoice.id,
                "service_id": booking.cleaning_id,
                "quantity": 0
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = call(
            &app,
            Method::POST,
            "/api/v1/invoice-details",
            Some(&admin),
            Some(json!({
                "invoice_id": invoice.id,
                "service_id": Uuid::new_v4(),
                "quantity": 1
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "service not found");

        let (_, json) = call(
            &app,
            Method::GET,
            &format!("/api/v1/invoice-details/search?invoice_id={}", invoice.id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(json["pagination"]["total"], 0);

        let (_, json) = call(
            &app,
            Method::GET,
            &format!("/api/v1/invoices/{}", invoice.id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(amount(&json["data"]["total_amount"]), Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_customer_forbidden() {
        let state = Arc::new(create_test_state());
        let customer = bearer_for(&state, Role::Customer).await;
        let app = create_api_router(state);

        let (status, _) =
            call(&app, Method::GET, "/api/v1/invoice-details", Some(&customer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
