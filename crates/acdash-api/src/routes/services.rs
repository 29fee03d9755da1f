//! 서비스 카탈로그 라우트.
//!
//! 조회는 인증된 모든 역할, 변경은 관리자만 가능합니다.
//!
//! - `GET /api/v1/services`
//! - `GET /api/v1/services/search?name=&min_price=&max_price=`
//! - `POST /api/v1/services`
//! - `GET|PUT|DELETE /api/v1/services/{id}`

use std::sync::Arc;

use acdash_core::non_empty;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::{parse_filter, PageQuery};
use crate::auth::{AdminOnly, AnyRole, Authorized};
use crate::error::{ApiError, ApiResult};
use crate::extract::{PathParam, ValidatedJson, ValidatedQuery};
use crate::response::{created, ok, paginated, ApiResponse};
use crate::services::{CreateServiceRequest, UpdateServiceRequest};
use crate::state::AppState;
use crate::store::ServiceFilter;

// ================================================================================================
// Request Types
// ================================================================================================

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ServiceSearchQuery {
    pub name: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

impl ServiceSearchQuery {
    fn filter(self) -> ApiResult<ServiceFilter> {
        let min_price: Option<Decimal> = parse_filter("min_price", self.min_price)?;
        let max_price: Option<Decimal> = parse_filter("max_price", self.max_price)?;
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ApiError::validation("min_price must not exceed max_price"));
            }
        }

        Ok(ServiceFilter {
            name: non_empty(self.name),
            min_price,
            max_price,
        })
    }
}

// ================================================================================================
// Handlers
// ================================================================================================

pub async fn list_services(
    _auth: Authorized<AnyRole>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (services, meta) = state
        .catalog
        .search(ServiceFilter::default(), query.request())
        .await?;
    Ok(paginated("Services retrieved successfully", services, meta))
}

pub async fn search_services(
    _auth: Authorized<AnyRole>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<ServiceSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page.request();
    let (services, meta) = state.catalog.search(query.filter()?, page).await?;
    Ok(paginated("Service search completed successfully", services, meta))
}

pub async fn create_service(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateServiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let service = state.catalog.create(req).await?;
    Ok(created("Service created successfully", service))
}

pub async fn get_service(
    _auth: Authorized<AnyRole>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let service = state.catalog.get(id).await?;
    Ok(ok("Service retrieved successfully", service))
}

pub async fn update_service(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateServiceRequest>,
) -> ApiResult<impl IntoResponse> {
    let service = state.catalog.update(id, req).await?;
    Ok(ok("Service updated successfully", service))
}

pub async fn delete_service(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.catalog.delete(id).await?;
    Ok(Json(ApiResponse::message_only("Service deleted successfully")))
}

// ================================================================================================
// Router
// ================================================================================================

pub fn services_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_services).post(create_service))
        .route("/search", get(search_services))
        .route(
            "/{id}",
            get(get_service).put(update_service).delete(delete_service),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{create_api_router, testing::call};
    use crate::state::{bearer_for, create_test_state};
    use acdash_core::Role;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    async fn seeded() -> (Router, String, String) {
        let state = Arc::new(create_test_state());
        let admin = bearer_for(&state, Role::Admin).await;
        let customer = bearer_for(&state, Role::Customer).await;
        let app = create_api_router(state);

        for (name, price, duration) in [
            ("Cuci AC", 150000, 60),
            ("Isi Freon", 200000, 45),
            ("Bongkar Pasang AC", 500000, 180),
        ] {
            let (status, _) = call(
                &app,
                Method::POST,
                "/api/v1/services",
                Some(&admin),
                Some(json!({ "name": name, "price": price, "duration": duration })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }
        (app, admin, customer)
    }

    #[tokio::test]
    async fn test_customer_can_read_catalog() {
        let (app, _, customer) = seeded().await;

        let (status, json) = call(&app, Method::GET, "/api/v1/services", Some(&customer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 3);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/services",
            Some(&customer),
            Some(json!({ "name": "Gratis", "price": 0, "duration": 10 })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_price_range_search() {
        let (app, _, customer) = seeded().await;

        let (status, json) = call(
            &app,
            Method::GET,
            "/api/v1/services/search?min_price=150000&max_price=200000",
            Some(&customer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 2);

        let (status, json) = call(
            &app,
            Method::GET,
            "/api/v1/services/search?min_price=murah",
            Some(&customer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "invalid min_price");

        let (status, _) = call(
            &app,
            Method::GET,
            "/api/v1/services/search?min_price=500&max_price=100",
            Some(&customer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rejects_negative_price_and_zero_duration() {
        let (app, admin, _) = seeded().await;

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/services",
            Some(&admin),
            Some(json!({ "name": "Diskon", "price": -1, "duration": 30 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/services",
            Some(&admin),
            Some(json!({ "name": "Kilat", "price": 1000, "duration": 0 })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
