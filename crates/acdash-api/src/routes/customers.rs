//! 고객 라우트.
//!
//! - `GET /api/v1/customers` - 고객 목록 (관리자, 기술자)
//! - `GET /api/v1/customers/search` - 고객 검색 (관리자, 기술자)
//! - `POST /api/v1/customers` - 고객 생성 (관리자)
//! - `GET /api/v1/customers/{id}` - 고객 조회 (관리자, 기술자)
//! - `PUT /api/v1/customers/{id}` - 고객 수정 (관리자)
//! - `DELETE /api/v1/customers/{id}` - 고객 삭제 (관리자)

use std::sync::Arc;

use acdash_core::non_empty;
use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::PageQuery;
use crate::auth::{AdminOnly, Authorized, Staff};
use crate::error::ApiResult;
use crate::extract::{PathParam, ValidatedJson, ValidatedQuery};
use crate::response::{created, ok, paginated, ApiResponse};
use crate::services::{CreateCustomerRequest, UpdateCustomerRequest};
use crate::state::AppState;
use crate::store::CustomerFilter;

// ================================================================================================
// Request Types
// ================================================================================================

/// 고객 검색 쿼리.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CustomerSearchQuery {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

impl CustomerSearchQuery {
    fn filter(self) -> CustomerFilter {
        CustomerFilter {
            name: non_empty(self.name),
            phone: non_empty(self.phone),
            email: non_empty(self.email),
        }
    }
}

// ================================================================================================
// Handlers
// ================================================================================================

pub async fn list_customers(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (customers, meta) = state
        .customers
        .search(CustomerFilter::default(), query.request())
        .await?;
    Ok(paginated("Customers retrieved successfully", customers, meta))
}

pub async fn search_customers(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<CustomerSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = query.page.request();
    let (customers, meta) = state.customers.search(query.filter(), page).await?;
    Ok(paginated("Customer search completed successfully", customers, meta))
}

pub async fn create_customer(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateCustomerRequest>,
) -> ApiResult<impl IntoResponse> {
    let customer = state.customers.create(req).await?;
    Ok(created("Customer created successfully", customer))
}

pub async fn get_customer(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let customer = state.customers.get(id).await?;
    Ok(ok("Customer retrieved successfully", customer))
}

pub async fn update_customer(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateCustomerRequest>,
) -> ApiResult<impl IntoResponse> {
    let customer = state.customers.update(id, req).await?;
    Ok(ok("Customer updated successfully", customer))
}

pub async fn delete_customer(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.customers.delete(id).await?;
    Ok(Json(ApiResponse::message_only("Customer deleted successfully")))
}

// ================================================================================================
// Router
// ================================================================================================

pub fn customers_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route("/search", get(search_customers))
        .route(
            "/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{create_api_router, testing::call};
    use crate::state::{bearer_for, create_test_state};
    use acdash_core::Role;
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    struct Ctx {
        app: Router,
        admin: String,
        technician: String,
        customer: String,
    }

    async fn setup() -> Ctx {
        let state = Arc::new(create_test_state());
        let admin = bearer_for(&state, Role::Admin).await;
        let technician = bearer_for(&state, Role::Technician).await;
        let customer = bearer_for(&state, Role::Customer).await;
        Ctx {
            app: create_api_router(state),
            admin,
            technician,
            customer,
        }
    }

    fn body(name: &str, phone: &str, email: &str) -> Value {
        json!({
            "name": name,
            "phone": phone,
            "address": "Jl. Asia Afrika No. 8, Bandung",
            "email": email
        })
    }

    #[tokio::test]
    async fn test_admin_crud() {
        let ctx = setup().await;

        let (status, json) = call(
            &ctx.app,
            Method::POST,
            "/api/v1/customers",
            Some(&ctx.admin),
            Some(body("Siti Aminah", "081298765432", "siti@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["message"], "Customer created successfully");
        let id = json["data"]["id"].as_str().unwrap().to_string();

        let (status, json) = call(
            &ctx.app,
            Method::PUT,
            &format!("/api/v1/customers/{}", id),
            Some(&ctx.admin),
            Some(json!({ "name": "Siti Rahma" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["name"], "Siti Rahma");
        assert_eq!(json["data"]["phone"], "081298765432");

        let (status, json) = call(
            &ctx.app,
            Method::DELETE,
            &format!("/api/v1/customers/{}", id),
            Some(&ctx.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.get("data").is_none());

        let (status, _) = call(
            &ctx.app,
            Method::GET,
            &format!("/api/v1/customers/{}", id),
            Some(&ctx.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_role_policy() {
        let ctx = setup().await;

        let (status, _) = call(&ctx.app, Method::GET, "/api/v1/customers", Some(&ctx.technician), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = call(&ctx.app, Method::GET, "/api/v1/customers", Some(&ctx.customer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(
            &ctx.app,
            Method::POST,
            "/api/v1/customers",
            Some(&ctx.technician),
            Some(body("Siti Aminah", "081298765432", "siti@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_duplicate_phone_conflict() {
        let ctx = setup().await;
        call(
            &ctx.app,
            Method::POST,
            "/api/v1/customers",
            Some(&ctx.admin),
            Some(body("Siti Aminah", "081298765432", "siti@example.com")),
        )
        .await;

        let (status, json) = call(
            &ctx.app,
            Method::POST,
            "/api/v1/customers",
            Some(&ctx.admin),
            Some(body("Dewi Lestari", "081298765432", "dewi@example.com")),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["message"], "customer phone already exists");
    }

    #[tokio::test]
    async fn test_search_and_pagination() {
        let ctx = setup().await;
        for (i, name) in ["Siti Aminah", "Siti Rahma", "Joko Widodo"].iter().enumerate() {
            call(
                &ctx.app,
                Method::POST,
                "/api/v1/customers",
                Some(&ctx.admin),
                Some(body(name, &format!("08129876543{}", i), &format!("c{}@example.com", i))),
            )
            .await;
        }

        let (status, json) = call(
            &ctx.app,
            Method::GET,
            "/api/v1/customers/search?name=siti&limit=1",
            Some(&ctx.technician),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Customer search completed successfully");
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["pagination"]["total"], 2);
        assert_eq!(json["pagination"]["total_pages"], 2);

        let (_, json) = call(
            &ctx.app,
            Method::GET,
            "/api/v1/customers?page=abc&limit=999",
            Some(&ctx.admin),
            None,
        )
        .await;
        assert_eq!(json["pagination"]["page"], 1);
        assert_eq!(json["pagination"]["limit"], 10);
        assert_eq!(json["pagination"]["total"], 3);
    }

    #[tokio::test]
    async fn test_invalid_body_and_id() {
        let ctx = setup().await;

        let (status, json) = call(
            &ctx.app,
            Method::POST,
            "/api/v1/customers",
            Some(&ctx.admin),
            Some(body("S", "0812", "not-an-email")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert!(json["error"]["fields"].as_array().unwrap().len() >= 3);

        let (status, _) = call(
            &ctx.app,
            Method::GET,
            "/api/v1/customers/not-a-uuid",
            Some(&ctx.admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
