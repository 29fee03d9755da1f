//! 기술자 라우트.
//!
//! - `GET /api/v1/technicians` - 기술자 목록 (관리자, 기술자)
//! - `GET /api/v1/technicians/search` - 이름/전문분야 검색 (관리자, 기술자)
//! - `POST /api/v1/technicians` - 기술자 생성 (관리자)
//! - `GET|PUT|DELETE /api/v1/technicians/{id}`

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
use crate::services::{CreateTechnicianRequest, UpdateTechnicianRequest};
use crate::state::AppState;
use crate::store::TechnicianFilter;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TechnicianSearchQuery {
    pub name: Option<String>,
    pub specialization: Option<String>,
    #[serde(flatten)]
    pub page: PageQuery,
}

pub async fn list_technicians(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (technicians, meta) = state
        .technicians
        .search(TechnicianFilter::default(), query.request())
        .await?;
    Ok(paginated("Technicians retrieved successfully", technicians, meta))
}

pub async fn search_technicians(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<TechnicianSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = TechnicianFilter {
        name: non_empty(query.name),
        specialization: non_empty(query.specialization),
    };
    let (technicians, meta) = state
        .technicians
        .search(filter, query.page.request())
        .await?;
    Ok(paginated("Technician search completed successfully", technicians, meta))
}

pub async fn create_technician(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateTechnicianRequest>,
) -> ApiResult<impl IntoResponse> {
    let technician = state.technicians.create(req).await?;
    Ok(created("Technician created successfully", technician))
}

pub async fn get_technician(
    _auth: Authorized<Staff>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let technician = state.technicians.get(id).await?;
    Ok(ok("Technician retrieved successfully", technician))
}

pub async fn update_technician(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTechnicianRequest>,
) -> ApiResult<impl IntoResponse> {
    let technician = state.technicians.update(id, req).await?;
    Ok(ok("Technician updated successfully", technician))
}

pub async fn delete_technician(
    _auth: Authorized<AdminOnly>,
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<impl IntoResponse> {
    state.technicians.delete(id).await?;
    Ok(Json(ApiResponse::message_only("Technician deleted successfully")))
}

pub fn technicians_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_technicians).post(create_technician))
        .route("/search", get(search_technicians))
        .route(
            "/{id}",
            get(get_technician)
                .put(update_technician)
                .delete(delete_technician),
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

    #[tokio::test]
    async fn test_create_and_search_by_specialization() {
        let state = Arc::new(create_test_state());
        let admin = bearer_for(&state, Role::Admin).await;
        let technician = bearer_for(&state, Role::Technician).await;
        let app = create_api_router(state);

        for (name, phone, spec) in [
            ("Agus Pratama", "081311112222", "Split AC"),
            ("Rudi Hartono", "081333334444", "Central AC"),
        ] {
            let (status, _) = call(
                &app,
                Method::POST,
                "/api/v1/technicians",
                Some(&admin),
                Some(json!({ "name": name, "phone": phone, "specialization": spec })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, json) = call(
            &app,
            Method::GET,
            "/api/v1/technicians/search?specialization=split",
            Some(&technician),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 1);
        assert_eq!(json["data"][0]["name"], "Agus Pratama");
    }

    #[tokio::test]
    async fn test_duplicate_phone_and_customer_forbidden() {
        let state = Arc::new(create_test_state());
        let admin = bearer_for(&state, Role::Admin).await;
        let customer = bearer_for(&state, Role::Customer).await;
        let app = create_api_router(state);
        let body = json!({
            "name": "Agus Pratama",
            "phone": "081311112222",
            "specialization": "Split AC"
        });

        call(&app, Method::POST, "/api/v1/technicians", Some(&admin), Some(body.clone())).await;
        let (status, json) =
            call(&app, Method::POST, "/api/v1/technicians", Some(&admin), Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["message"], "technician phone already exists");

        let (status, _) =
            call(&app, Method::GET, "/api/v1/technicians", Some(&customer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
