//! 사용자 관리 라우트 (관리자 전용).
//!
//! - `GET /api/v1/users` - 사용자 목록
//! - `POST /api/v1/users` - 사용자 생성
//! - `GET /api/v1/users/role/{role}` - 역할별 사용자 목록
//! - `GET /api/v1/users/{id}` - 사용자 조회
//! - `PUT /api/v1/users/{id}` - 사용자 수정
//! - `DELETE /api/v1/users/{id}` - 사용자 삭제 (soft)

use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::{parse_filter, PageQuery};
use crate::auth::{require_role, ADMIN_ONLY};
use crate::error::ApiResult;
use crate::extract::{PathParam, ValidatedJson, ValidatedQuery};
use crate::response::{created, ok, paginated, ApiResponse};
use crate::services::{CreateUserRequest, UpdateUserRequest};
use crate::state::AppState;
use crate::store::AccountFilter;

// ================================================================================================
// Handlers
// ================================================================================================

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let (users, meta) = state
        .accounts
        .list_users(AccountFilter::default(), query.request())
        .await?;
    Ok(paginated("Users retrieved successfully", users, meta))
}

pub async fn list_users_by_role(
    State(state): State<Arc<AppState>>,
    PathParam(role): PathParam<String>,
    ValidatedQuery(query): ValidatedQuery<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let filter = AccountFilter {
        role: parse_filter("role", Some(role))?,
    };
    let (users, meta) = state.accounts.list_users(filter, query.request()).await?;
    Ok(paginated("Users retrieved successfully", users, meta))
}

pub async fn create_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.accounts.create_user(req).await?;
    Ok(created("User created successfully", user))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<impl IntoResponse> {
    let user = state.accounts.get_user(id).await?;
    Ok(ok("User retrieved successfully", user))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = state.accounts.update_user(id, req).await?;
    Ok(ok("User updated successfully", user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    PathParam(id): PathParam<i64>,
) -> ApiResult<impl IntoResponse> {
    state.accounts.delete_user(id).await?;
    Ok(Json(ApiResponse::message_only("User deleted successfully")))
}

// ================================================================================================
// Router
// ================================================================================================

pub fn users_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/role/{role}", get(list_users_by_role))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route_layer(middleware::from_fn(require_role(ADMIN_ONLY)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::{create_api_router, testing::call};
    use crate::state::{bearer_for, create_test_state};
    use acdash_core::Role;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    async fn setup() -> (Router, String) {
        let state = Arc::new(create_test_state());
        let admin = bearer_for(&state, Role::Admin).await;
        (create_api_router(state), admin)
    }

    #[tokio::test]
    async fn test_non_admin_forbidden() {
        let state = Arc::new(create_test_state());
        let technician = bearer_for(&state, Role::Technician).await;
        let app = create_api_router(state);

        let (status, json) = call(&app, Method::GET, "/api/v1/users", Some(&technician), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "insufficient permissions");
    }

    #[tokio::test]
    async fn test_user_lifecycle() {
        let (app, admin) = setup().await;

        let (status, json) = call(
            &app,
            Method::POST,
            "/api/v1/users",
            Some(&admin),
            Some(json!({
                "name": "Agus Teknisi",
                "email": "agus@example.com",
                "password": "rahasia123",
                "role": "technician"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["data"]["role"], "technician");
        let id = json["data"]["id"].as_i64().unwrap();

        let (status, json) = call(
            &app,
            Method::PUT,
            &format!("/api/v1/users/{}", id),
            Some(&admin),
            Some(json!({ "is_active": false })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["is_active"], false);

        let (status, json) = call(
            &app,
            Method::GET,
            "/api/v1/users/role/technician",
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pagination"]["total"], 1);

        let (status, _) = call(
            &app,
            Method::DELETE,
            &format!("/api/v1/users/{}", id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, json) = call(
            &app,
            Method::GET,
            &format!("/api/v1/users/{}", id),
            Some(&admin),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["message"], "user not found");
    }

    #[tokio::test]
    async fn test_unknown_role_filter() {
        let (app, admin) = setup().await;
        let (status, json) =
            call(&app, Method::GET, "/api/v1/users/role/root", Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "invalid role");
    }

    #[tokio::test]
    async fn test_non_numeric_id() {
        let (app, admin) = setup().await;
        let (status, json) = call(&app, Method::GET, "/api/v1/users/abc", Some(&admin), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
    }
}
