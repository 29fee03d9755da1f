//! OpenAPI 문서화 설정.
//!
//! utoipa로 인증/프로필/헬스 체크 엔드포인트의 OpenAPI 3.0 스펙을 생성합니다.
//! Swagger UI는 `/swagger-ui` 경로에서 사용 가능합니다.
//!
//! 새 엔드포인트를 문서에 추가하려면 핸들러에 `#[utoipa::path(...)]`를 붙이고
//! 이 파일의 `paths(...)`와 `components(schemas(...))`에 등록합니다.

use acdash_core::{AccountSummary, PageMeta, Role};
use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::TokenPair;
use crate::routes::health::{ReadinessResponse, StorageStatus};
use crate::routes::{HealthResponse, ProfileResponse};
use crate::services::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
};

/// Bearer 토큰 보안 스키마 등록.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

// ==================== OpenAPI 문서 정의 ====================

/// AC 서비스 대시보드 API 문서.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "AC Service Dashboard API",
        description = r#"
에어컨 서비스 업체 관리용 REST API입니다.

## 인증

`/api/v1/auth/*`와 `/health*`를 제외한 엔드포인트는 access 토큰이 필요합니다.
`Authorization: Bearer <token>` 헤더를 포함하세요.
"#
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 회원가입, 로그인, 토큰 갱신, 내 프로필")
    ),
    components(
        schemas(
            // ===== Health =====
            HealthResponse,
            ReadinessResponse,
            StorageStatus,

            // ===== Auth =====
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            RefreshRequest,
            RefreshResponse,
            TokenPair,
            AccountSummary,
            ProfileResponse,
            Role,

            // ===== Common =====
            PageMeta,
        )
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::refresh,
        crate::routes::auth::me,
    )
)]
pub struct ApiDoc;

/// Swagger UI 라우터 생성.
///
/// - `/swagger-ui` - Swagger UI
/// - `/api-docs/openapi.json` - OpenAPI JSON 스펙
pub fn swagger_ui_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .into()
}
