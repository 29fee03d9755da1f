//! AC 서비스 대시보드 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (고객, 기술자, 서비스, 일정, 인보이스)
//! - JWT access/refresh 인증과 역할 기반 인가
//! - PostgreSQL 및 인메모리 저장소
//! - 헬스 체크 엔드포인트와 OpenAPI 문서
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: JWT 인증 및 권한 관리
//! - [`services`]: 비즈니스 로직 (계정, CRUD, 인보이스 총액 재계산)
//! - [`store`]: 작업 단위 기반 저장소
//! - [`openapi`]: OpenAPI 문서 및 Swagger UI

pub mod auth;
pub mod error;
pub mod extract;
pub mod openapi;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;

pub use auth::{hash_password, verify_password, AuthContext, Claims, TokenCodec, TokenPair};
pub use error::{ApiError, ApiResult};
pub use routes::create_api_router;
pub use state::AppState;
pub use store::{MemoryStore, PgStore, Store};

#[cfg(any(test, feature = "test-utils"))]
pub use state::{bearer_for, create_test_state};
