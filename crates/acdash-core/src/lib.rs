//! # AC Dashboard Core
//!
//! 에어컨 서비스 관리 백엔드의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 API 서버 전반에서 사용되는 기본 타입을 제공합니다:
//! - 계정/역할 모델
//! - 고객, 기술자, 서비스, 일정, 인보이스 엔티티
//! - 페이지네이션 계산
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
