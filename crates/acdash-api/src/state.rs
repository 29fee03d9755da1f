//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `Arc<AppState>`로 감싸 Axum의 State extractor로 주입됩니다.
//! 요청 간 공유되는 가변 상태는 저장소뿐이며, 서명 키는 시작 후 읽기 전용입니다.

use std::sync::Arc;

use acdash_core::JwtConfig;
use chrono::{DateTime, Utc};

use crate::auth::TokenCodec;
use crate::services::{
    AccountService, CatalogService, CustomerService, InvoiceDetailService, InvoiceService,
    ScheduleService, TechnicianService,
};
use crate::store::{MemoryStore, Store};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 저장소 (PostgreSQL 또는 인메모리)
    pub store: Arc<dyn Store>,
    /// 토큰 발급/검증기
    pub tokens: Arc<TokenCodec>,

    pub accounts: AccountService,
    pub customers: CustomerService,
    pub technicians: TechnicianService,
    pub catalog: CatalogService,
    pub schedules: ScheduleService,
    pub invoices: InvoiceService,
    pub invoice_details: InvoiceDetailService,

    /// API 버전
    pub version: String,
    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// 저장소와 토큰 코덱으로 상태를 구성합니다.
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenCodec>) -> Self {
        Self {
            accounts: AccountService::new(store.clone(), tokens.clone()),
            customers: CustomerService::new(store.clone()),
            technicians: TechnicianService::new(store.clone()),
            catalog: CatalogService::new(store.clone()),
            schedules: ScheduleService::new(store.clone()),
            invoices: InvoiceService::new(store.clone()),
            invoice_details: InvoiceDetailService::new(store.clone()),
            store,
            tokens,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: Utc::now(),
        }
    }

    /// 인메모리 저장소로 상태를 구성합니다.
    pub fn in_memory(jwt: &JwtConfig) -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(TokenCodec::new(jwt)))
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }

    /// 저장소 연결 상태.
    pub async fn is_store_healthy(&self) -> bool {
        self.store.ping().await
    }
}

/// 테스트용 서명 키.
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_JWT_SECRET: &str = "acdash-test-secret";

/// 테스트용 AppState 생성 (인메모리 저장소).
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    AppState::in_memory(&JwtConfig::new(TEST_JWT_SECRET))
}

/// 주어진 역할의 계정을 만들고 `Authorization` 헤더 값을 반환합니다.
#[cfg(any(test, feature = "test-utils"))]
pub async fn bearer_for(state: &AppState, role: acdash_core::Role) -> String {
    let account = {
        let mut uow = state.store.begin().await.expect("begin");
        let account = uow
            .insert_account(acdash_core::NewAccount {
                name: format!("{} user", role),
                email: format!("{}-{}@example.com", role, uuid::Uuid::new_v4()),
                password_hash: String::new(),
                role,
                is_active: true,
            })
            .await
            .expect("insert account");
        uow.commit().await.expect("commit");
        account
    };

    let pair = state.tokens.issue(&account).expect("issue token");
    format!("Bearer {}", pair.access_token)
}
