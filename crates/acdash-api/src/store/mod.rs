//! 저장소 추상화.
//!
//! 서비스 계층은 [`Store::begin`]으로 작업 단위([`UnitOfWork`])를 얻고,
//! 모든 쓰기를 마친 뒤 [`UnitOfWork::commit`]을 호출합니다.
//! 커밋하지 않고 drop된 작업 단위는 롤백됩니다 (에러 반환, panic 포함).
//!
//! 구현체:
//! - [`memory::MemoryStore`]: 테스트/개발용 인메모리 저장소
//! - [`postgres::PgStore`]: sqlx 기반 PostgreSQL 저장소

pub mod memory;
pub mod postgres;

use acdash_core::{
    Account, Customer, Invoice, InvoiceDetail, InvoiceStatus, PageRequest, Role, Schedule,
    ScheduleStatus, ServiceOffering, Technician, NewAccount,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// 저장소 에러.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// 갱신/삭제 대상 레코드 없음
    #[error("{0} not found")]
    NotFound(&'static str),

    /// 고유 제약 위반 (필드 설명 포함, 예: "customer phone")
    #[error("{0} already exists")]
    UniqueViolation(&'static str),

    /// 백엔드 오류 (연결, 쿼리 등)
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// 저장소 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 목록 조회 결과 (현재 페이지 레코드, 전체 건수).
pub type Page<T> = (Vec<T>, u64);

// ==================== 검색 필터 ====================

#[derive(Debug, Clone, Default)]
pub struct AccountFilter {
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TechnicianFilter {
    pub name: Option<String>,
    pub specialization: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ServiceFilter {
    pub name: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct ScheduleFilter {
    pub customer_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub status: Option<ScheduleStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub customer_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
    pub status: Option<InvoiceStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceDetailFilter {
    pub invoice_id: Option<Uuid>,
}

/// 대소문자 무시 부분 일치.
pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

// ==================== 리포지토리 ====================
//
// 모든 조회는 소프트 삭제된 레코드를 제외합니다.
// update_* 는 대상이 없거나 삭제된 경우 StoreError::NotFound를 반환합니다.

#[async_trait]
pub trait AccountRepository: Send {
    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account>;
    async fn find_account(&mut self, id: i64) -> StoreResult<Option<Account>>;
    async fn find_account_by_email(&mut self, email: &str) -> StoreResult<Option<Account>>;
    async fn update_account(&mut self, account: &Account) -> StoreResult<Account>;
    async fn delete_account(&mut self, id: i64) -> StoreResult<bool>;
    async fn list_accounts(
        &mut self,
        filter: &AccountFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Account>>;
}

#[async_trait]
pub trait CustomerRepository: Send {
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<Customer>;
    async fn find_customer(&mut self, id: Uuid) -> StoreResult<Option<Customer>>;
    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<Customer>;
    async fn delete_customer(&mut self, id: Uuid) -> StoreResult<bool>;
    async fn list_customers(
        &mut self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Customer>>;
}

#[async_trait]
pub trait TechnicianRepository: Send {
    async fn insert_technician(&mut self, technician: &Technician) -> StoreResult<Technician>;
    async fn find_technician(&mut self, id: Uuid) -> StoreResult<Option<Technician>>;
    async fn update_technician(&mut self, technician: &Technician) -> StoreResult<Technician>;
    async fn delete_technician(&mut self, id: Uuid) -> StoreResult<bool>;
    async fn list_technicians(
        &mut self,
        filter: &TechnicianFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Technician>>;
}

#[async_trait]
pub trait ServiceRepository: Send {
    async fn insert_service(&mut self, service: &ServiceOffering) -> StoreResult<ServiceOffering>;
    async fn find_service(&mut self, id: Uuid) -> StoreResult<Option<ServiceOffering>>;
    async fn find_service_by_name(&mut self, name: &str) -> StoreResult<Option<ServiceOffering>>;
    async fn update_service(&mut self, service: &ServiceOffering)
        -> StoreResult<ServiceOffering>;
    async fn delete_service(&mut self, id: Uuid) -> StoreResult<bool>;
    async fn list_services(
        &mut self,
        filter: &ServiceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ServiceOffering>>;
}

#[async_trait]
pub trait ScheduleRepository: Send {
    async fn insert_schedule(&mut self, schedule: &Schedule) -> StoreResult<Schedule>;
    async fn find_schedule(&mut self, id: Uuid) -> StoreResult<Option<Schedule>>;
    async fn update_schedule(&mut self, schedule: &Schedule) -> StoreResult<Schedule>;
    async fn delete_schedule(&mut self, id: Uuid) -> StoreResult<bool>;
    async fn list_schedules(
        &mut self,
        filter: &ScheduleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Schedule>>;
}

#[async_trait]
pub trait InvoiceRepository: Send {
    async fn insert_invoice(&mut self, invoice: &Invoice) -> StoreResult<Invoice>;
    async fn find_invoice(&mut self, id: Uuid) -> StoreResult<Option<Invoice>>;
    /// 같은 작업 단위 안에서 인보이스 행을 잠그고 조회합니다.
    ///
    /// 총액 재계산의 read-modify-write를 인보이스 단위로 직렬화합니다.
    async fn lock_invoice(&mut self, id: Uuid) -> StoreResult<Option<Invoice>>;
    async fn update_invoice(&mut self, invoice: &Invoice) -> StoreResult<Invoice>;
    async fn delete_invoice(&mut self, id: Uuid) -> StoreResult<bool>;
    async fn list_invoices(
        &mut self,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Invoice>>;
}

#[async_trait]
pub trait InvoiceDetailRepository: Send {
    async fn insert_detail(&mut self, detail: &InvoiceDetail) -> StoreResult<InvoiceDetail>;
    async fn find_detail(&mut self, id: Uuid) -> StoreResult<Option<InvoiceDetail>>;
    async fn update_detail(&mut self, detail: &InvoiceDetail) -> StoreResult<InvoiceDetail>;
    async fn delete_detail(&mut self, id: Uuid) -> StoreResult<bool>;
    /// 인보이스의 삭제되지 않은 항목 전체 (생성 순).
    async fn details_for_invoice(&mut self, invoice_id: Uuid) -> StoreResult<Vec<InvoiceDetail>>;
    /// 인보이스의 모든 항목을 소프트 삭제하고 삭제 건수를 반환합니다.
    async fn delete_details_for_invoice(&mut self, invoice_id: Uuid) -> StoreResult<u64>;
    async fn list_details(
        &mut self,
        filter: &InvoiceDetailFilter,
        page: PageRequest,
    ) -> StoreResult<Page<InvoiceDetail>>;
}

/// 하나의 트랜잭션 경계.
#[async_trait]
pub trait UnitOfWork:
    AccountRepository
    + CustomerRepository
    + TechnicianRepository
    + ServiceRepository
    + ScheduleRepository
    + InvoiceRepository
    + InvoiceDetailRepository
    + Send
{
    /// 변경 사항을 확정합니다.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// 작업 단위 팩토리.
#[async_trait]
pub trait Store: Send + Sync {
    /// 새 작업 단위를 시작합니다.
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

    /// 저장소 연결 상태.
    async fn ping(&self) -> bool;

    /// 백엔드 이름 ("memory" | "postgres").
    fn backend(&self) -> &'static str;
}
