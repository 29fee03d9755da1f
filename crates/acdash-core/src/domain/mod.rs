//! 도메인 모델.
//!
//! 계정, 고객, 기술자, 서비스, 일정, 인보이스와 페이지네이션 타입을 정의합니다.

pub mod account;
pub mod customer;
pub mod invoice;
pub mod money;
pub mod pagination;
pub mod role;
pub mod schedule;
pub mod service;
pub mod technician;

pub use account::{Account, AccountPatch, AccountSummary, NewAccount};
pub use customer::{Customer, CustomerPatch, NewCustomer};
pub use invoice::{
    invoice_total, line_subtotal, Invoice, InvoiceDetail, InvoicePatch, InvoiceStatus,
    NewInvoice, NewInvoiceDetail,
};
pub use money::{check_amount, MAX_AMOUNT, MONEY_SCALE};
pub use pagination::{PageMeta, PageRequest, DEFAULT_LIMIT, MAX_LIMIT};
pub use role::Role;
pub use schedule::{NewSchedule, Schedule, SchedulePatch, ScheduleStatus};
pub use service::{NewServiceOffering, ServiceOffering, ServiceOfferingPatch};
pub use technician::{NewTechnician, Technician, TechnicianPatch};

/// 빈 문자열/공백을 `None`으로 정규화합니다.
///
/// 검색 필터에서 `?name=` 같은 빈 파라미터를 "필터 없음"으로 취급할 때 사용합니다.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
