//! 인메모리 저장소.
//!
//! 테스트와 데이터베이스 없는 개발 실행에 사용합니다.
//! 작업 단위는 전역 잠금을 잡은 상태에서 테이블 사본을 수정하고,
//! 커밋 시 사본으로 교체합니다. 커밋 없이 drop되면 사본이 버려집니다.

use std::sync::Arc;
#[cfg(any(test, feature = "test-utils"))]
use std::sync::atomic::{AtomicBool, Ordering};

use acdash_core::{
    Account, Customer, Invoice, InvoiceDetail, NewAccount, PageRequest, Schedule,
    ServiceOffering, Technician,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
    contains_ci, AccountFilter, AccountRepository, CustomerFilter, CustomerRepository,
    InvoiceDetailFilter, InvoiceDetailRepository, InvoiceFilter, InvoiceRepository, Page,
    ScheduleFilter, ScheduleRepository, ServiceFilter, ServiceRepository, Store, StoreError,
    StoreResult, TechnicianFilter, TechnicianRepository, UnitOfWork,
};

/// 소프트 삭제 가능한 행.
trait Row: Clone {
    type Key: PartialEq + Copy;
    const ENTITY: &'static str;

    fn key(&self) -> Self::Key;
    fn created(&self) -> DateTime<Utc>;
    fn deleted(&self) -> bool;
    fn mark_deleted(&mut self, now: DateTime<Utc>);
}

macro_rules! impl_row {
    ($ty:ty, $key:ty, $entity:literal) => {
        impl Row for $ty {
            type Key = $key;
            const ENTITY: &'static str = $entity;

            fn key(&self) -> $key {
                self.id
            }
            fn created(&self) -> DateTime<Utc> {
                self.created_at
            }
            fn deleted(&self) -> bool {
                self.deleted_at.is_some()
            }
            fn mark_deleted(&mut self, now: DateTime<Utc>) {
                self.deleted_at = Some(now);
                self.updated_at = now;
            }
        }
    };
}

impl_row!(Account, i64, "user");
impl_row!(Customer, Uuid, "customer");
impl_row!(Technician, Uuid, "technician");
impl_row!(ServiceOffering, Uuid, "service");
impl_row!(Schedule, Uuid, "schedule");
impl_row!(Invoice, Uuid, "invoice");
impl_row!(InvoiceDetail, Uuid, "invoice detail");

fn find_live<T: Row>(rows: &[T], key: T::Key) -> Option<T> {
    rows.iter().find(|r| r.key() == key && !r.deleted()).cloned()
}

fn replace_live<T: Row>(rows: &mut [T], row: &T) -> StoreResult<T> {
    let slot = rows
        .iter_mut()
        .find(|r| r.key() == row.key() && !r.deleted())
        .ok_or(StoreError::NotFound(T::ENTITY))?;
    *slot = row.clone();
    Ok(row.clone())
}

fn soft_delete<T: Row>(rows: &mut [T], key: T::Key) -> bool {
    match rows.iter_mut().find(|r| r.key() == key && !r.deleted()) {
        Some(row) => {
            row.mark_deleted(Utc::now());
            true
        }
        None => false,
    }
}

/// 삭제되지 않은 행 중 조건에 맞는 것을 최신순으로 페이지 처리합니다.
fn page_newest_first<T: Row>(
    rows: &[T],
    page: PageRequest,
    keep: impl Fn(&T) -> bool,
) -> Page<T> {
    let mut matched: Vec<T> = rows
        .iter()
        .rev()
        .filter(|r| !r.deleted() && keep(*r))
        .cloned()
        .collect();
    matched.sort_by(|a, b| b.created().cmp(&a.created()));
    paginate(matched, page)
}

fn paginate<T>(rows: Vec<T>, page: PageRequest) -> Page<T> {
    let total = rows.len() as u64;
    let items = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (items, total)
}

/// 고유값이 다른 살아있는 행과 겹치는지 검사합니다.
fn taken<T: Row>(rows: &[T], except: Option<T::Key>, same: impl Fn(&T) -> bool) -> bool {
    rows.iter()
        .any(|r| !r.deleted() && Some(r.key()) != except && same(r))
}

#[derive(Debug, Clone, Default)]
struct Tables {
    accounts: Vec<Account>,
    next_account_id: i64,
    customers: Vec<Customer>,
    technicians: Vec<Technician>,
    services: Vec<ServiceOffering>,
    schedules: Vec<Schedule>,
    invoices: Vec<Invoice>,
    details: Vec<InvoiceDetail>,
}

impl Tables {
    fn check_customer_unique(&self, customer: &Customer) -> StoreResult<()> {
        let except = Some(customer.id);
        if taken(&self.customers, except, |c| c.phone == customer.phone) {
            return Err(StoreError::UniqueViolation("customer phone"));
        }
        if taken(&self.customers, except, |c| c.email.eq_ignore_ascii_case(&customer.email)) {
            return Err(StoreError::UniqueViolation("customer email"));
        }
        Ok(())
    }

    fn check_technician_unique(&self, technician: &Technician) -> StoreResult<()> {
        if taken(&self.technicians, Some(technician.id), |t| t.phone == technician.phone) {
            return Err(StoreError::UniqueViolation("technician phone"));
        }
        Ok(())
    }

    fn check_account_unique(&self, id: Option<i64>, email: &str) -> StoreResult<()> {
        if taken(&self.accounts, id, |a| a.email.eq_ignore_ascii_case(email)) {
            return Err(StoreError::UniqueViolation("email"));
        }
        Ok(())
    }
}

/// 인메모리 저장소.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    #[cfg(any(test, feature = "test-utils"))]
    fail_invoice_updates: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후 시작되는 작업 단위에서 `update_invoice`가 백엔드 오류를 반환하게 합니다.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn fail_invoice_updates(&self, fail: bool) {
        self.fail_invoice_updates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = self.tables.clone().lock_owned().await;
        let work = guard.clone();
        Ok(Box::new(MemoryUnitOfWork {
            guard,
            work,
            #[cfg(any(test, feature = "test-utils"))]
            fail_invoice_updates: self.fail_invoice_updates.load(Ordering::SeqCst),
        }))
    }

    async fn ping(&self) -> bool {
        true
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// 인메모리 작업 단위.
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    work: Tables,
    #[cfg(any(test, feature = "test-utils"))]
    fail_invoice_updates: bool,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork { mut guard, work, .. } = *self;
        *guard = work;
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for MemoryUnitOfWork {
    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        self.work.check_account_unique(None, &account.email)?;
        self.work.next_account_id += 1;
        let account = account.into_account(self.work.next_account_id, Utc::now());
        self.work.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account(&mut self, id: i64) -> StoreResult<Option<Account>> {
        Ok(find_live(&self.work.accounts, id))
    }

    async fn find_account_by_email(&mut self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self
            .work
            .accounts
            .iter()
            .find(|a| !a.deleted() && a.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<Account> {
        self.work.check_account_unique(Some(account.id), &account.email)?;
        replace_live(&mut self.work.accounts, account)
    }

    async fn delete_account(&mut self, id: i64) -> StoreResult<bool> {
        Ok(soft_delete(&mut self.work.accounts, id))
    }

    async fn list_accounts(
        &mut self,
        filter: &AccountFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Account>> {
        Ok(page_newest_first(&self.work.accounts, page, |a| {
            filter.role.map_or(true, |role| a.role == role)
        }))
    }
}

#[async_trait]
impl CustomerRepository for MemoryUnitOfWork {
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<Customer> {
        self.work.check_customer_unique(customer)?;
        self.work.customers.push(customer.clone());
        Ok(customer.clone())
    }

    async fn find_customer(&mut self, id: Uuid) -> StoreResult<Option<Customer>> {
        Ok(find_live(&self.work.customers, id))
    }

    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<Customer> {
        self.work.check_customer_unique(customer)?;
        replace_live(&mut self.work.customers, customer)
    }

    async fn delete_customer(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(soft_delete(&mut self.work.customers, id))
    }

    async fn list_customers(
        &mut self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Customer>> {
        Ok(page_newest_first(&self.work.customers, page, |c| {
            filter.name.as_deref().map_or(true, |n| contains_ci(&c.name, n))
                && filter.phone.as_deref().map_or(true, |p| contains_ci(&c.phone, p))
                && filter.email.as_deref().map_or(true, |e| contains_ci(&c.email, e))
        }))
    }
}

#[async_trait]
impl TechnicianRepository for MemoryUnitOfWork {
    async fn insert_technician(&mut self, technician: &Technician) -> StoreResult<Technician> {
        self.work.check_technician_unique(technician)?;
        self.work.technicians.push(technician.clone());
        Ok(technician.clone())
    }

    async fn find_technician(&mut self, id: Uuid) -> StoreResult<Option<Technician>> {
        Ok(find_live(&self.work.technicians, id))
    }

    async fn update_technician(&mut self, technician: &Technician) -> StoreResult<Technician> {
        self.work.check_technician_unique(technician)?;
        replace_live(&mut self.work.technicians, technician)
    }

    async fn delete_technician(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(soft_delete(&mut self.work.technicians, id))
    }

    async fn list_technicians(
        &mut self,
        filter: &TechnicianFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Technician>> {
        Ok(page_newest_first(&self.work.technicians, page, |t| {
            filter.name.as_deref().map_or(true, |n| contains_ci(&t.name, n))
                && filter
                    .specialization
                    .as_deref()
                    .map_or(true, |s| contains_ci(&t.specialization, s))
        }))
    }
}

#[async_trait]
impl ServiceRepository for MemoryUnitOfWork {
    async fn insert_service(&mut self, service: &ServiceOffering) -> StoreResult<ServiceOffering> {
        self.work.services.push(service.clone());
        Ok(service.clone())
    }

    async fn find_service(&mut self, id: Uuid) -> StoreResult<Option<ServiceOffering>> {
        Ok(find_live(&self.work.services, id))
    }

    async fn find_service_by_name(&mut self, name: &str) -> StoreResult<Option<ServiceOffering>> {
        Ok(self
            .work
            .services
            .iter()
            .find(|s| !s.deleted() && s.name == name)
            .cloned())
    }

    async fn update_service(
        &mut self,
        service: &ServiceOffering,
    ) -> StoreResult<ServiceOffering> {
        replace_live(&mut self.work.services, service)
    }

    async fn delete_service(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(soft_delete(&mut self.work.services, id))
    }

    async fn list_services(
        &mut self,
        filter: &ServiceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ServiceOffering>> {
        Ok(page_newest_first(&self.work.services, page, |s| {
            filter.name.as_deref().map_or(true, |n| contains_ci(&s.name, n))
                && filter.min_price.map_or(true, |min| s.price >= min)
                && filter.max_price.map_or(true, |max| s.price <= max)
        }))
    }
}

#[async_trait]
impl ScheduleRepository for MemoryUnitOfWork {
    async fn insert_schedule(&mut self, schedule: &Schedule) -> StoreResult<Schedule> {
        self.work.schedules.push(schedule.clone());
        Ok(schedule.clone())
    }

    async fn find_schedule(&mut self, id: Uuid) -> StoreResult<Option<Schedule>> {
        Ok(find_live(&self.work.schedules, id))
    }

    async fn update_schedule(&mut self, schedule: &Schedule) -> StoreResult<Schedule> {
        replace_live(&mut self.work.schedules, schedule)
    }

    async fn delete_schedule(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(soft_delete(&mut self.work.schedules, id))
    }

    async fn list_schedules(
        &mut self,
        filter: &ScheduleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Schedule>> {
        let mut matched: Vec<Schedule> = self
            .work
            .schedules
            .iter()
            .filter(|s| {
                !s.deleted()
                    && filter.customer_id.map_or(true, |id| s.customer_id == id)
                    && filter.technician_id.map_or(true, |id| s.technician_id == id)
                    && filter.service_id.map_or(true, |id| s.service_id == id)
                    && filter.status.map_or(true, |st| s.status == st)
                    && filter.date_from.map_or(true, |d| s.scheduled_date >= d)
                    && filter.date_to.map_or(true, |d| s.scheduled_date <= d)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| {
            (b.scheduled_date, b.scheduled_time).cmp(&(a.scheduled_date, a.scheduled_time))
        });
        Ok(paginate(matched, page))
    }
}

#[async_trait]
impl InvoiceRepository for MemoryUnitOfWork {
    async fn insert_invoice(&mut self, invoice: &Invoice) -> StoreResult<Invoice> {
        self.work.invoices.push(invoice.clone());
        Ok(invoice.clone())
    }

    async fn find_invoice(&mut self, id: Uuid) -> StoreResult<Option<Invoice>> {
        Ok(find_live(&self.work.invoices, id))
    }

    async fn lock_invoice(&mut self, id: Uuid) -> StoreResult<Option<Invoice>> {
        // 작업 단위 전체가 이미 배타 잠금 상태
        Ok(find_live(&self.work.invoices, id))
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> StoreResult<Invoice> {
        #[cfg(any(test, feature = "test-utils"))]
        if self.fail_invoice_updates {
            return Err(StoreError::Backend("invoice update unavailable".to_string()));
        }
        replace_live(&mut self.work.invoices, invoice)
    }

    async fn delete_invoice(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(soft_delete(&mut self.work.invoices, id))
    }

    async fn list_invoices(
        &mut self,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Invoice>> {
        let mut matched: Vec<Invoice> = self
            .work
            .invoices
            .iter()
            .rev()
            .filter(|i| {
                !i.deleted()
                    && filter.customer_id.map_or(true, |id| i.customer_id == id)
                    && filter.schedule_id.map_or(true, |id| i.schedule_id == id)
                    && filter.status.map_or(true, |st| i.status == st)
                    && filter.date_from.map_or(true, |d| i.invoice_date >= d)
                    && filter.date_to.map_or(true, |d| i.invoice_date <= d)
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.invoice_date.cmp(&a.invoice_date));
        Ok(paginate(matched, page))
    }
}

#[async_trait]
impl InvoiceDetailRepository for MemoryUnitOfWork {
    async fn insert_detail(&mut self, detail: &InvoiceDetail) -> StoreResult<InvoiceDetail> {
        self.work.details.push(detail.clone());
        Ok(detail.clone())
    }

    async fn find_detail(&mut self, id: Uuid) -> StoreResult<Option<InvoiceDetail>> {
        Ok(find_live(&self.work.details, id))
    }

    async fn update_detail(&mut self, detail: &InvoiceDetail) -> StoreResult<InvoiceDetail> {
        replace_live(&mut self.work.details, detail)
    }

    async fn delete_detail(&mut self, id: Uuid) -> StoreResult<bool> {
        Ok(soft_delete(&mut self.work.details, id))
    }

    async fn details_for_invoice(&mut self, invoice_id: Uuid) -> StoreResult<Vec<InvoiceDetail>> {
        Ok(self
            .work
            .details
            .iter()
            .filter(|d| !d.deleted() && d.invoice_id == invoice_id)
            .cloned()
            .collect())
    }

    async fn delete_details_for_invoice(&mut self, invoice_id: Uuid) -> StoreResult<u64> {
        let now = Utc::now();
        let mut count = 0;
        for detail in self
            .work
            .details
            .iter_mut()
            .filter(|d| !d.deleted() && d.invoice_id == invoice_id)
        {
            detail.mark_deleted(now);
            count += 1;
        }
        Ok(count)
    }

    async fn list_details(
        &mut self,
        filter: &InvoiceDetailFilter,
        page: PageRequest,
    ) -> StoreResult<Page<InvoiceDetail>> {
        let matched: Vec<InvoiceDetail> = self
            .work
            .details
            .iter()
            .filter(|d| !d.deleted() && filter.invoice_id.map_or(true, |id| d.invoice_id == id))
            .cloned()
            .collect();
        Ok(paginate(matched, page))
    }
}
