//! PostgreSQL 저장소.
//!
//! 작업 단위 하나가 sqlx 트랜잭션 하나에 대응합니다.
//! 커밋되지 않은 트랜잭션은 drop 시 롤백됩니다.

use std::time::Duration;

use acdash_core::{
    Account, Customer, DatabaseConfig, Invoice, InvoiceDetail, NewAccount, PageRequest, Schedule,
    ServiceOffering, Technician,
};
use async_trait::async_trait;
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    FromRow, PgConnection, PgPool, Postgres, QueryBuilder, Transaction,
};
use tracing::info;
use uuid::Uuid;

use super::{
    AccountFilter, AccountRepository, CustomerFilter, CustomerRepository, InvoiceDetailFilter,
    InvoiceDetailRepository, InvoiceFilter, InvoiceRepository, Page, ScheduleFilter,
    ScheduleRepository, ServiceFilter, ServiceRepository, Store, StoreError, StoreResult,
    TechnicianFilter, TechnicianRepository, UnitOfWork,
};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                // PostgreSQL 고유 제약 조건 위반
                let field = match db_err.constraint() {
                    Some("accounts_email_key") => "email",
                    Some("customers_phone_key") => "customer phone",
                    Some("customers_email_key") => "customer email",
                    Some("technicians_phone_key") => "technician phone",
                    _ => "record",
                };
                StoreError::UniqueViolation(field)
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// PostgreSQL 저장소.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 설정으로 연결 풀을 생성합니다.
    pub async fn connect(url: &str, config: &DatabaseConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect(url)
            .await?;

        info!(max_connections = config.max_connections, "PostgreSQL 연결 풀 생성 완료");
        Ok(Self::new(pool))
    }

    /// `migrations/` 디렉토리의 마이그레이션을 적용합니다.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))?;
        info!("데이터베이스 마이그레이션 완료");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// PostgreSQL 작업 단위.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

// ================================================================================================
// Helpers
// ================================================================================================

type Filters<'f> = dyn Fn(&mut QueryBuilder<'static, Postgres>) + Send + Sync + 'f;

/// `SELECT COUNT(*)` + `SELECT *` 두 쿼리로 한 페이지를 읽습니다.
///
/// `filters`는 `WHERE deleted_at IS NULL` 뒤에 ` AND ...` 조건을 덧붙입니다.
async fn fetch_page<T>(
    conn: &mut PgConnection,
    table: &str,
    filters: &Filters<'_>,
    order_by: &str,
    page: PageRequest,
) -> StoreResult<Page<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut count: QueryBuilder<'static, Postgres> = QueryBuilder::new(format!(
        "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
        table
    ));
    filters(&mut count);
    let total: i64 = count.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut select: QueryBuilder<'static, Postgres> =
        QueryBuilder::new(format!("SELECT * FROM {} WHERE deleted_at IS NULL", table));
    filters(&mut select);
    select.push(" ORDER BY ");
    select.push(order_by);
    select.push(" LIMIT ");
    select.push_bind(i64::from(page.limit()));
    select.push(" OFFSET ");
    select.push_bind(page.offset() as i64);

    let rows = select.build_query_as::<T>().fetch_all(&mut *conn).await?;
    Ok((rows, total.max(0) as u64))
}

fn ilike(term: &str) -> String {
    format!("%{}%", term)
}

// ================================================================================================
// Accounts
// ================================================================================================

#[async_trait]
impl AccountRepository for PgUnitOfWork {
    async fn insert_account(&mut self, account: NewAccount) -> StoreResult<Account> {
        let row = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, email, password_hash, role, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_active)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_account(&mut self, id: i64) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_account_by_email(&mut self, email: &str) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE lower(email) = lower($1) AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_account(&mut self, account: &Account) -> StoreResult<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET name = $2, email = $3, password_hash = $4, role = $5, is_active = $6,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.is_active)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound("user"))
    }

    async fn delete_account(&mut self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_accounts(
        &mut self,
        filter: &AccountFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Account>> {
        let role = filter.role;
        let filters = move |qb: &mut QueryBuilder<'static, Postgres>| {
            if let Some(role) = role {
                qb.push(" AND role = ").push_bind(role.as_str());
            }
        };
        fetch_page(&mut *self.tx, "accounts", &filters, "created_at DESC, id DESC", page).await
    }
}

// ================================================================================================
// Customers
// ================================================================================================

#[async_trait]
impl CustomerRepository for PgUnitOfWork {
    async fn insert_customer(&mut self, customer: &Customer) -> StoreResult<Customer> {
        let row = sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (id, name, phone, address, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.email)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_customer(&mut self, id: Uuid) -> StoreResult<Option<Customer>> {
        let row = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_customer(&mut self, customer: &Customer) -> StoreResult<Customer> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET name = $2, phone = $3, address = $4, email = $5, updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.email)
        .bind(customer.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound("customer"))
    }

    async fn delete_customer(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE customers SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_customers(
        &mut self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Customer>> {
        let filter = filter.clone();
        let filters = move |qb: &mut QueryBuilder<'static, Postgres>| {
            if let Some(name) = &filter.name {
                qb.push(" AND name ILIKE ").push_bind(ilike(name));
            }
            if let Some(phone) = &filter.phone {
                qb.push(" AND phone ILIKE ").push_bind(ilike(phone));
            }
            if let Some(email) = &filter.email {
                qb.push(" AND email ILIKE ").push_bind(ilike(email));
            }
        };
        fetch_page(&mut *self.tx, "customers", &filters, "created_at DESC", page).await
    }
}

// ================================================================================================
// Technicians
// ================================================================================================

#[async_trait]
impl TechnicianRepository for PgUnitOfWork {
    async fn insert_technician(&mut self, technician: &Technician) -> StoreResult<Technician> {
        let row = sqlx::query_as::<_, Technician>(
            r#"
            INSERT INTO technicians (id, name, phone, specialization, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(technician.id)
        .bind(&technician.name)
        .bind(&technician.phone)
        .bind(&technician.specialization)
        .bind(technician.created_at)
        .bind(technician.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_technician(&mut self, id: Uuid) -> StoreResult<Option<Technician>> {
        let row = sqlx::query_as::<_, Technician>(
            "SELECT * FROM technicians WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_technician(&mut self, technician: &Technician) -> StoreResult<Technician> {
        sqlx::query_as::<_, Technician>(
            r#"
            UPDATE technicians
            SET name = $2, phone = $3, specialization = $4, updated_at = $5
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(technician.id)
        .bind(&technician.name)
        .bind(&technician.phone)
        .bind(&technician.specialization)
        .bind(technician.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound("technician"))
    }

    async fn delete_technician(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE technicians SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_technicians(
        &mut self,
        filter: &TechnicianFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Technician>> {
        let filter = filter.clone();
        let filters = move |qb: &mut QueryBuilder<'static, Postgres>| {
            if let Some(name) = &filter.name {
                qb.push(" AND name ILIKE ").push_bind(ilike(name));
            }
            if let Some(specialization) = &filter.specialization {
                qb.push(" AND specialization ILIKE ")
                    .push_bind(ilike(specialization));
            }
        };
        fetch_page(&mut *self.tx, "technicians", &filters, "created_at DESC", page).await
    }
}

// ================================================================================================
// Services
// ================================================================================================

#[async_trait]
impl ServiceRepository for PgUnitOfWork {
    async fn insert_service(&mut self, service: &ServiceOffering) -> StoreResult<ServiceOffering> {
        let row = sqlx::query_as::<_, ServiceOffering>(
            r#"
            INSERT INTO services (id, name, price, duration_minutes, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(service.id)
        .bind(&service.name)
        .bind(service.price)
        .bind(service.duration_minutes)
        .bind(service.created_at)
        .bind(service.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_service(&mut self, id: Uuid) -> StoreResult<Option<ServiceOffering>> {
        let row = sqlx::query_as::<_, ServiceOffering>(
            "SELECT * FROM services WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_service_by_name(&mut self, name: &str) -> StoreResult<Option<ServiceOffering>> {
        let row = sqlx::query_as::<_, ServiceOffering>(
            "SELECT * FROM services WHERE name = $1 AND deleted_at IS NULL LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_service(
        &mut self,
        service: &ServiceOffering,
    ) -> StoreResult<ServiceOffering> {
        sqlx::query_as::<_, ServiceOffering>(
            r#"
            UPDATE services
            SET name = $2, price = $3, duration_minutes = $4, updated_at = $5
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(service.id)
        .bind(&service.name)
        .bind(service.price)
        .bind(service.duration_minutes)
        .bind(service.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound("service"))
    }

    async fn delete_service(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE services SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_services(
        &mut self,
        filter: &ServiceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<ServiceOffering>> {
        let filter = filter.clone();
        let filters = move |qb: &mut QueryBuilder<'static, Postgres>| {
            if let Some(name) = &filter.name {
                qb.push(" AND name ILIKE ").push_bind(ilike(name));
            }
            if let Some(min) = filter.min_price {
                qb.push(" AND price >= ").push_bind(min);
            }
            if let Some(max) = filter.max_price {
                qb.push(" AND price <= ").push_bind(max);
            }
        };
        fetch_page(&mut *self.tx, "services", &filters, "created_at DESC", page).await
    }
}

// ================================================================================================
// Schedules
// ================================================================================================

#[async_trait]
impl ScheduleRepository for PgUnitOfWork {
    async fn insert_schedule(&mut self, schedule: &Schedule) -> StoreResult<Schedule> {
        let row = sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules
                (id, customer_id, technician_id, service_id, scheduled_date, scheduled_time,
                 status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.customer_id)
        .bind(schedule.technician_id)
        .bind(schedule.service_id)
        .bind(schedule.scheduled_date)
        .bind(schedule.scheduled_time)
        .bind(schedule.status.as_str())
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_schedule(&mut self, id: Uuid) -> StoreResult<Option<Schedule>> {
        let row = sqlx::query_as::<_, Schedule>(
            "SELECT * FROM schedules WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_schedule(&mut self, schedule: &Schedule) -> StoreResult<Schedule> {
        sqlx::query_as::<_, Schedule>(
            r#"
            UPDATE schedules
            SET customer_id = $2, technician_id = $3, service_id = $4,
                scheduled_date = $5, scheduled_time = $6, status = $7, updated_at = $8
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.customer_id)
        .bind(schedule.technician_id)
        .bind(schedule.service_id)
        .bind(schedule.scheduled_date)
        .bind(schedule.scheduled_time)
        .bind(schedule.status.as_str())
        .bind(schedule.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound("schedule"))
    }

    async fn delete_schedule(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE schedules SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_schedules(
        &mut self,
        filter: &ScheduleFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Schedule>> {
        let filter = filter.clone();
        let filters = move |qb: &mut QueryBuilder<'static, Postgres>| {
            if let Some(id) = filter.customer_id {
                qb.push(" AND customer_id = ").push_bind(id);
            }
            if let Some(id) = filter.technician_id {
                qb.push(" AND technician_id = ").push_bind(id);
            }
            if let Some(id) = filter.service_id {
                qb.push(" AND service_id = ").push_bind(id);
            }
            if let Some(status) = filter.status {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
            if let Some(from) = filter.date_from {
                qb.push(" AND scheduled_date >= ").push_bind(from);
            }
            if let Some(to) = filter.date_to {
                qb.push(" AND scheduled_date <= ").push_bind(to);
            }
        };
        fetch_page(
            &mut *self.tx,
            "schedules",
            &filters,
            "scheduled_date DESC, scheduled_time DESC",
            page,
        )
        .await
    }
}

// ================================================================================================
// Invoices
// ================================================================================================

#[async_trait]
impl InvoiceRepository for PgUnitOfWork {
    async fn insert_invoice(&mut self, invoice: &Invoice) -> StoreResult<Invoice> {
        let row = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices
                (id, schedule_id, customer_id, invoice_date, due_date, total_amount, status,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.schedule_id)
        .bind(invoice.customer_id)
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(invoice.total_amount)
        .bind(invoice.status.as_str())
        .bind(invoice.created_at)
        .bind(invoice.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_invoice(&mut self, id: Uuid) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn lock_invoice(&mut self, id: Uuid) -> StoreResult<Option<Invoice>> {
        let row = sqlx::query_as::<_, Invoice>(
            "SELECT * FROM invoices WHERE id = $1 AND deleted_at IS NULL FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> StoreResult<Invoice> {
        sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET schedule_id = $2, customer_id = $3, invoice_date = $4, due_date = $5,
                total_amount = $6, status = $7, updated_at = $8
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.schedule_id)
        .bind(invoice.customer_id)
        .bind(invoice.invoice_date)
        .bind(invoice.due_date)
        .bind(invoice.total_amount)
        .bind(invoice.status.as_str())
        .bind(invoice.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound("invoice"))
    }

    async fn delete_invoice(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE invoices SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_invoices(
        &mut self,
        filter: &InvoiceFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Invoice>> {
        let filter = filter.clone();
        let filters = move |qb: &mut QueryBuilder<'static, Postgres>| {
            if let Some(id) = filter.customer_id {
                qb.push(" AND customer_id = ").push_bind(id);
            }
            if let Some(id) = filter.schedule_id {
                qb.push(" AND schedule_id = ").push_bind(id);
            }
            if let Some(status) = filter.status {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
            if let Some(from) = filter.date_from {
                qb.push(" AND invoice_date >= ").push_bind(from);
            }
            if let Some(to) = filter.date_to {
                qb.push(" AND invoice_date <= ").push_bind(to);
            }
        };
        fetch_page(
            &mut *self.tx,
            "invoices",
            &filters,
            "invoice_date DESC, created_at DESC",
            page,
        )
        .await
    }
}

// ================================================================================================
// Invoice details
// ================================================================================================

#[async_trait]
impl InvoiceDetailRepository for PgUnitOfWork {
    async fn insert_detail(&mut self, detail: &InvoiceDetail) -> StoreResult<InvoiceDetail> {
        let row = sqlx::query_as::<_, InvoiceDetail>(
            r#"
            INSERT INTO invoice_details
                (id, invoice_id, service_id, quantity, unit_price, subtotal, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(detail.id)
        .bind(detail.invoice_id)
        .bind(detail.service_id)
        .bind(detail.quantity)
        .bind(detail.unit_price)
        .bind(detail.subtotal)
        .bind(detail.created_at)
        .bind(detail.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn find_detail(&mut self, id: Uuid) -> StoreResult<Option<InvoiceDetail>> {
        let row = sqlx::query_as::<_, InvoiceDetail>(
            "SELECT * FROM invoice_details WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row)
    }

    async fn update_detail(&mut self, detail: &InvoiceDetail) -> StoreResult<InvoiceDetail> {
        sqlx::query_as::<_, InvoiceDetail>(
            r#"
            UPDATE invoice_details
            SET service_id = $2, quantity = $3, unit_price = $4, subtotal = $5, updated_at = $6
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(detail.id)
        .bind(detail.service_id)
        .bind(detail.quantity)
        .bind(detail.unit_price)
        .bind(detail.subtotal)
        .bind(detail.updated_at)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(StoreError::NotFound("invoice detail"))
    }

    async fn delete_detail(&mut self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE invoice_details SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn details_for_invoice(&mut self, invoice_id: Uuid) -> StoreResult<Vec<InvoiceDetail>> {
        let rows = sqlx::query_as::<_, InvoiceDetail>(
            r#"
            SELECT * FROM invoice_details
            WHERE invoice_id = $1 AND deleted_at IS NULL
            ORDER BY created_at ASC
            "#,
        )
        .bind(invoice_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows)
    }

    async fn delete_details_for_invoice(&mut self, invoice_id: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE invoice_details SET deleted_at = NOW(), updated_at = NOW() WHERE invoice_id = $1 AND deleted_at IS NULL",
        )
        .bind(invoice_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn list_details(
        &mut self,
        filter: &InvoiceDetailFilter,
        page: PageRequest,
    ) -> StoreResult<Page<InvoiceDetail>> {
        let invoice_id = filter.invoice_id;
        let filters = move |qb: &mut QueryBuilder<'static, Postgres>| {
            if let Some(id) = invoice_id {
                qb.push(" AND invoice_id = ").push_bind(id);
            }
        };
        fetch_page(&mut *self.tx, "invoice_details", &filters, "created_at ASC", page).await
    }
}
