//! 인보이스 및 인보이스 항목 모델.
//!
//! 인보이스 총액(`total_amount`)은 클라이언트가 직접 설정할 수 없는 파생 값입니다.
//! 항상 삭제되지 않은 항목들의 `subtotal` 합계와 같아야 하며,
//! 항목이 생성/수정/삭제될 때마다 API 계층의 재계산 단계에서 갱신됩니다.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::money::{check_amount, within_limit};
use crate::error::{DomainError, DomainResult};

/// 인보이스 결제 상태.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Overdue => "Overdue",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(InvoiceStatus::Unpaid),
            "Paid" => Ok(InvoiceStatus::Paid),
            "Overdue" => Ok(InvoiceStatus::Overdue),
            other => Err(DomainError::UnknownInvoiceStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for InvoiceStatus {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 인보이스.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Invoice {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    /// 항목 소계 합계 (파생 값)
    pub total_amount: Decimal,
    #[cfg_attr(feature = "sqlx-support", sqlx(try_from = "String"))]
    pub status: InvoiceStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

fn check_dates(invoice_date: NaiveDate, due_date: NaiveDate) -> DomainResult<()> {
    if due_date < invoice_date {
        return Err(DomainError::DueBeforeIssue);
    }
    Ok(())
}

/// 새 인보이스 입력. 총액은 항상 0에서 시작합니다.
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub schedule_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: InvoiceStatus,
}

impl NewInvoice {
    pub fn into_invoice(self, now: DateTime<Utc>) -> DomainResult<Invoice> {
        check_dates(self.invoice_date, self.due_date)?;
        Ok(Invoice {
            id: Uuid::new_v4(),
            schedule_id: self.schedule_id,
            customer_id: self.customer_id,
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            total_amount: Decimal::ZERO,
            status: self.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }
}

/// 인보이스 부분 수정. `total_amount`는 포함하지 않습니다.
#[derive(Debug, Clone, Default)]
pub struct InvoicePatch {
    pub schedule_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
}

impl InvoicePatch {
    pub fn apply(self, invoice: &mut Invoice, now: DateTime<Utc>) -> DomainResult<()> {
        let invoice_date = self.invoice_date.unwrap_or(invoice.invoice_date);
        let due_date = self.due_date.unwrap_or(invoice.due_date);
        check_dates(invoice_date, due_date)?;

        if let Some(id) = self.schedule_id {
            invoice.schedule_id = id;
        }
        if let Some(id) = self.customer_id {
            invoice.customer_id = id;
        }
        if let Some(status) = self.status {
            invoice.status = status;
        }
        invoice.invoice_date = invoice_date;
        invoice.due_date = due_date;
        invoice.updated_at = now;
        Ok(())
    }
}

/// 인보이스 항목.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct InvoiceDetail {
    pub id: Uuid,
    pub invoice_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    /// quantity × unit_price
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 항목 소계 계산.
///
/// 결과가 금액 컬럼 범위를 넘으면 `AmountTooLarge("subtotal")`.
pub fn line_subtotal(quantity: i32, unit_price: Decimal) -> DomainResult<Decimal> {
    within_limit("subtotal", unit_price.checked_mul(Decimal::from(quantity)))
}

/// 삭제되지 않은 항목의 소계 합계.
pub fn invoice_total<'a>(
    details: impl IntoIterator<Item = &'a InvoiceDetail>,
) -> DomainResult<Decimal> {
    details
        .into_iter()
        .filter(|d| d.deleted_at.is_none())
        .try_fold(Decimal::ZERO, |acc, d| {
            within_limit("total_amount", acc.checked_add(d.subtotal))
        })
}

fn check_line(quantity: i32, unit_price: Decimal) -> DomainResult<Decimal> {
    if quantity < 1 {
        return Err(DomainError::InvalidQuantity);
    }
    check_amount("unit_price", unit_price)?;
    line_subtotal(quantity, unit_price)
}

/// 새 인보이스 항목 입력.
#[derive(Debug, Clone)]
pub struct NewInvoiceDetail {
    pub invoice_id: Uuid,
    pub service_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

impl NewInvoiceDetail {
    /// 검증 후 소계를 계산하여 레코드를 만듭니다.
    pub fn into_detail(self, now: DateTime<Utc>) -> DomainResult<InvoiceDetail> {
        let subtotal = check_line(self.quantity, self.unit_price)?;
        Ok(InvoiceDetail {
            id: Uuid::new_v4(),
            invoice_id: self.invoice_id,
            service_id: self.service_id,
            quantity: self.quantity,
            unit_price: self.unit_price,
            subtotal,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }
}

impl InvoiceDetail {
    /// 수량/단가/서비스를 변경하고 소계를 다시 계산합니다.
    ///
    /// 검증 실패 시 항목은 변경되지 않습니다.
    pub fn reprice(
        &mut self,
        service_id: Option<Uuid>,
        quantity: Option<i32>,
        unit_price: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let quantity = quantity.unwrap_or(self.quantity);
        let unit_price = unit_price.unwrap_or(self.unit_price);
        let subtotal = check_line(quantity, unit_price)?;

        if let Some(id) = service_id {
            self.service_id = id;
        }
        self.quantity = quantity;
        self.unit_price = unit_price;
        self.subtotal = subtotal;
        self.updated_at = now;
        Ok(())
    }
}
