//! 인보이스 서비스.
//!
//! 총액(`total_amount`)은 요청으로 변경할 수 없고 항목 변경 시에만 재계산됩니다.

use std::sync::Arc;

use acdash_core::{
    Invoice, InvoiceDetail, InvoicePatch, InvoiceStatus, NewInvoice, PageMeta, PageRequest,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::services::reconcile::reconcile;
use crate::store::{InvoiceFilter, Store, UnitOfWork};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    pub schedule_id: Uuid,
    pub customer_id: Uuid,
    pub invoice_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInvoiceRequest {
    pub schedule_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub invoice_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub status: Option<InvoiceStatus>,
}

async fn ensure_references(
    uow: &mut dyn UnitOfWork,
    schedule_id: Option<Uuid>,
    customer_id: Option<Uuid>,
) -> ApiResult<()> {
    if let Some(id) = schedule_id {
        uow.find_schedule(id)
            .await?
            .ok_or(ApiError::NotFound("schedule"))?;
    }
    if let Some(id) = customer_id {
        uow.find_customer(id)
            .await?
            .ok_or(ApiError::NotFound("customer"))?;
    }
    Ok(())
}

/// 인보이스 서비스.
#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn Store>,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// 총액 0으로 인보이스를 생성합니다.
    pub async fn create(&self, req: CreateInvoiceRequest) -> ApiResult<Invoice> {
        let invoice = NewInvoice {
            schedule_id: req.schedule_id,
            customer_id: req.customer_id,
            invoice_date: req.invoice_date,
            due_date: req.due_date,
            status: req.status.unwrap_or_default(),
        }
        .into_invoice(Utc::now())?;

        let mut uow = self.store.begin().await?;
        ensure_references(uow.as_mut(), Some(req.schedule_id), Some(req.customer_id)).await?;

        let invoice = uow.insert_invoice(&invoice).await?;
        uow.commit().await?;

        info!(invoice_id = %invoice.id, customer_id = %invoice.customer_id, "인보이스 생성");
        Ok(invoice)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Invoice> {
        let mut uow = self.store.begin().await?;
        uow.find_invoice(id)
            .await?
            .ok_or(ApiError::NotFound("invoice"))
    }

    pub async fn update(&self, id: Uuid, req: UpdateInvoiceRequest) -> ApiResult<Invoice> {
        let mut uow = self.store.begin().await?;
        let mut invoice = uow
            .lock_invoice(id)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;

        ensure_references(uow.as_mut(), req.schedule_id, req.customer_id).await?;

        InvoicePatch {
            schedule_id: req.schedule_id,
            customer_id: req.customer_id,
            invoice_date: req.invoice_date,
            due_date: req.due_date,
            status: req.status,
        }
        .apply(&mut invoice, Utc::now())?;

        let invoice = uow.update_invoice(&invoice).await?;
        uow.commit().await?;

        info!(invoice_id = %invoice.id, status = %invoice.status, "인보이스 수정");
        Ok(invoice)
    }

    /// 인보이스와 그 항목을 함께 소프트 삭제합니다.
    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let mut uow = self.store.begin().await?;
        uow.lock_invoice(id)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;

        let lines = uow.delete_details_for_invoice(id).await?;
        uow.delete_invoice(id).await?;
        uow.commit().await?;

        info!(invoice_id = %id, lines, "인보이스 삭제");
        Ok(())
    }

    pub async fn search(
        &self,
        filter: InvoiceFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<Invoice>, PageMeta)> {
        let mut uow = self.store.begin().await?;
        let (rows, total) = uow.list_invoices(&filter, page).await?;
        Ok((rows, page.meta(total)))
    }

    /// 인보이스의 항목 전체 (생성 순).
    pub async fn details(&self, id: Uuid) -> ApiResult<Vec<InvoiceDetail>> {
        let mut uow = self.store.begin().await?;
        uow.find_invoice(id)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;
        Ok(uow.details_for_invoice(id).await?)
    }

    /// 총액을 항목 합계로 다시 맞춥니다 (수동 복구용).
    pub async fn reconcile(&self, id: Uuid) -> ApiResult<Invoice> {
        let mut uow = self.store.begin().await?;
        let invoice = reconcile(uow.as_mut(), id).await?;
        uow.commit().await?;

        info!(invoice_id = %id, total = %invoice.total_amount, "인보이스 총액 재계산");
        Ok(invoice)
    }
}
