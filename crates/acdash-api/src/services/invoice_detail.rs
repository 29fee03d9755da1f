//! 인보이스 항목 서비스.
//!
//! 항목 변경과 부모 인보이스 총액 재계산은 하나의 작업 단위에서 커밋됩니다.
//! 재계산이 실패하면 항목 변경도 남지 않습니다.

use std::sync::Arc;

use acdash_core::{InvoiceDetail, NewInvoiceDetail, PageMeta, PageRequest};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::services::reconcile::reconcile;
use crate::store::{InvoiceDetailFilter, Store};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInvoiceDetailRequest {
    pub invoice_id: Uuid,
    pub service_id: Uuid,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i32,
    /// 미지정 시 서비스 카탈로그 가격
    #[serde(default)]
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInvoiceDetailRequest {
    pub service_id: Option<Uuid>,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: Option<i32>,
    pub unit_price: Option<Decimal>,
}

/// 인보이스 항목 서비스.
#[derive(Clone)]
pub struct InvoiceDetailService {
    store: Arc<dyn Store>,
}

impl InvoiceDetailService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateInvoiceDetailRequest) -> ApiResult<InvoiceDetail> {
        let mut uow = self.store.begin().await?;

        uow.lock_invoice(req.invoice_id)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;
        let service = uow
            .find_service(req.service_id)
            .await?
            .ok_or(ApiError::NotFound("service"))?;

        let detail = NewInvoiceDetail {
            invoice_id: req.invoice_id,
            service_id: req.service_id,
            quantity: req.quantity,
            unit_price: req.unit_price.unwrap_or(service.price),
        }
        .into_detail(Utc::now())?;

        let detail = uow.insert_detail(&detail).await?;
        let invoice = reconcile(uow.as_mut(), detail.invoice_id).await?;
        uow.commit().await?;

        info!(
            detail_id = %detail.id,
            invoice_id = %invoice.id,
            subtotal = %detail.subtotal,
            total = %invoice.total_amount,
            "인보이스 항목 추가"
        );
        Ok(detail)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<InvoiceDetail> {
        let mut uow = self.store.begin().await?;
        uow.find_detail(id)
            .await?
            .ok_or(ApiError::NotFound("invoice detail"))
    }

    pub async fn update(
        &self,
        id: Uuid,
        req: UpdateInvoiceDetailRequest,
    ) -> ApiResult<InvoiceDetail> {
        let mut uow = self.store.begin().await?;
        let mut detail = uow
            .find_detail(id)
            .await?
            .ok_or(ApiError::NotFound("invoice detail"))?;

        // 총액 재계산 전에 부모 인보이스를 먼저 잠급니다
        uow.lock_invoice(detail.invoice_id)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;

        if let Some(service_id) = req.service_id {
            uow.find_service(service_id)
                .await?
                .ok_or(ApiError::NotFound("service"))?;
        }

        detail.reprice(req.service_id, req.quantity, req.unit_price, Utc::now())?;

        let detail = uow.update_detail(&detail).await?;
        let invoice = reconcile(uow.as_mut(), detail.invoice_id).await?;
        uow.commit().await?;

        info!(
            detail_id = %detail.id,
            invoice_id = %invoice.id,
            total = %invoice.total_amount,
            "인보이스 항목 수정"
        );
        Ok(detail)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let mut uow = self.store.begin().await?;
        let detail = uow
            .find_detail(id)
            .await?
            .ok_or(ApiError::NotFound("invoice detail"))?;

        uow.lock_invoice(detail.invoice_id)
            .await?
            .ok_or(ApiError::NotFound("invoice"))?;
        uow.delete_detail(id).await?;
        let invoice = reconcile(uow.as_mut(), detail.invoice_id).await?;
        uow.commit().await?;

        info!(
            detail_id = %id,
            invoice_id = %invoice.id,
            total = %invoice.total_amount,
            "인보이스 항목 삭제"
        );
        Ok(())
    }

    pub async fn search(
        &self,
        filter: InvoiceDetailFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<InvoiceDetail>, PageMeta)> {
        let mut uow = self.store.begin().await?;
        let (rows, total) = uow.list_details(&filter, page).await?;
        Ok((rows, page.meta(total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::invoice::InvoiceService;
    use crate::services::testing::{booking, invoice_request};
    use crate::store::MemoryStore;
    use acdash_core::MAX_AMOUNT;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_total_follows_line_changes() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let booking = booking(&store).await;
        let invoices = InvoiceService::new(store.clone());
        let details = InvoiceDetailService::new(store);

        let invoice = invoices.create(invoice_request(&booking)).await.unwrap();
        assert_eq!(invoice.total_amount, dec!(0));

        let cleaning = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.cleaning_id,
                quantity: 2,
                unit_price: None,
            })
            .await
            .unwrap();
        assert_eq!(cleaning.unit_price, dec!(150000));
        assert_eq!(cleaning.subtotal, dec!(300000));
        assert_eq!(invoices.get(invoice.id).await.unwrap().total_amount, dec!(300000));

        details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.inspection_id,
                quantity: 1,
                unit_price: Some(dec!(50000)),
            })
            .await
            .unwrap();
        assert_eq!(invoices.get(invoice.id).await.unwrap().total_amount, dec!(350000));

        details.delete(cleaning.id).await.unwrap();
        assert_eq!(invoices.get(invoice.id).await.unwrap().total_amount, dec!(50000));
    }

    #[tokio::test]
    async fn test_update_reprices_and_reconciles() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let booking = booking(&store).await;
        let invoices = InvoiceService::new(store.clone());
        let details = InvoiceDetailService::new(store);
        let invoice = invoices.create(invoice_request(&booking)).await.unwrap();

        let line = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.cleaning_id,
                quantity: 1,
                unit_price: None,
            })
            .await
            .unwrap();

        let line = details
            .update(
                line.id,
                UpdateInvoiceDetailRequest {
                    quantity: Some(3),
                    unit_price: Some(dec!(120000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(line.subtotal, dec!(360000));
        assert_eq!(invoices.get(invoice.id).await.unwrap().total_amount, dec!(360000));
    }

    #[tokio::test]
    async fn test_invalid_line_leaves_total_untouched() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let booking = booking(&store).await;
        let invoices = InvoiceService::new(store.clone());
        let details = InvoiceDetailService::new(store);
        let invoice = invoices.create(invoice_request(&booking)).await.unwrap();

        let line = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.cleaning_id,
                quantity: 1,
                unit_price: None,
            })
            .await
            .unwrap();

        let err = details
            .update(
                line.id,
                UpdateInvoiceDetailRequest {
                    unit_price: Some(dec!(-5)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));
        assert_eq!(details.get(line.id).await.unwrap().subtotal, dec!(150000));
        assert_eq!(invoices.get(invoice.id).await.unwrap().total_amount, dec!(150000));
    }

    #[tokio::test]
    async fn test_unknown_invoice_or_service() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let booking = booking(&store).await;
        let invoices = InvoiceService::new(store.clone());
        let details = InvoiceDetailService::new(store);
        let invoice = invoices.create(invoice_request(&booking)).await.unwrap();

        let err = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: Uuid::new_v4(),
                service_id: booking.cleaning_id,
                quantity: 1,
                unit_price: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("invoice")));

        let err = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound("service")));
    }

    #[tokio::test]
    async fn test_manual_reconcile_repairs_total() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let booking = booking(&store).await;
        let invoices = InvoiceService::new(store.clone());
        let details = InvoiceDetailService::new(store.clone());
        let invoice = invoices.create(invoice_request(&booking)).await.unwrap();

        details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.cleaning_id,
                quantity: 1,
                unit_price: None,
            })
            .await
            .unwrap();

        // 저장소에서 총액을 직접 어긋나게 만든 뒤 복구
        let mut uow = store.begin().await.unwrap();
        let mut stale = uow.find_invoice(invoice.id).await.unwrap().unwrap();
        stale.total_amount = dec!(1);
        uow.update_invoice(&stale).await.unwrap();
        uow.commit().await.unwrap();

        let repaired = invoices.reconcile(invoice.id).await.unwrap();
        assert_eq!(repaired.total_amount, dec!(150000));
    }

    #[tokio::test]
    async fn test_failed_total_write_discards_line_change() {
        let memory = MemoryStore::new();
        let store: Arc<dyn Store> = Arc::new(memory.clone());
        let booking = booking(&store).await;
        let invoices = InvoiceService::new(store.clone());
        let details = InvoiceDetailService::new(store);
        let invoice = invoices.create(invoice_request(&booking)).await.unwrap();

        let line = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.cleaning_id,
                quantity: 1,
                unit_price: None,
            })
            .await
            .unwrap();

        memory.fail_invoice_updates(true);

        let err = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.inspection_id,
                quantity: 1,
                unit_price: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));

        let err = details
            .update(
                line.id,
                UpdateInvoiceDetailRequest {
                    quantity: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));

        let err = details.delete(line.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));

        memory.fail_invoice_updates(false);

        let filter = InvoiceDetailFilter {
            invoice_id: Some(invoice.id),
        };
        let (rows, meta) = details.search(filter, PageRequest::default()).await.unwrap();
        assert_eq!(meta.total, 1);
        assert_eq!(rows[0].id, line.id);
        assert_eq!(rows[0].quantity, 1);
        assert_eq!(rows[0].subtotal, dec!(150000));
        assert_eq!(invoices.get(invoice.id).await.unwrap().total_amount, dec!(150000));
    }

    #[tokio::test]
    async fn test_total_beyond_money_column_rejected() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let booking = booking(&store).await;
        let invoices = InvoiceService::new(store.clone());
        let details = InvoiceDetailService::new(store);
        let invoice = invoices.create(invoice_request(&booking)).await.unwrap();

        details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.cleaning_id,
                quantity: 1,
                unit_price: Some(MAX_AMOUNT),
            })
            .await
            .unwrap();

        // 소계는 범위 안이지만 합계가 범위를 넘음
        let err = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.inspection_id,
                quantity: 1,
                unit_price: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));

        let err = details
            .create(CreateInvoiceDetailRequest {
                invoice_id: invoice.id,
                service_id: booking.inspection_id,
                quantity: 3,
                unit_price: Some(dec!(0.005)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation { .. }));

        let filter = InvoiceDetailFilter {
            invoice_id: Some(invoice.id),
        };
        let (_, meta) = details.search(filter, PageRequest::default()).await.unwrap();
        assert_eq!(meta.total, 1);
        assert_eq!(invoices.get(invoice.id).await.unwrap().total_amount, MAX_AMOUNT);
    }
}
