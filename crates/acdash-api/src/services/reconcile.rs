//! 인보이스 총액 재계산.
//!
//! 항목(detail) 생성/수정/삭제의 마지막 단계에서 같은 작업 단위 안에서 호출됩니다.
//! 인보이스 행을 잠근 뒤 삭제되지 않은 항목의 소계를 합산해 저장하므로,
//! 같은 인보이스에 대한 동시 변경이 서로의 총액을 덮어쓰지 않습니다.

use acdash_core::{invoice_total, Invoice};
use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::store::UnitOfWork;

/// 인보이스 총액을 항목 소계의 합으로 맞춥니다.
///
/// 멱등 연산입니다. 총액이 이미 일치하면 쓰기 없이 그대로 반환합니다.
pub async fn reconcile(uow: &mut dyn UnitOfWork, invoice_id: Uuid) -> ApiResult<Invoice> {
    let mut invoice = uow
        .lock_invoice(invoice_id)
        .await?
        .ok_or(ApiError::NotFound("invoice"))?;

    let details = uow.details_for_invoice(invoice_id).await?;
    let total = invoice_total(&details)?;

    if invoice.total_amount == total {
        return Ok(invoice);
    }

    debug!(
        invoice_id = %invoice_id,
        previous = %invoice.total_amount,
        total = %total,
        lines = details.len(),
        "인보이스 총액 갱신"
    );

    invoice.total_amount = total;
    invoice.updated_at = Utc::now();
    Ok(uow.update_invoice(&invoice).await?)
}
