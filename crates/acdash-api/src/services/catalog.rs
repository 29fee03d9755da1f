//! 서비스 카탈로그 (작업 종류와 기본 단가).

use std::sync::Arc;

use acdash_core::{
    NewServiceOffering, PageMeta, PageRequest, ServiceOffering, ServiceOfferingPatch,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::store::{ServiceFilter, Store};

/// 서비스 생성 요청. 가격/소요시간 범위는 도메인 모델에서 검증합니다.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: String,
    pub price: Decimal,
    /// 소요 시간 (분)
    pub duration: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub duration: Option<i32>,
}

/// 서비스 카탈로그.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateServiceRequest) -> ApiResult<ServiceOffering> {
        let offering = NewServiceOffering {
            name: req.name.trim().to_string(),
            price: req.price,
            duration_minutes: req.duration,
        }
        .into_offering(Utc::now())?;

        let mut uow = self.store.begin().await?;
        let offering = uow.insert_service(&offering).await?;
        uow.commit().await?;

        info!(service_id = %offering.id, name = %offering.name, "서비스 생성");
        Ok(offering)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<ServiceOffering> {
        let mut uow = self.store.begin().await?;
        uow.find_service(id)
            .await?
            .ok_or(ApiError::NotFound("service"))
    }

    pub async fn update(&self, id: Uuid, req: UpdateServiceRequest) -> ApiResult<ServiceOffering> {
        let mut uow = self.store.begin().await?;
        let mut offering = uow
            .find_service(id)
            .await?
            .ok_or(ApiError::NotFound("service"))?;

        ServiceOfferingPatch {
            name: req.name.map(|v| v.trim().to_string()),
            price: req.price,
            duration_minutes: req.duration,
        }
        .apply(&mut offering, Utc::now())?;

        let offering = uow.update_service(&offering).await?;
        uow.commit().await?;
        Ok(offering)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_service(id).await? {
            return Err(ApiError::NotFound("service"));
        }
        uow.commit().await?;

        info!(service_id = %id, "서비스 삭제");
        Ok(())
    }

    pub async fn search(
        &self,
        filter: ServiceFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<ServiceOffering>, PageMeta)> {
        let mut uow = self.store.begin().await?;
        let (rows, total) = uow.list_services(&filter, page).await?;
        Ok((rows, page.meta(total)))
    }
}
