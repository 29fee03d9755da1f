//! 기술자 서비스.

use std::sync::Arc;

use acdash_core::{NewTechnician, PageMeta, PageRequest, Technician, TechnicianPatch};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::store::{Store, TechnicianFilter};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTechnicianRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: String,
    #[validate(length(min = 10, max = 15, message = "phone must be 10-15 characters"))]
    pub phone: String,
    #[validate(length(min = 2, max = 100, message = "specialization must be 2-100 characters"))]
    pub specialization: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTechnicianRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 10, max = 15, message = "phone must be 10-15 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 2, max = 100, message = "specialization must be 2-100 characters"))]
    pub specialization: Option<String>,
}

/// 기술자 서비스.
#[derive(Clone)]
pub struct TechnicianService {
    store: Arc<dyn Store>,
}

impl TechnicianService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateTechnicianRequest) -> ApiResult<Technician> {
        let technician = NewTechnician {
            name: req.name.trim().to_string(),
            phone: req.phone.trim().to_string(),
            specialization: req.specialization.trim().to_string(),
        }
        .into_technician(Utc::now());

        let mut uow = self.store.begin().await?;
        let technician = uow.insert_technician(&technician).await?;
        uow.commit().await?;

        info!(technician_id = %technician.id, "기술자 생성");
        Ok(technician)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Technician> {
        let mut uow = self.store.begin().await?;
        uow.find_technician(id)
            .await?
            .ok_or(ApiError::NotFound("technician"))
    }

    pub async fn update(&self, id: Uuid, req: UpdateTechnicianRequest) -> ApiResult<Technician> {
        let mut uow = self.store.begin().await?;
        let mut technician = uow
            .find_technician(id)
            .await?
            .ok_or(ApiError::NotFound("technician"))?;

        TechnicianPatch {
            name: req.name.map(|v| v.trim().to_string()),
            phone: req.phone.map(|v| v.trim().to_string()),
            specialization: req.specialization.map(|v| v.trim().to_string()),
        }
        .apply(&mut technician, Utc::now());

        let technician = uow.update_technician(&technician).await?;
        uow.commit().await?;
        Ok(technician)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_technician(id).await? {
            return Err(ApiError::NotFound("technician"));
        }
        uow.commit().await?;

        info!(technician_id = %id, "기술자 삭제");
        Ok(())
    }

    pub async fn search(
        &self,
        filter: TechnicianFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<Technician>, PageMeta)> {
        let mut uow = self.store.begin().await?;
        let (rows, total) = uow.list_technicians(&filter, page).await?;
        Ok((rows, page.meta(total)))
    }
}
