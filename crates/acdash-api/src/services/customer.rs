//! 고객 서비스.

use std::sync::Arc;

use acdash_core::{Customer, CustomerPatch, NewCustomer, PageMeta, PageRequest};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::store::{CustomerFilter, Store};

/// 고객 생성 요청.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: String,
    #[validate(length(min = 10, max = 15, message = "phone must be 10-15 characters"))]
    pub phone: String,
    #[validate(length(min = 10, max = 500, message = "address must be 10-500 characters"))]
    pub address: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
}

/// 고객 수정 요청.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 10, max = 15, message = "phone must be 10-15 characters"))]
    pub phone: Option<String>,
    #[validate(length(min = 10, max = 500, message = "address must be 10-500 characters"))]
    pub address: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
}

/// 고객 서비스.
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn Store>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateCustomerRequest) -> ApiResult<Customer> {
        let customer = NewCustomer {
            name: req.name.trim().to_string(),
            phone: req.phone.trim().to_string(),
            address: req.address.trim().to_string(),
            email: req.email.trim().to_lowercase(),
        }
        .into_customer(Utc::now());

        let mut uow = self.store.begin().await?;
        let customer = uow.insert_customer(&customer).await?;
        uow.commit().await?;

        info!(customer_id = %customer.id, "고객 생성");
        Ok(customer)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Customer> {
        let mut uow = self.store.begin().await?;
        uow.find_customer(id)
            .await?
            .ok_or(ApiError::NotFound("customer"))
    }

    pub async fn update(&self, id: Uuid, req: UpdateCustomerRequest) -> ApiResult<Customer> {
        let mut uow = self.store.begin().await?;
        let mut customer = uow
            .find_customer(id)
            .await?
            .ok_or(ApiError::NotFound("customer"))?;

        CustomerPatch {
            name: req.name.map(|v| v.trim().to_string()),
            phone: req.phone.map(|v| v.trim().to_string()),
            address: req.address.map(|v| v.trim().to_string()),
            email: req.email.map(|v| v.trim().to_lowercase()),
        }
        .apply(&mut customer, Utc::now());

        let customer = uow.update_customer(&customer).await?;
        uow.commit().await?;
        Ok(customer)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_customer(id).await? {
            return Err(ApiError::NotFound("customer"));
        }
        uow.commit().await?;

        info!(customer_id = %id, "고객 삭제");
        Ok(())
    }

    /// 필터 없이 호출하면 전체 목록입니다.
    pub async fn search(
        &self,
        filter: CustomerFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<Customer>, PageMeta)> {
        let mut uow = self.store.begin().await?;
        let (rows, total) = uow.list_customers(&filter, page).await?;
        Ok((rows, page.meta(total)))
    }
}
