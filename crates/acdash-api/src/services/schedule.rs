//! 방문 일정 서비스.
//!
//! 생성/수정 시 참조하는 고객, 기술자, 서비스가 살아있는지 확인합니다.

use std::sync::Arc;

use acdash_core::{
    NewSchedule, PageMeta, PageRequest, Schedule, SchedulePatch, ScheduleStatus,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::store::{ScheduleFilter, Store, UnitOfWork};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    pub customer_id: Uuid,
    pub technician_id: Uuid,
    pub service_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// 미지정 시 `Pending`
    #[serde(default)]
    pub status: Option<ScheduleStatus>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateScheduleRequest {
    pub customer_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub status: Option<ScheduleStatus>,
}

async fn ensure_references(
    uow: &mut dyn UnitOfWork,
    customer_id: Option<Uuid>,
    technician_id: Option<Uuid>,
    service_id: Option<Uuid>,
) -> ApiResult<()> {
    if let Some(id) = customer_id {
        uow.find_customer(id)
            .await?
            .ok_or(ApiError::NotFound("customer"))?;
    }
    if let Some(id) = technician_id {
        uow.find_technician(id)
            .await?
            .ok_or(ApiError::NotFound("technician"))?;
    }
    if let Some(id) = service_id {
        uow.find_service(id)
            .await?
            .ok_or(ApiError::NotFound("service"))?;
    }
    Ok(())
}

/// 일정 서비스.
#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn Store>,
}

impl ScheduleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, req: CreateScheduleRequest) -> ApiResult<Schedule> {
        let mut uow = self.store.begin().await?;
        ensure_references(
            uow.as_mut(),
            Some(req.customer_id),
            Some(req.technician_id),
            Some(req.service_id),
        )
        .await?;

        let schedule = NewSchedule {
            customer_id: req.customer_id,
            technician_id: req.technician_id,
            service_id: req.service_id,
            scheduled_date: req.date,
            scheduled_time: req.time,
            status: req.status.unwrap_or_default(),
        }
        .into_schedule(Utc::now());

        let schedule = uow.insert_schedule(&schedule).await?;
        uow.commit().await?;

        info!(
            schedule_id = %schedule.id,
            date = %schedule.scheduled_date,
            technician_id = %schedule.technician_id,
            "일정 생성"
        );
        Ok(schedule)
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Schedule> {
        let mut uow = self.store.begin().await?;
        uow.find_schedule(id)
            .await?
            .ok_or(ApiError::NotFound("schedule"))
    }

    pub async fn update(&self, id: Uuid, req: UpdateScheduleRequest) -> ApiResult<Schedule> {
        let mut uow = self.store.begin().await?;
        let mut schedule = uow
            .find_schedule(id)
            .await?
            .ok_or(ApiError::NotFound("schedule"))?;

        ensure_references(uow.as_mut(), req.customer_id, req.technician_id, req.service_id)
            .await?;

        SchedulePatch {
            customer_id: req.customer_id,
            technician_id: req.technician_id,
            service_id: req.service_id,
            scheduled_date: req.date,
            scheduled_time: req.time,
            status: req.status,
        }
        .apply(&mut schedule, Utc::now());

        let schedule = uow.update_schedule(&schedule).await?;
        uow.commit().await?;

        info!(schedule_id = %schedule.id, status = %schedule.status, "일정 수정");
        Ok(schedule)
    }

    pub async fn delete(&self, id: Uuid) -> ApiResult<()> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_schedule(id).await? {
            return Err(ApiError::NotFound("schedule"));
        }
        uow.commit().await?;

        info!(schedule_id = %id, "일정 삭제");
        Ok(())
    }

    pub async fn search(
        &self,
        filter: ScheduleFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<Schedule>, PageMeta)> {
        let mut uow = self.store.begin().await?;
        let (rows, total) = uow.list_schedules(&filter, page).await?;
        Ok((rows, page.meta(total)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog::{CatalogService, CreateServiceRequest};
    use crate::services::customer::{CreateCustomerRequest, CustomerService};
    use crate::services::technician::{CreateTechnicianRequest, TechnicianService};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    struct Fixture {
        schedules: ScheduleService,
        customer_id: Uuid,
        technician_id: Uuid,
        service_id: Uuid,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let customer = CustomerService::new(store.clone())
            .create(CreateCustomerRequest {
                name: "Budi Santoso".into(),
                phone: "081234567890".into(),
                address: "Jl. Merdeka No. 10, Bandung".into(),
                email: "budi@example.com".into(),
            })
            .await
            .unwrap();
        let technician = TechnicianService::new(store.clone())
            .create(CreateTechnicianRequest {
                name: "Agus".into(),
                phone: "081298765432".into(),
                specialization: "Split AC".into(),
            })
            .await
            .unwrap();
        let service = CatalogService::new(store.clone())
            .create(CreateServiceRequest {
                name: "Cuci AC".into(),
                price: dec!(150000),
                duration: 60,
            })
            .await
            .unwrap();

        Fixture {
            schedules: ScheduleService::new(store),
            customer_id: customer.id,
            technician_id: technician.id,
            service_id: service.id,
        }
    }

    fn at(fx: &Fixture, day: u32, hour: u32) -> CreateScheduleRequest {
        CreateScheduleRequest {
            customer_id: fx.customer_id,
            technician_id: fx.technician_id,
            service_id: fx.service_id,
            date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            status: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_pending() {
        let fx = fixture().await;
        let schedule = fx.schedules.create(at(&fx, 10, 9)).await.unwrap();
        assert_eq!(schedule.status, ScheduleStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_technician_is_not_found() {
        let fx = fixture().await;
        let mut req = at(&fx, 10, 9);
        req.technician_id = Uuid::new_v4();

        let err = fx.schedules.create(req).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound("technician")));
    }

    #[tokio::test]
    async fn test_update_status() {
        let fx = fixture().await;
        let schedule = fx.schedules.create(at(&fx, 10, 9)).await.unwrap();

        let updated = fx
            .schedules
            .update(
                schedule.id,
                UpdateScheduleRequest {
                    status: Some(ScheduleStatus::OnProgress),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, ScheduleStatus::OnProgress);
        assert_eq!(updated.scheduled_date, schedule.scheduled_date);
    }

    #[tokio::test]
    async fn test_search_orders_by_date_then_time_desc() {
        let fx = fixture().await;
        fx.schedules.create(at(&fx, 10, 9)).await.unwrap();
        fx.schedules.create(at(&fx, 12, 8)).await.unwrap();
        fx.schedules.create(at(&fx, 12, 14)).await.unwrap();
        fx.schedules.create(at(&fx, 20, 10)).await.unwrap();

        let (rows, meta) = fx
            .schedules
            .search(
                ScheduleFilter {
                    date_from: NaiveDate::from_ymd_opt(2025, 3, 10),
                    date_to: NaiveDate::from_ymd_opt(2025, 3, 12),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .await
            .unwrap();

        assert_eq!(meta.total, 3);
        let order: Vec<_> = rows
            .iter()
            .map(|s| (s.scheduled_date.to_string(), s.scheduled_time.to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2025-03-12".to_string(), "14:00:00".to_string()),
                ("2025-03-12".to_string(), "08:00:00".to_string()),
                ("2025-03-10".to_string(), "09:00:00".to_string()),
            ]
        );
    }
}
