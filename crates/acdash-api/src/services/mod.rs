//! 서비스 계층.
//!
//! 핸들러는 요청 검증 후 서비스 메서드를 호출하고, 서비스는
//! [`Store`](crate::store::Store)에서 작업 단위를 열어 쓰기를 마친 뒤 커밋합니다.

pub mod account;
pub mod catalog;
pub mod customer;
pub mod invoice;
pub mod invoice_detail;
pub mod reconcile;
pub mod schedule;
pub mod technician;

pub use account::{
    AccountService, CreateUserRequest, LoginRequest, LoginResponse, RefreshRequest,
    RefreshResponse, RegisterRequest, UpdateUserRequest, UserView,
};
pub use catalog::{CatalogService, CreateServiceRequest, UpdateServiceRequest};
pub use customer::{CreateCustomerRequest, CustomerService, UpdateCustomerRequest};
pub use invoice::{CreateInvoiceRequest, InvoiceService, UpdateInvoiceRequest};
pub use invoice_detail::{
    CreateInvoiceDetailRequest, InvoiceDetailService, UpdateInvoiceDetailRequest,
};
pub use reconcile::reconcile;
pub use schedule::{CreateScheduleRequest, ScheduleService, UpdateScheduleRequest};
pub use technician::{CreateTechnicianRequest, TechnicianService, UpdateTechnicianRequest};

#[cfg(test)]
pub(crate) mod testing {
    //! 서비스 테스트 공용 픽스처.

    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveTime};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;
    use crate::store::Store;

    /// 고객, 기술자, 서비스 2종, 일정 1건이 준비된 상태.
    pub struct Booking {
        pub customer_id: Uuid,
        pub schedule_id: Uuid,
        /// 150000
        pub cleaning_id: Uuid,
        /// 50000
        pub inspection_id: Uuid,
    }

    pub async fn booking(store: &Arc<dyn Store>) -> Booking {
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

        let catalog = CatalogService::new(store.clone());
        let cleaning = catalog
            .create(CreateServiceRequest {
                name: "Cuci AC".into(),
                price: dec!(150000),
                duration: 60,
            })
            .await
            .unwrap();
        let inspection = catalog
            .create(CreateServiceRequest {
                name: "Cek Kebocoran".into(),
                price: dec!(50000),
                duration: 30,
            })
            .await
            .unwrap();

        let schedule = ScheduleService::new(store.clone())
            .create(CreateScheduleRequest {
                customer_id: customer.id,
                technician_id: technician.id,
                service_id: cleaning.id,
                date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
                time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                status: None,
            })
            .await
            .unwrap();

        Booking {
            customer_id: customer.id,
            schedule_id: schedule.id,
            cleaning_id: cleaning.id,
            inspection_id: inspection.id,
        }
    }

    pub fn invoice_request(booking: &Booking) -> CreateInvoiceRequest {
        CreateInvoiceRequest {
            schedule_id: booking.schedule_id,
            customer_id: booking.customer_id,
            invoice_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2025, 1, 24).unwrap(),
            status: None,
        }
    }
}
