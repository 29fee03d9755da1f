//! 초기 데이터 생성.
//!
//! 기본 관리자 계정과 서비스 카탈로그를 만듭니다. 이미 있는 항목은 건너뛰므로
//! 서버를 여러 번 시작해도 안전합니다.

use acdash_core::{NewAccount, NewServiceOffering, Role, SeedConfig};
use chrono::Utc;
use rust_decimal::Decimal;
use tracing::info;

use crate::auth::hash_password;
use crate::error::ApiResult;
use crate::store::Store;

/// 기본 서비스 카탈로그 (이름, 가격, 소요 시간(분)).
pub const DEFAULT_SERVICES: [(&str, i64, i32); 4] = [
    ("Cuci AC", 150_000, 60),
    ("Isi Freon", 200_000, 45),
    ("Bongkar Pasang AC", 500_000, 180),
    ("Service Rutin AC", 100_000, 30),
];

/// seed 실행 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub admin_created: bool,
    pub services_created: usize,
}

/// 관리자 계정과 기본 서비스를 생성합니다.
pub async fn run(store: &dyn Store, config: &SeedConfig) -> ApiResult<SeedReport> {
    let mut report = SeedReport::default();
    let mut uow = store.begin().await?;

    let admin_email = config.admin_email.trim().to_lowercase();
    if uow.find_account_by_email(&admin_email).await?.is_none() {
        let account = uow
            .insert_account(NewAccount {
                name: config.admin_name.clone(),
                email: admin_email,
                password_hash: hash_password(&config.admin_password)?,
                role: Role::Admin,
                is_active: true,
            })
            .await?;
        info!(user_id = account.id, email = %account.email, "초기 관리자 계정 생성");
        report.admin_created = true;
    }

    let now = Utc::now();
    for (name, price, duration) in DEFAULT_SERVICES {
        if uow.find_service_by_name(name).await?.is_some() {
            continue;
        }
        let offering = NewServiceOffering {
            name: name.to_string(),
            price: Decimal::from(price),
            duration_minutes: duration,
        }
        .into_offering(now)?;
        uow.insert_service(&offering).await?;
        report.services_created += 1;
    }

    uow.commit().await?;
    info!(
        admin_created = report.admin_created,
        services_created = report.services_created,
        "초기 데이터 준비 완료"
    );
    Ok(report)
}
