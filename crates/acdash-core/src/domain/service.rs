//! 서비스 카탈로그 모델.
//!
//! 세척, 냉매 충전, 설치 등 판매 가능한 작업 항목과 기본 단가를 정의합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::money::check_amount;
use crate::error::{DomainError, DomainResult};

/// 카탈로그 서비스 항목.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct ServiceOffering {
    pub id: Uuid,
    pub name: String,
    /// 기본 단가
    pub price: Decimal,
    /// 소요 시간 (분)
    #[serde(rename = "duration")]
    pub duration_minutes: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 가격과 소요 시간 검증.
fn check_terms(price: Decimal, duration_minutes: i32) -> DomainResult<()> {
    check_amount("price", price)?;
    if duration_minutes < 1 {
        return Err(DomainError::InvalidDuration);
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewServiceOffering {
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: i32,
}

impl NewServiceOffering {
    /// 검증 후 레코드를 만듭니다.
    pub fn into_offering(self, now: DateTime<Utc>) -> DomainResult<ServiceOffering> {
        check_terms(self.price, self.duration_minutes)?;
        Ok(ServiceOffering {
            id: Uuid::new_v4(),
            name: self.name,
            price: self.price,
            duration_minutes: self.duration_minutes,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceOfferingPatch {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub duration_minutes: Option<i32>,
}

impl ServiceOfferingPatch {
    pub fn apply(self, offering: &mut ServiceOffering, now: DateTime<Utc>) -> DomainResult<()> {
        let price = self.price.unwrap_or(offering.price);
        let duration = self.duration_minutes.unwrap_or(offering.duration_minutes);
        check_terms(price, duration)?;

        if let Some(name) = self.name {
            offering.name = name;
        }
        offering.price = price;
        offering.duration_minutes = duration;
        offering.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_negative_price_rejected() {
        let result = NewServiceOffering {
            name: "Cuci AC".to_string(),
            price: dec!(-1),
            duration_minutes: 60,
        }
        .into_offering(Utc::now());
        assert_eq!(result.unwrap_err(), DomainError::NegativeAmount("price"));
    }

    #[test]
    fn test_price_must_fit_money_column() {
        let result = NewServiceOffering {
            name: "Cuci AC".to_string(),
            price: dec!(150000.005),
            duration_minutes: 60,
        }
        .into_offering(Utc::now());
        assert_eq!(result.unwrap_err(), DomainError::TooManyDecimals("price"));

        let result = NewServiceOffering {
            name: "Cuci AC".to_string(),
            price: Decimal::MAX,
            duration_minutes: 60,
        }
        .into_offering(Utc::now());
        assert_eq!(result.unwrap_err(), DomainError::AmountTooLarge("price"));
    }

    #[test]
    fn test_zero_duration_rejected() {
        let result = NewServiceOffering {
            name: "Cek".to_string(),
            price: dec!(0),
            duration_minutes: 0,
        }
        .into_offering(Utc::now());
        assert_eq!(result.unwrap_err(), DomainError::InvalidDuration);
    }

    #[test]
    fn test_patch_keeps_offering_on_error() {
        let mut offering = NewServiceOffering {
            name: "Isi Freon".to_string(),
            price: dec!(200000),
            duration_minutes: 45,
        }
        .into_offering(Utc::now())
        .unwrap();

        let err = ServiceOfferingPatch {
            name: Some("Renamed".to_string()),
            price: Some(dec!(-5)),
            ..Default::default()
        }
        .apply(&mut offering, Utc::now());

        assert!(err.is_err());
        assert_eq!(offering.name, "Isi Freon");
        assert_eq!(offering.price, dec!(200000));
    }

    #[test]
    fn test_serializes_duration_field() {
        let offering = NewServiceOffering {
            name: "Service Rutin AC".to_string(),
            price: dec!(100000),
            duration_minutes: 30,
        }
        .into_offering(Utc::now())
        .unwrap();
        let json = serde_json::to_value(&offering).unwrap();
        assert_eq!(json["duration"], 30);
    }
}
