//! 고객 모델.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 서비스 고객.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// 새 고객 입력.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
}

impl NewCustomer {
    pub fn into_customer(self, now: DateTime<Utc>) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            name: self.name,
            phone: self.phone,
            address: self.address,
            email: self.email,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// 고객 부분 수정.
#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
}

impl CustomerPatch {
    pub fn apply(self, customer: &mut Customer, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            customer.name = name;
        }
        if let Some(phone) = self.phone {
            customer.phone = phone;
        }
        if let Some(address) = self.address {
            customer.address = address;
        }
        if let Some(email) = self.email {
            customer.email = email;
        }
        customer.updated_at = now;
    }
}
