//! 기술자 모델.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// 현장 기술자.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Technician {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    /// 전문 분야 (예: "Split AC", "Central AC")
    pub specialization: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewTechnician {
    pub name: String,
    pub phone: String,
    pub specialization: String,
}

impl NewTechnician {
    pub fn into_technician(self, now: DateTime<Utc>) -> Technician {
        Technician {
            id: Uuid::new_v4(),
            name: self.name,
            phone: self.phone,
            specialization: self.specialization,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TechnicianPatch {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
}

impl TechnicianPatch {
    pub fn apply(self, technician: &mut Technician, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            technician.name = name;
        }
        if let Some(phone) = self.phone {
            technician.phone = phone;
        }
        if let Some(specialization) = self.specialization {
            technician.specialization = specialization;
        }
        technician.updated_at = now;
    }
}
