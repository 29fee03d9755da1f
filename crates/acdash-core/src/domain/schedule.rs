//! 방문 일정 모델.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// 일정 진행 상태.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScheduleStatus {
    #[default]
    Pending,
    #[serde(rename = "On-Progress")]
    OnProgress,
    Completed,
    Canceled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Pending => "Pending",
            ScheduleStatus::OnProgress => "On-Progress",
            ScheduleStatus::Completed => "Completed",
            ScheduleStatus::Canceled => "Canceled",
        }
    }
}

impl std::fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScheduleStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(ScheduleStatus::Pending),
            "On-Progress" => Ok(ScheduleStatus::OnProgress),
            "Completed" => Ok(ScheduleStatus::Completed),
            "Canceled" => Ok(ScheduleStatus::Canceled),
            other => Err(DomainError::UnknownScheduleStatus(other.to_string())),
        }
    }
}

impl TryFrom<String> for ScheduleStatus {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// 고객 방문 일정.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Schedule {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub technician_id: Uuid,
    pub service_id: Uuid,
    #[serde(rename = "date")]
    pub scheduled_date: NaiveDate,
    #[serde(rename = "time")]
    pub scheduled_time: NaiveTime,
    #[cfg_attr(feature = "sqlx-support", sqlx(try_from = "String"))]
    pub status: ScheduleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewSchedule {
    pub customer_id: Uuid,
    pub technician_id: Uuid,
    pub service_id: Uuid,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub status: ScheduleStatus,
}

impl NewSchedule {
    pub fn into_schedule(self, now: DateTime<Utc>) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            customer_id: self.customer_id,
            technician_id: self.technician_id,
            service_id: self.service_id,
            scheduled_date: self.scheduled_date,
            scheduled_time: self.scheduled_time,
            status: self.status,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub customer_id: Option<Uuid>,
    pub technician_id: Option<Uuid>,
    pub service_id: Option<Uuid>,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub status: Option<ScheduleStatus>,
}

impl SchedulePatch {
    pub fn apply(self, schedule: &mut Schedule, now: DateTime<Utc>) {
        if let Some(id) = self.customer_id {
            schedule.customer_id = id;
        }
        if let Some(id) = self.technician_id {
            schedule.technician_id = id;
        }
        if let Some(id) = self.service_id {
            schedule.service_id = id;
        }
        if let Some(date) = self.scheduled_date {
            schedule.scheduled_date = date;
        }
        if let Some(time) = self.scheduled_time {
            schedule.scheduled_time = time;
        }
        if let Some(status) = self.status {
            schedule.status = status;
        }
        schedule.updated_at = now;
    }
}
