//! 사용자 역할.
//!
//! 역할은 닫힌 열거형이며, 알 수 없는 문자열은 역직렬화 시점에 거부됩니다.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// 사용자 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 관리자 - 모든 리소스 관리
    Admin,
    /// 기술자 - 일정/고객 조회 및 작업 상태 갱신
    Technician,
    /// 고객 - 본인 프로필과 서비스 목록 조회
    Customer,
}

impl Role {
    /// 모든 역할.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Technician, Role::Customer];

    /// 저장/직렬화에 쓰이는 문자열 표현.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Technician => "technician",
            Role::Customer => "customer",
        }
    }

    /// 문자열에서 역할 파싱 (대소문자 무시).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "technician" => Some(Role::Technician),
            "customer" => Some(Role::Customer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| DomainError::UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
