//! 계정(로그인 주체) 모델.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// 로그인 가능한 계정.
///
/// 물리 삭제되지 않으며 `deleted_at`으로 소프트 삭제됩니다.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx-support", derive(sqlx::FromRow))]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2 PHC 해시. 응답에 절대 포함되지 않음
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[cfg_attr(feature = "sqlx-support", sqlx(try_from = "String"))]
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// 소프트 삭제 여부.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// 외부에 노출 가능한 요약.
    pub fn summary(&self) -> AccountSummary {
        AccountSummary::from(self)
    }
}

/// 새 계정 입력 (이미 해시된 비밀번호).
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
}

impl NewAccount {
    /// 주어진 ID와 시각으로 계정 레코드를 만듭니다.
    pub fn into_account(self, id: i64, now: DateTime<Utc>) -> Account {
        Account {
            id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

/// 계정 부분 수정.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl AccountPatch {
    /// 변경 사항을 계정에 적용합니다.
    pub fn apply(self, account: &mut Account, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            account.name = name;
        }
        if let Some(email) = self.email {
            account.email = email;
        }
        if let Some(hash) = self.password_hash {
            account.password_hash = hash;
        }
        if let Some(role) = self.role {
            account.role = role;
        }
        if let Some(active) = self.is_active {
            account.is_active = active;
        }
        account.updated_at = now;
    }
}

/// 계정 요약 (id, 이름, 이메일, 역할).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa-support", derive(utoipa::ToSchema))]
pub struct AccountSummary {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Account {
        NewAccount {
            name: "Budi".to_string(),
            email: "budi@example.com".to_string(),
            password_hash: "$argon2id$fake".to_string(),
            role: Role::Technician,
            is_active: true,
        }
        .into_account(7, Utc::now())
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("deleted_at").is_none());
        assert_eq!(json["role"], "technician");
    }

    #[test]
    fn test_patch_applies_only_given_fields() {
        let mut account = sample();
        AccountPatch {
            role: Some(Role::Admin),
            is_active: Some(false),
            ..Default::default()
        }
        .apply(&mut account, Utc::now());

        assert_eq!(account.name, "Budi");
        assert_eq!(account.role, Role::Admin);
        assert!(!account.is_active);
    }
}
