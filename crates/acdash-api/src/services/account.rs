//! 계정 서비스.
//!
//! 회원가입/로그인/토큰 갱신과 관리자용 사용자 관리를 담당합니다.
//! 평문 비밀번호는 이 모듈 밖으로 나가지 않습니다.

use std::sync::Arc;

use acdash_core::{
    Account, AccountPatch, AccountSummary, NewAccount, NewCustomer, PageMeta, PageRequest, Role,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{hash_password, verify_password, TokenCodec, TokenKind, TokenPair};
use crate::error::{ApiError, ApiResult};
use crate::store::{AccountFilter, Store, StoreError};

/// 존재하지 않는 이메일로 로그인할 때 검증에 쓰는 더미 해시.
///
/// 계정 유무와 관계없이 Argon2 검증 1회를 수행해 응답 시간 차이를 줄입니다.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("acdash-timing-equalizer").ok());

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 회원가입 요청.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    /// 미지정 시 `customer`
    #[serde(default)]
    pub role: Option<Role>,
    /// `customer` 역할일 때 필수
    #[serde(default)]
    #[validate(length(min = 10, max = 15, message = "phone must be 10-15 characters"))]
    pub phone: Option<String>,
    /// `customer` 역할일 때 필수
    #[serde(default)]
    #[validate(length(min = 10, max = 500, message = "address must be 10-500 characters"))]
    pub address: Option<String>,
}

/// 로그인 요청.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// 토큰 갱신 요청.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "refresh_token is required"))]
    pub refresh_token: String,
}

/// 로그인 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: AccountSummary,
    pub tokens: TokenPair,
}

/// 토큰 갱신 응답.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefreshResponse {
    pub tokens: TokenPair,
}

/// 관리자 사용자 생성 요청.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: String,
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    pub role: Role,
}

/// 관리자 사용자 수정 요청. 지정한 필드만 변경됩니다.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 2, max = 100, message = "name must be 2-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// 사용자 상세 (관리자 조회용).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub updated_at: chrono::DateTime<Utc>,
}

impl From<Account> for UserView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            name: account.name,
            email: account.email,
            role: account.role,
            is_active: account.is_active,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ================================================================================================
// Service
// ================================================================================================

/// 계정 서비스.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn Store>,
    tokens: Arc<TokenCodec>,
}

impl AccountService {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenCodec>) -> Self {
        Self { store, tokens }
    }

    /// 회원가입.
    ///
    /// `customer` 역할이면 같은 작업 단위 안에서 고객 레코드도 생성합니다.
    /// 어느 단계든 실패하면 계정과 고객 모두 저장되지 않습니다.
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<AccountSummary> {
        let role = req.role.unwrap_or(Role::Customer);
        let email = normalize_email(&req.email);

        let customer_fields = match role {
            Role::Customer => {
                let phone = acdash_core::non_empty(req.phone);
                let address = acdash_core::non_empty(req.address);
                match (phone, address) {
                    (Some(phone), Some(address)) => Some((phone, address)),
                    _ => return Err(ApiError::MissingCustomerFields),
                }
            }
            Role::Admin | Role::Technician => None,
        };

        // Argon2 해시는 작업 단위를 열기 전에 계산
        let password_hash = hash_password(&req.password)?;
        let mut uow = self.store.begin().await?;

        if uow.find_account_by_email(&email).await?.is_some() {
            return Err(ApiError::DuplicateEmail);
        }

        let account = uow
            .insert_account(NewAccount {
                name: req.name.trim().to_string(),
                email: email.clone(),
                password_hash,
                role,
                is_active: true,
            })
            .await
            .map_err(duplicate_email)?;

        if let Some((phone, address)) = customer_fields {
            let customer = NewCustomer {
                name: account.name.clone(),
                phone,
                address,
                email: email.clone(),
            }
            .into_customer(Utc::now());
            uow.insert_customer(&customer).await?;
        }

        uow.commit().await?;

        info!(user_id = account.id, role = %account.role, "회원가입 완료");
        Ok(account.summary())
    }

    /// 로그인.
    ///
    /// 존재하지 않는 이메일과 잘못된 비밀번호는 같은 에러로 응답합니다.
    /// 비활성 여부는 비밀번호 검증에 성공한 뒤에만 알려줍니다.
    pub async fn login(&self, req: LoginRequest) -> ApiResult<LoginResponse> {
        let email = normalize_email(&req.email);

        let mut uow = self.store.begin().await?;
        let account = uow.find_account_by_email(&email).await?;
        drop(uow);

        let Some(account) = account else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(dummy, &req.password);
            }
            return Err(ApiError::InvalidCredentials);
        };

        if !verify_password(&account.password_hash, &req.password)? {
            warn!(user_id = account.id, "로그인 실패: 비밀번호 불일치");
            return Err(ApiError::InvalidCredentials);
        }

        if !account.is_active {
            return Err(ApiError::AccountDeactivated);
        }

        let tokens = self.tokens.issue(&account)?;
        info!(user_id = account.id, "로그인 성공");

        Ok(LoginResponse {
            user: account.summary(),
            tokens,
        })
    }

    /// Refresh Token으로 새 토큰 페어를 발급합니다.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<TokenPair> {
        let claims = self.tokens.validate(refresh_token)?;
        if claims.sub != TokenKind::Refresh {
            return Err(ApiError::InvalidTokenType);
        }

        let mut uow = self.store.begin().await?;
        let account = uow
            .find_account(claims.user_id)
            .await?
            .ok_or(ApiError::InvalidToken)?;
        drop(uow);

        if !account.is_active {
            return Err(ApiError::AccountDeactivated);
        }

        Ok(self.tokens.issue(&account)?)
    }

    // ==================== 관리자 사용자 관리 ====================

    pub async fn create_user(&self, req: CreateUserRequest) -> ApiResult<UserView> {
        let email = normalize_email(&req.email);
        let password_hash = hash_password(&req.password)?;

        let mut uow = self.store.begin().await?;
        if uow.find_account_by_email(&email).await?.is_some() {
            return Err(ApiError::DuplicateEmail);
        }

        let account = uow
            .insert_account(NewAccount {
                name: req.name.trim().to_string(),
                email,
                password_hash,
                role: req.role,
                is_active: true,
            })
            .await
            .map_err(duplicate_email)?;
        uow.commit().await?;

        info!(user_id = account.id, role = %account.role, "사용자 생성");
        Ok(account.into())
    }

    pub async fn get_user(&self, id: i64) -> ApiResult<UserView> {
        let mut uow = self.store.begin().await?;
        let account = uow
            .find_account(id)
            .await?
            .ok_or(ApiError::NotFound("user"))?;
        Ok(account.into())
    }

    pub async fn update_user(&self, id: i64, req: UpdateUserRequest) -> ApiResult<UserView> {
        let mut uow = self.store.begin().await?;
        let mut account = uow
            .find_account(id)
            .await?
            .ok_or(ApiError::NotFound("user"))?;

        let email = req.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if *email != account.email {
                if let Some(other) = uow.find_account_by_email(email).await? {
                    if other.id != account.id {
                        return Err(ApiError::DuplicateEmail);
                    }
                }
            }
        }

        let password_hash = req.password.as_deref().map(hash_password).transpose()?;

        AccountPatch {
            name: req.name.map(|n| n.trim().to_string()),
            email,
            password_hash,
            role: req.role,
            is_active: req.is_active,
        }
        .apply(&mut account, Utc::now());

        let account = uow.update_account(&account).await.map_err(duplicate_email)?;
        uow.commit().await?;

        info!(user_id = account.id, "사용자 수정");
        Ok(account.into())
    }

    pub async fn delete_user(&self, id: i64) -> ApiResult<()> {
        let mut uow = self.store.begin().await?;
        if !uow.delete_account(id).await? {
            return Err(ApiError::NotFound("user"));
        }
        uow.commit().await?;

        info!(user_id = id, "사용자 삭제");
        Ok(())
    }

    pub async fn list_users(
        &self,
        filter: AccountFilter,
        page: PageRequest,
    ) -> ApiResult<(Vec<UserView>, PageMeta)> {
        let mut uow = self.store.begin().await?;
        let (rows, total) = uow.list_accounts(&filter, page).await?;
        Ok((rows.into_iter().map(UserView::from).collect(), page.meta(total)))
    }
}

/// 계정 이메일 고유 제약 위반은 중복 이메일 에러로 응답합니다.
fn duplicate_email(err: StoreError) -> ApiError {
    match err {
        StoreError::UniqueViolation("email") => ApiError::DuplicateEmail,
        other => other.into(),
    }
}
