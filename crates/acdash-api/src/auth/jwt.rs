//! JWT 토큰 처리.
//!
//! Access Token / Refresh Token 발급과 검증을 담당합니다.
//! 서명 키는 [`TokenCodec`] 생성 시 한 번 주입되며 이후 읽기 전용입니다.

use acdash_core::{Account, JwtConfig, Role};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// 토큰 종류 (`sub` 클레임).
///
/// 사용자 식별자가 아니라 access/refresh 구분자입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

/// JWT 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// 토큰 종류
    pub sub: TokenKind,
    /// 계정 ID
    pub user_id: i64,
    /// 계정 이메일
    pub email: String,
    /// 계정 역할
    pub role: Role,
    /// 발급 시각 (Unix timestamp)
    pub iat: i64,
    /// 만료 시각 (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// 계정 정보로 클레임을 생성합니다.
    pub fn for_account(
        account: &Account,
        kind: TokenKind,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            sub: kind,
            user_id: account.id,
            email: account.email.clone(),
            role: account.role,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
        }
    }
}

/// Access Token + Refresh Token 페어.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// 항상 "Bearer"
    pub token_type: String,
    /// Access Token 만료까지 남은 시간 (초)
    pub expires_in: i64,
}

/// JWT 에러.
///
/// 검증 실패는 원인(서명 불일치, 만료, 형식 오류)과 무관하게
/// 하나의 [`JwtError::InvalidToken`]으로 합쳐집니다.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("failed to sign token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error("invalid or expired token")]
    InvalidToken,
    #[error("authorization header is required")]
    MissingAuthHeader,
    #[error("invalid authorization header format")]
    MalformedAuthHeader,
}

/// 토큰 발급/검증기.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// 설정에서 서명 키와 만료 시간을 읽어 생성합니다.
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        }
    }

    /// 현재 시각 기준으로 토큰 페어를 발급합니다.
    pub fn issue(&self, account: &Account) -> Result<TokenPair, JwtError> {
        self.issue_at(account, Utc::now())
    }

    /// 지정한 시각 기준으로 토큰 페어를 발급합니다.
    pub fn issue_at(&self, account: &Account, now: DateTime<Utc>) -> Result<TokenPair, JwtError> {
        let access = Claims::for_account(account, TokenKind::Access, now, self.access_ttl);
        let refresh = Claims::for_account(account, TokenKind::Refresh, now, self.refresh_ttl);

        Ok(TokenPair {
            access_token: self.encode(&access)?,
            refresh_token: self.encode(&refresh)?,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    /// 클레임을 HS256으로 서명합니다.
    pub fn encode(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(JwtError::Encoding)
    }

    /// 서명과 만료를 검증하고 클레임을 반환합니다.
    ///
    /// access/refresh 구분은 호출자가 `claims.sub`로 확인해야 합니다.
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "토큰 검증 실패");
                JwtError::InvalidToken
            })
    }
}

/// `Authorization` 헤더 값에서 Bearer 토큰을 추출합니다.
pub fn extract_bearer(header: &str) -> Result<&str, JwtError> {
    if header.trim().is_empty() {
        return Err(JwtError::MissingAuthHeader);
    }

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(JwtError::MalformedAuthHeader)?
        .trim();

    if token.is_empty() {
        return Err(JwtError::MalformedAuthHeader);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use acdash_core::NewAccount;

    fn codec() -> TokenCodec {
        TokenCodec::new(&JwtConfig::new("unit-test-secret"))
    }

    fn account(role: Role) -> Account {
        NewAccount {
            name: "Siti".to_string(),
            email: "siti@example.com".to_string(),
            password_hash: String::new(),
            role,
            is_active: true,
        }
        .into_account(42, Utc::now())
    }

    #[test]
    fn test_issue_and_validate_access_token() {
        let codec = codec();
        for role in Role::ALL {
            let pair = codec.issue(&account(role)).unwrap();
            let claims = codec.validate(&pair.access_token).unwrap();

            assert_eq!(claims.sub, TokenKind::Access);
            assert_eq!(claims.role, role);
            assert_eq!(claims.user_id, 42);
            assert_eq!(claims.email, "siti@example.com");
        }
    }

    #[test]
    fn test_refresh_token_outlives_access_token() {
        let codec = codec();
        let pair = codec.issue(&account(Role::Customer)).unwrap();
        let access = codec.validate(&pair.access_token).unwrap();
        let refresh = codec.validate(&pair.refresh_token).unwrap();

        assert_eq!(refresh.sub, TokenKind::Refresh);
        assert!(refresh.exp > access.exp);
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_in, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let issued = Utc::now() - Duration::hours(2);
        let pair = codec.issue_at(&account(Role::Admin), issued).unwrap();

        let err = codec.validate(&pair.access_token).unwrap_err();
        assert!(matches!(err, JwtError::InvalidToken));
        assert_eq!(err.to_string(), "invalid or expired token");
    }

    #[test]
    fn test_wrong_secret_and_garbage_share_one_error() {
        let pair = codec().issue(&account(Role::Admin)).unwrap();
        let other = TokenCodec::new(&JwtConfig::new("another-secret"));

        let wrong_key = other.validate(&pair.access_token).unwrap_err();
        let garbage = other.validate("not.a.jwt").unwrap_err();
        assert_eq!(wrong_key.to_string(), garbage.to_string());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec();
        let token = codec.issue(&account(Role::Customer)).unwrap().access_token;
        let forged = codec
            .issue(&account(Role::Admin))
            .unwrap()
            .access_token;

        // 다른 토큰의 payload와 원래 서명 조합
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert!(codec.validate(&spliced).is_err());
    }

    #[test]
    fn test_unknown_role_claim_rejected() {
        let now = Utc::now().timestamp();
        let payload = serde_json::json!({
            "sub": "access",
            "user_id": 1,
            "email": "x@example.com",
            "role": "superuser",
            "iat": now,
            "exp": now + 600,
        });
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        assert!(matches!(codec().validate(&token), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi").unwrap(), "abc.def.ghi");
        assert!(matches!(extract_bearer(""), Err(JwtError::MissingAuthHeader)));
        assert!(matches!(extract_bearer("Bearer"), Err(JwtError::MalformedAuthHeader)));
        assert!(matches!(extract_bearer("Bearer   "), Err(JwtError::MalformedAuthHeader)));
        assert!(matches!(extract_bearer("Basic dXNlcg=="), Err(JwtError::MalformedAuthHeader)));
        assert!(matches!(extract_bearer("bearer abc"), Err(JwtError::MalformedAuthHeader)));
    }
}
