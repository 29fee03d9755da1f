//! 인증/인가 모듈.
//!
//! - [`jwt`]: 토큰 발급/검증
//! - [`password`]: Argon2 비밀번호 해싱
//! - [`middleware`]: 요청 인증 및 역할 검사

pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{extract_bearer, Claims, JwtError, TokenCodec, TokenKind, TokenPair};
pub use middleware::{
    authenticate, authorize, require_role, AdminOnly, AnyRole, AuthContext, Authorized,
    RolePolicy, Staff, ADMIN_ONLY, ANY_ROLE, STAFF,
};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordError};
