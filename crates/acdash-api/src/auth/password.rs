//! 비밀번호 해싱.
//!
//! Argon2id 기반 해싱 및 검증. 호출마다 새 솔트를 생성합니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// 최소 비밀번호 길이.
pub const MIN_PASSWORD_LEN: usize = 6;

/// 비밀번호 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password hashing failed")]
    HashingFailed,
    #[error("stored password hash is malformed")]
    InvalidHashFormat,
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    TooShort,
}

/// 비밀번호를 해싱하여 PHC 문자열을 반환합니다.
///
/// ```rust,ignore
/// let hash = hash_password("rahasia123")?;
/// // "$argon2id$v=19$m=19456,t=2,p=1$..."
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::HashingFailed)
}

/// 저장된 해시와 평문 비밀번호를 비교합니다.
///
/// 불일치는 `Ok(false)`, 해시 형식 오류는 `Err`입니다.
pub fn verify_password(digest: &str, password: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(PasswordError::InvalidHashFormat),
    }
}

/// 비밀번호 최소 요건 검사.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}
