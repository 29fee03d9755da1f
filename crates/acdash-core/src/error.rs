//! 도메인 모델 에러 타입.
//!
//! 역할/상태 문자열 파싱, 금액·수량 검증 등 모델 경계에서 발생하는 에러를 정의합니다.

use thiserror::Error;

/// 도메인 모델 에러.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// 알 수 없는 역할 문자열
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// 알 수 없는 일정 상태
    #[error("unknown schedule status: {0}")]
    UnknownScheduleStatus(String),

    /// 알 수 없는 인보이스 상태
    #[error("unknown invoice status: {0}")]
    UnknownInvoiceStatus(String),

    /// 수량은 1 이상이어야 함
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// 음수 금액
    #[error("{0} must not be negative")]
    NegativeAmount(&'static str),

    /// 소수점 둘째 자리 초과
    #[error("{0} must have at most 2 decimal places")]
    TooManyDecimals(&'static str),

    /// 최대 금액 초과
    #[error("{0} exceeds the maximum amount")]
    AmountTooLarge(&'static str),

    /// 기간(분)은 1 이상이어야 함
    #[error("duration must be at least 1 minute")]
    InvalidDuration,

    /// 만기일이 발행일보다 앞섬
    #[error("due_date must not be before invoice_date")]
    DueBeforeIssue,
}

/// 도메인 작업을 위한 Result 타입.
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DomainError::UnknownRole("root".to_string()).to_string(),
            "unknown role: root"
        );
        assert_eq!(
            DomainError::NegativeAmount("price").to_string(),
            "price must not be negative"
        );
        assert_eq!(
            DomainError::AmountTooLarge("total_amount").to_string(),
            "total_amount exceeds the maximum amount"
        );
    }
}
