//! 금액 검증.
//!
//! 금액 컬럼은 `NUMERIC(15,2)`이므로 소수점 둘째 자리까지, 최대 `9_999_999_999_999.99`까지만 허용합니다.

use rust_decimal::Decimal;

use crate::error::{DomainError, DomainResult};

/// 금액 소수 자릿수
pub const MONEY_SCALE: u32 = 2;

/// 허용되는 최대 금액 (9_999_999_999_999.99)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_319, 232_830, 0, false, MONEY_SCALE);

/// 입력 금액 검증: 음수, 소수 셋째 자리 이상, 최대값 초과를 거부합니다.
pub fn check_amount(field: &'static str, value: Decimal) -> DomainResult<()> {
    if value < Decimal::ZERO {
        return Err(DomainError::NegativeAmount(field));
    }
    if value.normalize().scale() > MONEY_SCALE {
        return Err(DomainError::TooManyDecimals(field));
    }
    if value > MAX_AMOUNT {
        return Err(DomainError::AmountTooLarge(field));
    }
    Ok(())
}

/// 계산 결과가 컬럼 범위를 넘는지 확인합니다.
pub(crate) fn within_limit(field: &'static str, value: Option<Decimal>) -> DomainResult<Decimal> {
    match value {
        Some(v) if v <= MAX_AMOUNT => Ok(v),
        _ => Err(DomainError::AmountTooLarge(field)),
    }
}
