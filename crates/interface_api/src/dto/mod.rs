//! Request and response data transfer objects

pub mod billing;
pub mod utility;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Validator hook for amounts that must be strictly positive
pub(crate) fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("positive_amount"))
    }
}

/// Validator hook for amounts that must not be negative
pub(crate) fn non_negative_amount(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() {
        Err(ValidationError::new("non_negative_amount"))
    } else {
        Ok(())
    }
}
