//! Value objects: equality by value, not identity.
//!
//! Quantities, rates and line totals on proposals are value objects. Two
//! amounts with the same value are interchangeable; nothing refers to "this
//! particular 10.0".

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, construct a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A finite, non-negative decimal quantity (item quantity, unit price, rate).
///
/// Construction is the only validation point: once an `Amount` exists it is
/// known to be `>= 0` and finite. Arithmetic that can leave that range goes
/// back through [`Amount::new`].
#[derive(Debug, Copy, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    /// Validate a raw number. `field` names the input in the error message.
    pub fn new(value: f64, field: &str) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation(format!("{field} must be a finite number")));
        }
        if value < 0.0 {
            return Err(DomainError::validation(format!(
                "{field} must be >= 0 (got {value})"
            )));
        }
        // Normalise -0.0 so equality and display behave.
        Ok(Self(if value == 0.0 { 0.0 } else { value }))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Line total: `quantity × unit price`. Fails if the product overflows.
    pub fn times(self, other: Amount) -> DomainResult<Amount> {
        Amount::new(self.0 * other.0, "total")
    }
}

impl ValueObject for Amount {}

impl TryFrom<f64> for Amount {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::new(value, "amount")
    }
}

impl From<Amount> for f64 {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl core::fmt::Display for Amount {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_values_are_rejected_with_field_name() {
        let err = Amount::new(-5.0, "unit_price").unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("unit_price must be >= 0 (got -5)".to_string())
        );
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(Amount::new(f64::NAN, "quantity").is_err());
        assert!(Amount::new(f64::INFINITY, "quantity").is_err());
    }

    #[test]
    fn zero_is_allowed_and_normalised() {
        let a = Amount::new(-0.0, "quantity").unwrap();
        assert_eq!(a, Amount::ZERO);
        assert!(a.value().is_sign_positive());
    }

    #[test]
    fn times_multiplies() {
        let qty = Amount::new(3.0, "quantity").unwrap();
        let price = Amount::new(10.0, "unit_price").unwrap();
        assert_eq!(qty.times(price).unwrap().value(), 30.0);
    }

    #[test]
    fn times_rejects_overflow() {
        let huge = Amount::new(1e200, "quantity").unwrap();
        let err = huge.times(huge).unwrap_err();
        assert_eq!(
            err,
            DomainError::Validation("total must be a finite number".to_string())
        );
    }

    #[test]
    fn deserialize_rejects_negative() {
        let ok: Amount = serde_json::from_str("2.5").unwrap();
        assert_eq!(ok.value(), 2.5);
        assert!(serde_json::from_str::<Amount>("-1").is_err());
    }
}
