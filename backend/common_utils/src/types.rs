use common_enums::enums;
use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal,
};

use crate::errors::ParsingError;

/// Integer amount in the smallest denomination of a currency (e.g. øre,
/// cents). All gateway amounts move through this type.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    Hash,
    PartialEq,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
)]
pub struct MinorUnit(i64);

impl MinorUnit {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn get_amount_as_i64(self) -> i64 {
        self.0
    }

    pub fn is_greater_than(&self, value: i64) -> bool {
        self.0 > value
    }

    /// Convert to the major denomination by the ISO 4217 exponent of the
    /// given currency.
    pub fn to_major_unit_as_f64(
        self,
        currency: enums::Currency,
    ) -> Result<FloatMajorUnit, error_stack::Report<ParsingError>> {
        let amount_decimal =
            Decimal::from_i64(self.0).ok_or(ParsingError::I64ToDecimalConversionFailure)?;
        let exponent = u32::from(currency.number_of_digits_after_decimal_point());
        let amount = amount_decimal / Decimal::from(10_i64.pow(exponent));
        let amount_f64 = amount
            .to_f64()
            .ok_or(ParsingError::FloatToDecimalConversionFailure)?;
        Ok(FloatMajorUnit::new(amount_f64))
    }
}

impl std::fmt::Display for MinorUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Amount in the major denomination of a currency, as handed back to the
/// host (e.g. `amount_authorized`).
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FloatMajorUnit(f64);

impl FloatMajorUnit {
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn get_amount_as_f64(self) -> f64 {
        self.0
    }
}

/// A raw gateway HTTP response as handed to the response transformers.
#[derive(Clone, Debug)]
pub struct Response {
    pub headers: Option<http::HeaderMap>,
    pub response: bytes::Bytes,
    pub status_code: u16,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn minor_unit_to_major_two_decimals() {
        let amount = MinorUnit::new(12050);
        let major = amount.to_major_unit_as_f64(enums::Currency::DKK).unwrap();
        assert_eq!(major.get_amount_as_f64(), 120.50);
    }

    #[test]
    fn minor_unit_to_major_zero_decimals() {
        let amount = MinorUnit::new(1200);
        let major = amount.to_major_unit_as_f64(enums::Currency::JPY).unwrap();
        assert_eq!(major.get_amount_as_f64(), 1200.0);
    }

    #[test]
    fn minor_unit_to_major_three_decimals() {
        let amount = MinorUnit::new(12345);
        let major = amount.to_major_unit_as_f64(enums::Currency::KWD).unwrap();
        assert_eq!(major.get_amount_as_f64(), 12.345);
    }
}
