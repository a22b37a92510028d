use crate::error::CoreError;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A business number exactly as it arrived on the wire.
///
/// The backend encodes every monetary and ratio field as decimal text so that no
/// precision is lost in transport. `Numeric` keeps that text untouched and is the
/// one place in the system where it becomes a `Decimal`. Every aggregation goes
/// through [`Numeric::value`], so absent and malformed values are treated the same
/// way everywhere: as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Numeric(Option<String>);

impl Numeric {
    /// A field the backend sent as `null` or omitted entirely.
    pub fn absent() -> Self {
        Self(None)
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self(Some(text.into()))
    }

    /// The raw transport text, if any.
    pub fn raw(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// True when the backend sent non-blank text for this field.
    pub fn is_present(&self) -> bool {
        self.0.as_deref().is_some_and(|s| !s.trim().is_empty())
    }

    /// Strict parse. Absent fields are an error too.
    pub fn try_value(&self) -> Result<Decimal, CoreError> {
        let text = self
            .0
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::InvalidInput("numeric".to_string(), "<absent>".to_string()))?;
        parse_decimal(text)
            .ok_or_else(|| CoreError::InvalidInput("numeric".to_string(), text.to_string()))
    }

    /// The parsed value, or `None` when absent or malformed.
    pub fn get(&self) -> Option<Decimal> {
        match self.try_value() {
            Ok(value) => Some(value),
            Err(_) => {
                if self.is_present() {
                    tracing::debug!(raw = ?self.0, "Malformed numeric field, treating as absent.");
                }
                None
            }
        }
    }

    /// The parsed value with absent and malformed input defaulted to zero.
    pub fn value(&self) -> Decimal {
        self.get().unwrap_or(Decimal::ZERO)
    }
}

impl From<Decimal> for Numeric {
    fn from(value: Decimal) -> Self {
        Self(Some(value.to_string()))
    }
}

impl From<&str> for Numeric {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(text) => f.write_str(text),
            None => f.write_str("-"),
        }
    }
}

/// Parses decimal text, accepting plain and scientific notation.
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    let text = text.trim();
    Decimal::from_str(text)
        .ok()
        .or_else(|| Decimal::from_scientific(text).ok())
}

/// Formats a value with a fixed number of decimal places, rounding half away from zero.
///
/// This is the presentation side of the text/numeric boundary; nothing in the
/// aggregation layer rounds.
pub fn format_decimal(value: Decimal, dp: u32) -> String {
    let rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

impl Serialize for Numeric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.0 {
            Some(text) => serializer.serialize_str(text),
            None => serializer.serialize_none(),
        }
    }
}

struct NumericVisitor;

impl<'de> Visitor<'de> for NumericVisitor {
    type Value = Numeric;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a decimal encoded as text, a JSON number, or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Numeric, E> {
        Ok(Numeric::from_text(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Numeric, E> {
        Ok(Numeric(Some(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Numeric, E> {
        Ok(Numeric(Some(v.to_string())))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Numeric, E> {
        Ok(Numeric(Some(v.to_string())))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Numeric, E> {
        // Non-finite floats are kept as text and fail to parse later like any other garbage.
        Ok(Numeric(Some(v.to_string())))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Numeric, E> {
        Ok(Numeric(Some(v.to_string())))
    }

    fn visit_none<E: de::Error>(self) -> Result<Numeric, E> {
        Ok(Numeric::absent())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Numeric, E> {
        Ok(Numeric::absent())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Numeric, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Deserialize<'de> for Numeric {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NumericVisitor)
    }
}

/// Deserializes an integer counter that may arrive as a number, as text, or as null.
///
/// Anything that is not a non-negative integer becomes zero.
pub fn deserialize_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Numeric::deserialize(deserializer)?;
    Ok(raw
        .get()
        .filter(|v| !v.is_sign_negative())
        .and_then(|v| v.trunc().to_u64())
        .unwrap_or(0))
}
