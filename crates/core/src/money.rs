//! Prices in minor currency units (agorot, cents, ...).

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::{DomainError, DomainResult};

/// A non-negative price in minor currency units.
///
/// Construction always goes through [`MinorUnits::new`], so a value of this type
/// is a valid price by definition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct MinorUnits(i64);

impl MinorUnits {
    pub const ZERO: MinorUnits = MinorUnits(0);

    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::validation(format!(
                "price must be non-negative, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Validate an untyped JSON value as a price.
    ///
    /// Only JSON integers are accepted: strings, floats (even `799.0`), booleans
    /// and null are all rejected.
    pub fn from_json(value: &JsonValue) -> DomainResult<Self> {
        match value {
            JsonValue::Number(n) => match n.as_i64() {
                Some(v) => Self::new(v),
                None if n.is_u64() => Err(DomainError::validation("price is out of range")),
                None => Err(DomainError::validation("price must be an integer in minor units")),
            },
            JsonValue::Null => Err(DomainError::validation("price is required")),
            _ => Err(DomainError::validation("price must be an integer in minor units")),
        }
    }
}

impl TryFrom<i64> for MinorUnits {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MinorUnits> for i64 {
    fn from(value: MinorUnits) -> Self {
        value.0
    }
}

/// Renders as major units with two decimals (`649` → `6.49`).
impl core::fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
