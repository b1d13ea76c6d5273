//! Strongly-typed identifiers used across the catalog.
//!
//! Records are keyed by sequential integers (assigned by the store, starting at 1),
//! so every id is a transparent `i64` newtype on the wire.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

macro_rules! serial_id {
    ($(#[$meta:meta])* $t:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $t(i64);

        impl $t {
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<i64> for $t {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(value))
            }
        }
    };
}

serial_id!(
    /// Identifier of a catalog product.
    ProductId,
    "ProductId"
);
serial_id!(
    /// Identifier of a physical store.
    StoreId,
    "StoreId"
);
serial_id!(
    /// Identifier of one (product, store) price record.
    PriceId,
    "PriceId"
);
serial_id!(
    /// Identifier of an app user.
    UserId,
    "UserId"
);
serial_id!(ShoppingListId, "ShoppingListId");
serial_id!(FavoriteId, "FavoriteId");
