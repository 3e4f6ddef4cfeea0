use std::fmt::Display;

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

pub const DEFAULT_CURRENCY_CODE: &str = "PLN";

//--------------------------------------     MinorUnits      ---------------------------------------------------------
/// An amount of money expressed in the smallest unit of its currency (e.g. grosze for PLN, cents for USD).
///
/// Payment orders only ever carry strictly positive amounts, so the only way to build a `MinorUnits` from untrusted
/// input is via [`MinorUnits::try_positive`].
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct MinorUnits(i64);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Amount must be a positive integer number of minor currency units. Got {0}")]
pub struct MinorUnitsError(pub i64);

impl MinorUnits {
    pub fn try_positive(value: i64) -> Result<Self, MinorUnitsError> {
        if value > 0 {
            Ok(Self(value))
        } else {
            Err(MinorUnitsError(value))
        }
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    /// The gateway expects amounts as decimal strings of minor units, e.g. `"1000"` for 10.00.
    pub fn to_wire_string(&self) -> String {
        self.0.to_string()
    }
}

impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, (self.0 % 100).abs())
    }
}
