mod helpers;
mod minor_units;
mod secret;

pub use helpers::{parse_boolean_flag, parse_seconds};
pub use minor_units::{MinorUnits, MinorUnitsError, DEFAULT_CURRENCY_CODE};
pub use secret::Secret;
