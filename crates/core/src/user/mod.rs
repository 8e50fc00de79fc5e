//! User directory port and locale helpers

pub mod locale;
pub mod ports;

pub use locale::{country_from_locale, resolve_country};
