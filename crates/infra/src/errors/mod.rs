//! Infrastructure error conversions

mod conversions;

pub(crate) use conversions::sql_err;
pub use conversions::InfraError;
