//! Macro for implementing Display and FromStr for stored enum tags
//!
//! Provider names, event sources and plan types are persisted as lower-case
//! text columns. This macro keeps the string form and the parser in one
//! place.
//!
//! # Example
//!
//! ```rust
//! use hearth_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum JobState {
//!     Pending,
//!     Sent,
//! }
//!
//! impl_domain_status_conversions!(JobState {
//!     Pending => "pending",
//!     Sent => "sent",
//! });
//! ```

/// Implements Display and FromStr traits for tag enums
///
/// Parsing is case-insensitive; display is always the lower-case tag.
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Course {
        Breakfast,
        Dinner,
    }

    impl_domain_status_conversions!(Course {
        Breakfast => "breakfast",
        Dinner => "dinner",
    });

    #[test]
    fn display_is_lower_case_tag() {
        assert_eq!(Course::Breakfast.to_string(), "breakfast");
        assert_eq!(Course::Dinner.to_string(), "dinner");
    }

    #[test]
    fn parsing_ignores_case() {
        assert_eq!(Course::from_str("DINNER").unwrap(), Course::Dinner);
        assert_eq!(Course::from_str("Breakfast").unwrap(), Course::Breakfast);
    }

    #[test]
    fn unknown_tag_names_the_enum() {
        let err = Course::from_str("brunch").unwrap_err();
        assert!(err.contains("Course"));
        assert!(err.contains("brunch"));
    }
}
