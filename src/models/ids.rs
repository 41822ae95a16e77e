//! Validated identifiers for books and users

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::error::AppError;

static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,64}$").expect("valid id pattern"));

fn check(kind: &str, raw: &str) -> Result<(), AppError> {
    if ID_PATTERN.is_match(raw) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Malformed {} id: {:?} (expected 1-64 characters of [A-Za-z0-9._-])",
            kind, raw
        )))
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw identifier
            pub fn parse(raw: impl Into<String>) -> Result<Self, AppError> {
                let raw = raw.into();
                check($kind, &raw)?;
                Ok(Self(raw))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = AppError;

            fn try_from(raw: String) -> Result<Self, Self::Error> {
                Self::parse(raw)
            }
        }

        impl std::str::FromStr for $name {
            type Err = AppError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                Self::parse(raw)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id!(
    /// Book identifier. Ordered byte-wise; this order decides which books survive truncation.
    BookId,
    "book"
);

string_id!(
    /// User identifier
    UserId,
    "user"
);
