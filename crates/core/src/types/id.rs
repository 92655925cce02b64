//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! The bakery backend is inconsistent about identifier types: some endpoints
//! emit numeric ids (`"id": 12`) and others strings (`"id": "12"`). IDs are
//! therefore string-backed and accept both forms on deserialization, so the
//! rest of the code never has to care.

use serde::Deserialize;

/// Errors that can occur when parsing an ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input string is empty or whitespace.
    #[error("id cannot be empty")]
    Empty,
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize` as a plain JSON string
/// - `Deserialize` from either a JSON string or a JSON integer
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `parse()`, `as_str()`
///
/// # Example
///
/// ```rust
/// # use bakery_core::define_id;
/// define_id!(CustomerId);
/// define_id!(InvoiceId);
///
/// let customer_id = CustomerId::new("1");
/// let invoice_id = InvoiceId::new("1");
///
/// // These are different types, so this won't compile:
/// // let _: CustomerId = invoice_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Parse a user-supplied ID, rejecting blank input.
            ///
            /// # Errors
            ///
            /// Returns `IdError::Empty` if the input is empty or whitespace.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err($crate::types::id::IdError::Empty);
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id.to_string())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                $crate::types::id::deserialize_id(deserializer).map(Self)
            }
        }
    };
}

/// Deserialize an identifier from a JSON string or integer.
#[doc(hidden)]
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Signed(n) => n.to_string(),
        RawId::Unsigned(n) => n.to_string(),
    })
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(OrderId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_deserializes_from_number_and_string() {
        let from_number: ProductId = serde_json::from_str("42").unwrap();
        let from_string: ProductId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.as_str(), "42");
    }

    #[test]
    fn test_id_serializes_as_string() {
        let id = OrderId::new("ord-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"ord-7\"");
    }

    #[test]
    fn test_id_parse_rejects_blank() {
        assert_eq!(ProductId::parse("   "), Err(IdError::Empty));
        assert_eq!(ProductId::parse(" 7 ").unwrap().as_str(), "7");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(OrderId::from(5_i64).to_string(), "5");
    }
}
