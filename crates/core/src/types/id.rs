//! Newtype wrappers for commerce platform global IDs.
//!
//! Every resource on the platform is addressed by a global ID of the form
//! `gid://shopify/<Resource>/<id>`, optionally followed by a query string
//! (cart IDs carry a `?key=` suffix). Use the `define_gid!` macro to create a
//! wrapper per resource so a variant ID can't be passed where a cart line ID
//! is expected.

use core::fmt;

/// Scheme and namespace prefix shared by all platform global IDs.
pub const GID_PREFIX: &str = "gid://shopify/";

/// Errors that can occur when parsing a global ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum GidError {
    /// The input does not start with `gid://shopify/`.
    #[error("not a platform global id: {0}")]
    NotAGid(String),
    /// The resource segment does not match the expected type.
    #[error("expected a {expected} id, got {actual}")]
    WrongResource {
        /// Resource name the caller asked for.
        expected: &'static str,
        /// Resource name found in the input.
        actual: String,
    },
    /// The trailing identifier is empty.
    #[error("global id has no identifier: {0}")]
    MissingId(String),
}

/// Split a global ID into its resource name and identifier.
///
/// The identifier excludes any query-string suffix.
///
/// # Errors
///
/// Returns an error if the prefix is missing or the identifier is empty.
pub fn split_gid(gid: &str) -> Result<(&str, &str), GidError> {
    let rest = gid
        .strip_prefix(GID_PREFIX)
        .ok_or_else(|| GidError::NotAGid(gid.to_owned()))?;
    let (resource, id) = rest
        .split_once('/')
        .ok_or_else(|| GidError::MissingId(gid.to_owned()))?;
    let id = id.split_once('?').map_or(id, |(id, _)| id);
    if resource.is_empty() || id.is_empty() {
        return Err(GidError::MissingId(gid.to_owned()));
    }
    Ok((resource, id))
}

/// Macro to define a type-safe global ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` as the plain GID string (validated on input)
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - `parse()`, `from_numeric()`, `as_str()`, `numeric_id()`
/// - `Display` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use tidepool_core::define_gid;
/// define_gid!(ProductGid, "Product");
///
/// let id = ProductGid::parse("gid://shopify/Product/42").unwrap();
/// assert_eq!(id.numeric_id(), "42");
/// assert!(ProductGid::parse("gid://shopify/Order/42").is_err());
/// ```
#[macro_export]
macro_rules! define_gid {
    ($name:ident, $resource:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Resource name this ID refers to.
            pub const RESOURCE: &'static str = $resource;

            /// Parse a global ID, checking the resource name.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is not a global ID for this resource.
            pub fn parse(gid: &str) -> ::core::result::Result<Self, $crate::GidError> {
                let (resource, _) = $crate::split_gid(gid)?;
                if resource != Self::RESOURCE {
                    return Err($crate::GidError::WrongResource {
                        expected: Self::RESOURCE,
                        actual: resource.to_owned(),
                    });
                }
                Ok(Self(gid.to_owned()))
            }

            /// Build a global ID from a bare numeric identifier.
            #[must_use]
            pub fn from_numeric(id: u64) -> Self {
                Self(format!("{}{}/{id}", $crate::GID_PREFIX, Self::RESOURCE))
            }

            /// The full global ID string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The trailing identifier, without any query suffix.
            #[must_use]
            pub fn numeric_id(&self) -> &str {
                $crate::split_gid(&self.0).map_or("", |(_, id)| id)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::GidError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::GidError;

            fn try_from(value: String) -> ::core::result::Result<Self, Self::Error> {
                Self::parse(&value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_gid!(ProductGid, "Product");
define_gid!(VariantGid, "ProductVariant");
define_gid!(CollectionGid, "Collection");
define_gid!(CartGid, "Cart");
define_gid!(CartLineGid, "CartLine");
define_gid!(OrderGid, "Order");
define_gid!(AddressGid, "CustomerAddress");
define_gid!(SellingPlanGid, "SellingPlan");

/// A global ID of any resource, for logging and generic lookups.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnyGid {
    /// Resource name, e.g. `Product`.
    pub resource: String,
    /// Trailing identifier.
    pub id: String,
}

impl AnyGid {
    /// Parse any global ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a global ID.
    pub fn parse(gid: &str) -> Result<Self, GidError> {
        let (resource, id) = split_gid(gid)?;
        Ok(Self {
            resource: resource.to_owned(),
            id: id.to_owned(),
        })
    }
}

impl fmt::Display for AnyGid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{GID_PREFIX}{}/{}", self.resource, self.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variant_gid() {
        let id = VariantGid::parse("gid://shopify/ProductVariant/4242").unwrap();
        assert_eq!(id.numeric_id(), "4242");
        assert_eq!(id.to_string(), "gid://shopify/ProductVariant/4242");
    }

    #[test]
    fn test_cart_gid_keeps_key_suffix() {
        let raw = "gid://shopify/Cart/c1-abc?key=deadbeef";
        let id = CartGid::parse(raw).unwrap();
        assert_eq!(id.as_str(), raw);
        assert_eq!(id.numeric_id(), "c1-abc");
    }

    #[test]
    fn test_wrong_resource_rejected() {
        let err = ProductGid::parse("gid://shopify/Collection/1").unwrap_err();
        assert_eq!(
            err,
            GidError::WrongResource {
                expected: "Product",
                actual: "Collection".to_owned(),
            }
        );
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(
            OrderGid::parse("12345"),
            Err(GidError::NotAGid(_))
        ));
        assert!(matches!(
            OrderGid::parse("gid://shopify/Order/"),
            Err(GidError::MissingId(_))
        ));
        assert!(matches!(
            OrderGid::parse("gid://shopify/Order"),
            Err(GidError::MissingId(_))
        ));
    }

    #[test]
    fn test_from_numeric() {
        let id = AddressGid::from_numeric(77);
        assert_eq!(id.as_str(), "gid://shopify/CustomerAddress/77");
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<ProductGid, _> = serde_json::from_str("\"gid://shopify/Product/1\"");
        assert!(ok.is_ok());
        let bad: Result<ProductGid, _> = serde_json::from_str("\"gid://shopify/Order/1\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_any_gid() {
        let any = AnyGid::parse("gid://shopify/Page/9").unwrap();
        assert_eq!(any.resource, "Page");
        assert_eq!(any.to_string(), "gid://shopify/Page/9");
    }
}
