//! Validated string identifiers for containers and items.
//!
//! Containers and items share one namespace: a container's identifier can be
//! stored as an item inside another container (nesting).

use core::borrow::Borrow;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

/// Longest identifier accepted, in bytes.
pub const MAX_ID_LEN: usize = 256;

/// Identifier of a container.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContainerId(String);

/// Identifier of an item kind.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

fn check(kind: &str, value: &str) -> Result<(), InventoryError> {
    if value.is_empty() {
        return Err(InventoryError::validation(format!("{kind} cannot be empty")));
    }
    if value.trim() != value {
        return Err(InventoryError::validation(format!(
            "{kind} '{value}' has leading or trailing whitespace"
        )));
    }
    if value.len() > MAX_ID_LEN {
        return Err(InventoryError::validation(format!(
            "{kind} is {} bytes long (limit {MAX_ID_LEN})",
            value.len()
        )));
    }
    Ok(())
}

macro_rules! impl_string_id {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Validate and wrap an identifier.
            pub fn new(value: impl Into<String>) -> Result<Self, InventoryError> {
                let value = value.into();
                check($name, &value)?;
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $t {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $t {
            type Error = InventoryError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $t {
            type Error = InventoryError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = InventoryError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

impl_string_id!(ContainerId, "container id");
impl_string_id!(ItemId, "item id");

impl ContainerId {
    /// The same identifier viewed as an item (for nesting).
    pub fn as_item(&self) -> ItemId {
        ItemId(self.0.clone())
    }
}

impl ItemId {
    /// The same identifier viewed as a container (for nesting).
    pub fn as_container(&self) -> ContainerId {
        ContainerId(self.0.clone())
    }
}
