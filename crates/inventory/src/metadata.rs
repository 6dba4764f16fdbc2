//! Host-supplied item metadata and the validating adapter around it.
//!
//! The engine knows three things about an item: its weight, its grid
//! footprint and its stack limit. The host answers these through
//! [`ItemMetadata`]; answers are re-validated on every call because the host
//! may change them at any time.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use stowage_core::{InventoryError, InventoryResult, ItemId};

/// Grid footprint of an item (unrotated).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemSize {
    pub width: u32,
    pub height: u32,
}

impl ItemSize {
    pub const UNIT: ItemSize = ItemSize {
        width: 1,
        height: 1,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Footprint with width and height swapped when `rotated`.
    pub fn oriented(self, rotated: bool) -> Self {
        if rotated {
            Self::new(self.height, self.width)
        } else {
            self
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

impl Default for ItemSize {
    fn default() -> Self {
        Self::UNIT
    }
}

/// Item lookups supplied by the host.
pub trait ItemMetadata: Send + Sync {
    /// Weight of one unit. Must be positive and finite.
    fn weight(&self, _item: &ItemId) -> f64 {
        1.0
    }

    /// Grid footprint. Both sides must be at least 1.
    fn size(&self, _item: &ItemId) -> ItemSize {
        ItemSize::UNIT
    }

    /// Largest quantity one stack may hold. Must be at least 1.
    fn stack_limit(&self, _item: &ItemId) -> u32 {
        u32::MAX
    }
}

/// Metadata for one item kind in an [`ItemCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSpec {
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub size: ItemSize,
    #[serde(default)]
    pub stack_limit: Option<u32>,
}

fn default_weight() -> f64 {
    1.0
}

impl Default for ItemSpec {
    fn default() -> Self {
        Self {
            weight: default_weight(),
            size: ItemSize::UNIT,
            stack_limit: None,
        }
    }
}

impl ItemSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = ItemSize::new(width, height);
        self
    }

    pub fn stack_limit(mut self, limit: u32) -> Self {
        self.stack_limit = Some(limit);
        self
    }
}

/// Table-driven metadata, loadable from JSON.
///
/// Items missing from the table use `fallback`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCatalog {
    #[serde(default)]
    pub items: HashMap<ItemId, ItemSpec>,
    #[serde(default)]
    pub fallback: ItemSpec,
}

impl ItemCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: ItemId, spec: ItemSpec) -> Self {
        self.items.insert(item, spec);
        self
    }

    pub fn with_fallback(mut self, spec: ItemSpec) -> Self {
        self.fallback = spec;
        self
    }

    /// Insert or replace an entry (hosts may change metadata at runtime).
    pub fn set(&mut self, item: ItemId, spec: ItemSpec) {
        self.items.insert(item, spec);
    }

    fn spec(&self, item: &ItemId) -> &ItemSpec {
        self.items.get(item).unwrap_or(&self.fallback)
    }
}

impl ItemMetadata for ItemCatalog {
    fn weight(&self, item: &ItemId) -> f64 {
        self.spec(item).weight
    }

    fn size(&self, item: &ItemId) -> ItemSize {
        self.spec(item).size
    }

    fn stack_limit(&self, item: &ItemId) -> u32 {
        self.spec(item).stack_limit.unwrap_or(u32::MAX)
    }
}

type WeightFn = Box<dyn Fn(&ItemId) -> f64 + Send + Sync>;
type SizeFn = Box<dyn Fn(&ItemId) -> ItemSize + Send + Sync>;
type StackLimitFn = Box<dyn Fn(&ItemId) -> u32 + Send + Sync>;

/// Closure-backed metadata. Unset lookups use the trait defaults.
#[derive(Default)]
pub struct MetadataFns {
    weight: Option<WeightFn>,
    size: Option<SizeFn>,
    stack_limit: Option<StackLimitFn>,
}

impl MetadataFns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weight(mut self, f: impl Fn(&ItemId) -> f64 + Send + Sync + 'static) -> Self {
        self.weight = Some(Box::new(f));
        self
    }

    pub fn with_size(mut self, f: impl Fn(&ItemId) -> ItemSize + Send + Sync + 'static) -> Self {
        self.size = Some(Box::new(f));
        self
    }

    pub fn with_stack_limit(mut self, f: impl Fn(&ItemId) -> u32 + Send + Sync + 'static) -> Self {
        self.stack_limit = Some(Box::new(f));
        self
    }
}

impl core::fmt::Debug for MetadataFns {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MetadataFns")
            .field("weight", &self.weight.is_some())
            .field("size", &self.size.is_some())
            .field("stack_limit", &self.stack_limit.is_some())
            .finish()
    }
}

impl ItemMetadata for MetadataFns {
    fn weight(&self, item: &ItemId) -> f64 {
        self.weight.as_ref().map_or(1.0, |f| f(item))
    }

    fn size(&self, item: &ItemId) -> ItemSize {
        self.size.as_ref().map_or(ItemSize::UNIT, |f| f(item))
    }

    fn stack_limit(&self, item: &ItemId) -> u32 {
        self.stack_limit.as_ref().map_or(u32::MAX, |f| f(item))
    }
}

/// Validating view over the host's [`ItemMetadata`].
#[derive(Copy, Clone)]
pub(crate) struct MetadataAdapter<'a> {
    inner: &'a dyn ItemMetadata,
}

impl<'a> MetadataAdapter<'a> {
    pub(crate) fn new(inner: &'a dyn ItemMetadata) -> Self {
        Self { inner }
    }

    pub(crate) fn weight(&self, item: &ItemId) -> InventoryResult<f64> {
        let weight = self.inner.weight(item);
        if !weight.is_finite() || weight <= 0.0 {
            return Err(InventoryError::validation(format!(
                "item '{item}' has invalid weight {weight}; weight must be a positive finite number"
            )));
        }
        Ok(weight)
    }

    pub(crate) fn size(&self, item: &ItemId) -> InventoryResult<ItemSize> {
        let size = self.inner.size(item);
        if size.width == 0 || size.height == 0 {
            return Err(InventoryError::validation(format!(
                "item '{item}' has malformed size {}x{}",
                size.width, size.height
            )));
        }
        Ok(size)
    }

    pub(crate) fn stack_limit(&self, item: &ItemId) -> InventoryResult<u32> {
        let limit = self.inner.stack_limit(item);
        if limit == 0 {
            return Err(InventoryError::validation(format!(
                "item '{item}' has a stack limit of 0"
            )));
        }
        Ok(limit)
    }
}
