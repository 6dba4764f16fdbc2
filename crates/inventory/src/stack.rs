use serde::{Deserialize, Serialize};
use stowage_core::ItemId;

/// Top-left anchor of a stack on a grid, plus its orientation.
///
/// Also used as a placement candidate returned by grid searches.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPosition {
    pub x: u32,
    pub y: u32,
    #[serde(default)]
    pub rotated: bool,
}

impl GridPosition {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y, rotated: false }
    }

    pub fn rotated(x: u32, y: u32) -> Self {
        Self { x, y, rotated: true }
    }
}

/// A grid coordinate (plus rotation flag) where an item's footprint fits.
pub type Placement = GridPosition;

/// A quantity of one item. `quantity` is always positive while the stack is
/// held by a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: ItemId,
    pub quantity: u32,
    pub position: Option<GridPosition>,
}

impl ItemStack {
    pub fn new(item_id: ItemId, quantity: u32) -> Self {
        Self {
            item_id,
            quantity,
            position: None,
        }
    }

    pub fn at(item_id: ItemId, quantity: u32, position: GridPosition) -> Self {
        Self {
            item_id,
            quantity,
            position: Some(position),
        }
    }

    /// Room left under `cap`.
    pub fn headroom(&self, cap: u32) -> u32 {
        cap.saturating_sub(self.quantity)
    }
}

/// Addresses one stack inside a container: the item and the stack's index in
/// that item's stack sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StackRef {
    pub item_id: ItemId,
    pub index: usize,
}

impl StackRef {
    pub fn new(item_id: ItemId, index: usize) -> Self {
        Self { item_id, index }
    }
}
