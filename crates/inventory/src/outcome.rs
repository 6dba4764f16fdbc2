//! Structured results of engine calls.
//!
//! Capacity shortfalls are data, not errors: callers branch on `success` /
//! `can_add` and read `overflow` / `max_addable` to decide what to retry.

use serde::{Deserialize, Serialize};
use stowage_core::{ContainerId, ItemId};

use crate::stack::GridPosition;

/// `max_addable` value reported by containers with no capacity bound.
pub const UNBOUNDED: u64 = u64::MAX;

/// Why a container could not take everything it was offered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityReason {
    CountExceeded,
    WeightExceeded,
    GridFull,
    PositionOccupied,
    StackFull,
    NoFreeSlot,
}

impl CapacityReason {
    pub fn code(&self) -> &'static str {
        match self {
            CapacityReason::CountExceeded => "count_exceeded",
            CapacityReason::WeightExceeded => "weight_exceeded",
            CapacityReason::GridFull => "grid_full",
            CapacityReason::PositionOccupied => "position_occupied",
            CapacityReason::StackFull => "stack_full",
            CapacityReason::NoFreeSlot => "no_free_slot",
        }
    }
}

impl core::fmt::Display for CapacityReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of `add_item` / `add_item_at`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub success: bool,
    pub added: u32,
    pub overflow: u32,
    pub reason: Option<CapacityReason>,
}

impl AddOutcome {
    pub(crate) fn nothing() -> Self {
        Self {
            success: true,
            added: 0,
            overflow: 0,
            reason: None,
        }
    }
}

/// Result of `transfer`. `transferred + overflow` equals the requested amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub transferred: u32,
    pub overflow: u32,
    pub reason: Option<CapacityReason>,
}

/// Result of `can_add`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityCheck {
    pub can_add: bool,
    /// Units that would be accepted right now; [`UNBOUNDED`] when unlimited.
    pub max_addable: u64,
    pub reason: Option<CapacityReason>,
}

/// Spare capacity, keyed by mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum RemainingCapacity {
    Unlimited,
    Count { free_stacks: u64 },
    Weight { remaining_weight: f64 },
    Grid { free_cells: u64 },
    Slots { free_slots: Vec<String> },
    Combined { rules: Vec<RemainingCapacity> },
}

/// One stack as reported by `contents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentEntry {
    /// Container directly holding the stack (differs from the queried one
    /// for nested contents).
    pub container_id: ContainerId,
    pub item_id: ItemId,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
}

/// A container holding some of an item, from `find_item`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemLocation {
    pub container_id: ContainerId,
    pub quantity: u64,
}

/// Aggregate quantity of one item, the unit `sort` compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTotal {
    pub item_id: ItemId,
    pub quantity: u64,
    pub stacks: usize,
}
