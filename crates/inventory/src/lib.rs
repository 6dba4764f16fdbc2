//! In-process inventory engine.
//!
//! An [`Engine`] owns a registry of containers. Each container holds stacks
//! of items under one capacity discipline ([`ModeConfig`]): unlimited, stack
//! count, total weight, a 2D grid, named equipment slots, or a combination of
//! several rules. Item properties come from a host-supplied
//! [`ItemMetadata`] source.
//!
//! Capacity shortfalls are reported through outcome values
//! ([`AddOutcome`], [`TransferOutcome`]); misuse is an
//! [`InventoryError`]. State changes are announced synchronously as
//! [`InventoryEvent`]s. The whole registry round-trips through a plain
//! structured value (see [`codec`]). Nothing here does IO.

pub mod codec;
pub mod config;
pub mod container;
pub mod engine;
pub mod event;
pub mod grid;
pub mod limits;
pub mod metadata;
pub mod mode;
mod nesting;
pub mod outcome;
pub mod registry;
pub mod stack;

pub use codec::{ContainerSnapshot, ItemSnapshot, SlotStateSnapshot, Snapshot, StackSnapshot};
pub use config::{
    CombinedRule, CountRule, GridRule, Mode, ModeConfig, SlotDef, SlotsRule, Stacking,
    UnlimitedRule, WeightRule,
};
pub use container::{Container, SlotState};
pub use engine::Engine;
pub use event::{
    ContainerFull, ContainerRemoved, EventKind, InventoryEvent, ItemAdded, ItemRemoved,
    ItemTransferred, SlotChanged,
};
pub use grid::{CellView, GridCell, GridState};
pub use limits::{EngineLimits, MAX_GRID_AXIS_ENV, MAX_GRID_CELLS_ENV};
pub use metadata::{ItemCatalog, ItemMetadata, ItemSize, ItemSpec, MetadataFns};
pub use mode::{SlotFilter, SlotFilters};
pub use outcome::{
    AddOutcome, CapacityCheck, CapacityReason, ContentEntry, ItemLocation, ItemTotal,
    RemainingCapacity, TransferOutcome, UNBOUNDED,
};
pub use registry::Registry;
pub use stack::{GridPosition, ItemStack, Placement, StackRef};

pub use stowage_core::{ContainerId, InventoryError, InventoryResult, ItemId};
pub use stowage_events::ListenerId;
