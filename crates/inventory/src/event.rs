use serde::{Deserialize, Serialize};
use stowage_core::{ContainerId, ItemId};
use stowage_events::Event;

use crate::outcome::CapacityReason;

/// Event: units of an item entered a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemAdded {
    pub container_id: ContainerId,
    pub item_id: ItemId,
    pub quantity: u32,
    /// Quantity of the item held by the container after the change.
    pub new_total: u64,
}

/// Event: units of an item left a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRemoved {
    pub container_id: ContainerId,
    pub item_id: ItemId,
    pub quantity: u32,
    pub new_total: u64,
}

/// Event: units moved between two containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTransferred {
    pub from: ContainerId,
    pub to: ContainerId,
    pub item_id: ItemId,
    pub quantity: u32,
}

/// Event: an admission fell short.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerFull {
    pub container_id: ContainerId,
    pub item_id: ItemId,
    pub overflow: u32,
    pub reason: CapacityReason,
}

/// Event: a slot assignment changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotChanged {
    pub container_id: ContainerId,
    pub slot: String,
    pub old_item: Option<ItemId>,
    pub new_item: Option<ItemId>,
}

/// Event: a container was removed from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRemoved {
    pub container_id: ContainerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemAdded(ItemAdded),
    ItemRemoved(ItemRemoved),
    ItemTransferred(ItemTransferred),
    ContainerFull(ContainerFull),
    SlotChanged(SlotChanged),
    ContainerRemoved(ContainerRemoved),
}

impl InventoryEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InventoryEvent::ItemAdded(_) => EventKind::ItemAdded,
            InventoryEvent::ItemRemoved(_) => EventKind::ItemRemoved,
            InventoryEvent::ItemTransferred(_) => EventKind::ItemTransferred,
            InventoryEvent::ContainerFull(_) => EventKind::ContainerFull,
            InventoryEvent::SlotChanged(_) => EventKind::SlotChanged,
            InventoryEvent::ContainerRemoved(_) => EventKind::ContainerRemoved,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        self.kind().event_type()
    }
}

/// Event names listeners subscribe to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemAdded,
    ItemRemoved,
    ItemTransferred,
    ContainerFull,
    SlotChanged,
    ContainerRemoved,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::ItemAdded,
        EventKind::ItemRemoved,
        EventKind::ItemTransferred,
        EventKind::ContainerFull,
        EventKind::SlotChanged,
        EventKind::ContainerRemoved,
    ];

    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::ItemAdded => "inventory.item.added",
            EventKind::ItemRemoved => "inventory.item.removed",
            EventKind::ItemTransferred => "inventory.item.transferred",
            EventKind::ContainerFull => "inventory.container.full",
            EventKind::SlotChanged => "inventory.slot.changed",
            EventKind::ContainerRemoved => "inventory.container.removed",
        }
    }
}
