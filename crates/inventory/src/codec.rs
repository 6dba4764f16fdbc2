//! Snapshot codec: the registry as a plain structured value.
//!
//! The wire form is
//! `{ containers: [{ id, config, items: [{ itemId, stacks: [{ quantity, position? }] }],
//! lockedItems: [..], slotState?: { slots: [[name, itemId | null], ..] } }] }`.
//!
//! Decoding treats its input as hostile. Shape errors come from serde; the
//! semantic checks below (quantities, ids, slot state, grid footprints) run
//! before anything is built, so a rejected snapshot never leaves partial
//! state behind.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use stowage_core::{ContainerId, InventoryError, InventoryResult, ItemId};

use crate::config::ModeConfig;
use crate::container::Container;
use crate::limits::EngineLimits;
use crate::mode::ModeContext;
use crate::registry::Registry;
use crate::stack::{GridPosition, ItemStack};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Snapshot {
    pub containers: Vec<ContainerSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContainerSnapshot {
    pub id: ContainerId,
    pub config: ModeConfig,
    pub items: Vec<ItemSnapshot>,
    pub locked_items: Vec<ItemId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot_state: Option<SlotStateSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ItemSnapshot {
    pub item_id: ItemId,
    pub stacks: Vec<StackSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StackSnapshot {
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<GridPosition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SlotStateSnapshot {
    pub slots: Vec<(String, Option<ItemId>)>,
}

pub(crate) fn encode_container(container: &Container) -> ContainerSnapshot {
    ContainerSnapshot {
        id: container.id().clone(),
        config: container.config().clone(),
        items: container
            .entries()
            .map(|(item, stacks)| ItemSnapshot {
                item_id: item.clone(),
                stacks: stacks
                    .iter()
                    .map(|s| StackSnapshot {
                        quantity: s.quantity,
                        position: s.position,
                    })
                    .collect(),
            })
            .collect(),
        locked_items: container.locked_items().cloned().collect(),
        slot_state: container.slots().map(|state| SlotStateSnapshot {
            slots: state.assignments().to_vec(),
        }),
    }
}

pub(crate) fn encode(registry: &Registry) -> Snapshot {
    Snapshot {
        containers: registry.iter().map(encode_container).collect(),
    }
}

fn invalid(container: &ContainerId, msg: impl core::fmt::Display) -> InventoryError {
    InventoryError::validation(format!("malformed snapshot: container '{container}': {msg}"))
}

/// Build a registry from `snapshot`, or fail without side effects.
pub(crate) fn decode(
    snapshot: Snapshot,
    ctx: ModeContext<'_>,
    limits: &EngineLimits,
) -> InventoryResult<Registry> {
    let mut registry = Registry::new();
    for entry in snapshot.containers {
        let container = decode_container(entry, ctx, limits)?;
        let id = container.id().clone();
        registry
            .insert(container)
            .map_err(|_| invalid(&id, "duplicate container id"))?;
    }
    Ok(registry)
}

fn decode_container(
    entry: ContainerSnapshot,
    ctx: ModeContext<'_>,
    limits: &EngineLimits,
) -> InventoryResult<Container> {
    let id = entry.id;
    entry
        .config
        .validate(limits, &|name| ctx.filters.contains(name))
        .map_err(|e| invalid(&id, e))?;

    let mut container = Container::new(id.clone(), entry.config);

    let mut seen_items = HashSet::new();
    let mut table: Vec<(ItemId, Vec<ItemStack>)> = Vec::with_capacity(entry.items.len());
    for item in entry.items {
        if !seen_items.insert(item.item_id.clone()) {
            return Err(invalid(&id, format!("item '{}' listed twice", item.item_id)));
        }
        let mut stacks = Vec::with_capacity(item.stacks.len());
        for stack in item.stacks {
            if stack.quantity == 0 {
                return Err(invalid(&id, format!("stack of '{}' has quantity 0", item.item_id)));
            }
            stacks.push(ItemStack {
                item_id: item.item_id.clone(),
                quantity: stack.quantity,
                position: stack.position,
            });
        }
        table.push((item.item_id, stacks));
    }

    rebuild_grid(&mut container, &table, ctx).map_err(|e| invalid(&id, e))?;
    rebuild_slots(&mut container, &table, entry.slot_state).map_err(|e| invalid(&id, e))?;

    container.set_entries(table);
    for item in entry.locked_items {
        container.lock(item);
    }
    Ok(container)
}

/// Claim cells for every positioned stack, checking bounds and overlap.
fn rebuild_grid(
    container: &mut Container,
    table: &[(ItemId, Vec<ItemStack>)],
    ctx: ModeContext<'_>,
) -> InventoryResult<()> {
    let allow_rotation = container.config().grid_rule().map(|g| g.allow_rotation);
    let Some(grid) = container.grid_mut() else {
        return match table.iter().flat_map(|(_, s)| s).find(|s| s.position.is_some()) {
            Some(stack) => Err(InventoryError::validation(format!(
                "stack of '{}' has a position but the container has no grid",
                stack.item_id
            ))),
            None => Ok(()),
        };
    };

    for (item, stacks) in table {
        let size = ctx.meta.size(item)?;
        for (index, stack) in stacks.iter().enumerate() {
            let Some(at) = stack.position else {
                return Err(InventoryError::validation(format!(
                    "stack of '{item}' in a grid container has no position"
                )));
            };
            if at.rotated && allow_rotation != Some(true) {
                return Err(InventoryError::validation(format!(
                    "stack of '{item}' is rotated but rotation is disabled"
                )));
            }
            let footprint = size.oriented(at.rotated);
            if !grid.in_bounds(at.x, at.y, footprint) {
                return Err(InventoryError::validation(format!(
                    "stack of '{item}' at ({}, {}) is outside the grid",
                    at.x, at.y
                )));
            }
            if !grid.is_free(at.x, at.y, footprint) {
                return Err(InventoryError::validation(format!(
                    "stack of '{item}' at ({}, {}) overlaps another stack",
                    at.x, at.y
                )));
            }
            grid.occupy(at.x, at.y, footprint, item, index);
        }
    }
    Ok(())
}

/// Restore slot assignments. Every assigned slot must be backed by a
/// one-unit stack of the same item, and vice versa.
fn rebuild_slots(
    container: &mut Container,
    table: &[(ItemId, Vec<ItemStack>)],
    saved: Option<SlotStateSnapshot>,
) -> InventoryResult<()> {
    let Some(state) = container.slots_mut() else {
        return match saved {
            Some(_) => Err(InventoryError::validation(
                "slot state on a container without slots",
            )),
            None => Ok(()),
        };
    };

    let mut assigned: HashMap<&ItemId, usize> = HashMap::new();
    let mut seen = HashSet::new();
    let saved = saved.map(|s| s.slots).unwrap_or_default();
    for (slot, item) in &saved {
        if !seen.insert(slot.as_str()) {
            return Err(InventoryError::validation(format!("slot '{slot}' listed twice")));
        }
        if state.get(slot).is_none() {
            return Err(InventoryError::validation(format!("unknown slot '{slot}'")));
        }
        if let Some(item) = item {
            *assigned.entry(item).or_default() += 1;
        }
    }

    for (item, stacks) in table {
        if stacks.iter().any(|s| s.quantity != 1) {
            return Err(InventoryError::validation(format!(
                "slot stacks of '{item}' must hold exactly one unit"
            )));
        }
        if assigned.remove(item).unwrap_or(0) != stacks.len() {
            return Err(InventoryError::validation(format!(
                "stacks of '{item}' do not match its slot assignments"
            )));
        }
    }
    if let Some(item) = assigned.keys().next() {
        return Err(InventoryError::validation(format!(
            "slot assigned to '{item}' which the container does not hold"
        )));
    }

    for (slot, item) in saved {
        state.set(&slot, item);
    }
    Ok(())
}
