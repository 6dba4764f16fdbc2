//! Container state: ordered item table, locks and mode-specific auxiliary
//! state (grid cells, slot assignments).

use std::collections::BTreeSet;

use stowage_core::{ContainerId, ItemId};

use crate::config::{Mode, ModeConfig};
use crate::grid::GridState;
use crate::stack::ItemStack;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ItemEntry {
    pub(crate) item_id: ItemId,
    pub(crate) stacks: Vec<ItemStack>,
}

/// Slot assignments of a slots-mode container, in configuration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotState {
    assignments: Vec<(String, Option<ItemId>)>,
}

impl SlotState {
    pub(crate) fn new<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            assignments: names.into_iter().map(|n| (n.to_string(), None)).collect(),
        }
    }

    /// `None` when the slot does not exist; `Some(None)` when it is empty.
    pub fn get(&self, slot: &str) -> Option<Option<&ItemId>> {
        self.assignments
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, item)| item.as_ref())
    }

    pub fn assignments(&self) -> &[(String, Option<ItemId>)] {
        &self.assignments
    }

    pub fn free_slots(&self) -> impl Iterator<Item = &str> {
        self.assignments
            .iter()
            .filter(|(_, item)| item.is_none())
            .map(|(name, _)| name.as_str())
    }

    /// Assign `item` to an existing slot, returning the previous occupant.
    pub(crate) fn set(&mut self, slot: &str, item: Option<ItemId>) -> Option<ItemId> {
        self.assignments
            .iter_mut()
            .find(|(name, _)| name == slot)
            .and_then(|(_, current)| core::mem::replace(current, item))
    }

    /// Empty the last `count` slots holding `item`.
    fn release(&mut self, item: &ItemId, count: u32) {
        let mut left = count;
        for (_, held) in self.assignments.iter_mut().rev() {
            if left == 0 {
                break;
            }
            if held.as_ref() == Some(item) {
                *held = None;
                left -= 1;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.assignments.iter_mut().for_each(|(_, item)| *item = None);
    }
}

/// A named holder of item stacks governed by one capacity mode.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    id: ContainerId,
    config: ModeConfig,
    items: Vec<ItemEntry>,
    locked: BTreeSet<ItemId>,
    grid: Option<GridState>,
    slots: Option<SlotState>,
}

impl Container {
    /// A fresh, empty container. The config is assumed validated.
    pub(crate) fn new(id: ContainerId, config: ModeConfig) -> Self {
        let grid = config.grid_rule().map(|g| GridState::new(g.width, g.height));
        let slots = config
            .slots_rule()
            .map(|r| SlotState::new(r.slots.iter().map(|s| s.name.as_str())));
        Self {
            id,
            config,
            items: Vec::new(),
            locked: BTreeSet::new(),
            grid,
            slots,
        }
    }

    /// Detached copy evaluated under a different configuration.
    pub(crate) fn probe(&self, id: ContainerId, config: ModeConfig) -> Self {
        let mut copy = self.clone();
        copy.id = id;
        copy.config = config;
        copy
    }

    pub fn id(&self) -> &ContainerId {
        &self.id
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.config.mode()
    }

    pub fn grid(&self) -> Option<&GridState> {
        self.grid.as_ref()
    }

    pub(crate) fn grid_mut(&mut self) -> Option<&mut GridState> {
        self.grid.as_mut()
    }

    pub fn slots(&self) -> Option<&SlotState> {
        self.slots.as_ref()
    }

    pub(crate) fn slots_mut(&mut self) -> Option<&mut SlotState> {
        self.slots.as_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn stacks(&self, item: &ItemId) -> &[ItemStack] {
        self.items
            .iter()
            .find(|e| e.item_id == *item)
            .map_or(&[][..], |e| e.stacks.as_slice())
    }

    /// Items with their stacks, in table order.
    pub fn entries(&self) -> impl Iterator<Item = (&ItemId, &[ItemStack])> {
        self.items.iter().map(|e| (&e.item_id, e.stacks.as_slice()))
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &ItemId> {
        self.items.iter().map(|e| &e.item_id)
    }

    pub fn quantity(&self, item: &ItemId) -> u64 {
        self.stacks(item).iter().map(|s| u64::from(s.quantity)).sum()
    }

    /// Number of stacks across all items.
    pub fn stack_count(&self) -> usize {
        self.items.iter().map(|e| e.stacks.len()).sum()
    }

    pub fn is_locked(&self, item: &ItemId) -> bool {
        self.locked.contains(item)
    }

    pub fn locked_items(&self) -> impl Iterator<Item = &ItemId> {
        self.locked.iter()
    }

    pub(crate) fn lock(&mut self, item: ItemId) -> bool {
        self.locked.insert(item)
    }

    pub(crate) fn unlock(&mut self, item: &ItemId) -> bool {
        self.locked.remove(item)
    }

    fn position_of(&self, item: &ItemId) -> Option<usize> {
        self.items.iter().position(|e| e.item_id == *item)
    }

    /// Stack list of `item`, creating an empty entry at the end of the table.
    /// Callers must not leave an empty entry behind (see `prune`).
    pub(crate) fn stacks_mut(&mut self, item: &ItemId) -> &mut Vec<ItemStack> {
        let pos = match self.position_of(item) {
            Some(pos) => pos,
            None => {
                self.items.push(ItemEntry {
                    item_id: item.clone(),
                    stacks: Vec::new(),
                });
                self.items.len() - 1
            }
        };
        &mut self.items[pos].stacks
    }

    /// Drop zero-quantity stacks of `item` and its entry when nothing is left.
    pub(crate) fn prune(&mut self, item: &ItemId) {
        if let Some(pos) = self.position_of(item) {
            let entry = &mut self.items[pos];
            let before = entry.stacks.len();
            entry.stacks.retain(|s| s.quantity > 0);
            let shrunk = entry.stacks.len() != before;
            if entry.stacks.is_empty() {
                self.items.remove(pos);
            }
            if shrunk {
                self.reindex(item);
            }
        }
    }

    /// Rebuild grid cell indices of `item` after its stack list changed shape.
    pub(crate) fn reindex(&mut self, item: &ItemId) {
        if let Some(grid) = self.grid.as_mut() {
            let stacks = self
                .items
                .iter()
                .find(|e| e.item_id == *item)
                .map_or(&[][..], |e| e.stacks.as_slice());
            grid.reindex_item(item, stacks);
        }
    }

    /// Remove up to `quantity` units of `item`, newest stack first. Grid
    /// cells and slot assignments follow. Returns the amount removed.
    pub(crate) fn remove_units(&mut self, item: &ItemId, quantity: u32) -> u32 {
        let Some(pos) = self.position_of(item) else {
            return 0;
        };
        let stacks = &mut self.items[pos].stacks;
        let mut remaining = quantity;
        for stack in stacks.iter_mut().rev() {
            if remaining == 0 {
                break;
            }
            let take = remaining.min(stack.quantity);
            stack.quantity -= take;
            remaining -= take;
        }
        let removed = quantity - remaining;

        if let Some(slots) = self.slots.as_mut() {
            slots.release(item, removed);
        }
        self.prune(item);
        removed
    }

    /// Remove one whole stack, returning it.
    pub(crate) fn take_stack(&mut self, item: &ItemId, index: usize) -> Option<ItemStack> {
        let pos = self.position_of(item)?;
        let entry = &mut self.items[pos];
        if index >= entry.stacks.len() {
            return None;
        }
        let stack = entry.stacks.remove(index);
        if entry.stacks.is_empty() {
            self.items.remove(pos);
        }
        self.reindex(item);
        Some(stack)
    }

    /// Drop every item, grid cell and slot assignment. Locks are kept.
    pub(crate) fn clear_contents(&mut self) -> Vec<(ItemId, Vec<ItemStack>)> {
        if let Some(grid) = self.grid.as_mut() {
            grid.clear();
        }
        if let Some(slots) = self.slots.as_mut() {
            slots.clear();
        }
        core::mem::take(&mut self.items)
            .into_iter()
            .map(|e| (e.item_id, e.stacks))
            .collect()
    }

    /// Reorder the item table. `order` must be a permutation of the current
    /// item ids; grid cell indices are per item, so they stay valid.
    pub(crate) fn reorder(&mut self, order: &[ItemId]) {
        let mut old = core::mem::take(&mut self.items);
        for item in order {
            if let Some(pos) = old.iter().position(|e| e.item_id == *item) {
                self.items.push(old.swap_remove(pos));
            }
        }
        self.items.append(&mut old);
    }

    /// Replace the item table wholesale (snapshot restore). Grid and slot
    /// state must be rebuilt by the caller.
    pub(crate) fn set_entries(&mut self, entries: Vec<(ItemId, Vec<ItemStack>)>) {
        self.items = entries
            .into_iter()
            .filter(|(_, stacks)| !stacks.is_empty())
            .map(|(item_id, stacks)| ItemEntry { item_id, stacks })
            .collect();
    }
}
