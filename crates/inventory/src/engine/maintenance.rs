//! Stack maintenance: split, merge, consolidate, auto-arrange and sort.
//!
//! None of these change how much of an item a container holds, so none of
//! them publish events.

use core::cmp::Ordering;

use stowage_core::{ContainerId, InventoryError, InventoryResult, ItemId};

use super::Engine;
use crate::config::ModeConfig;
use crate::container::Container;
use crate::mode::{self, ModeContext};
use crate::outcome::ItemTotal;
use crate::stack::{ItemStack, StackRef};

/// Smallest stack-count limit imposed by `config`, if any.
fn stack_budget(config: &ModeConfig) -> Option<u32> {
    match config {
        ModeConfig::Count(r) => Some(r.max_count),
        ModeConfig::Combined(c) => c.rules.iter().filter_map(stack_budget).min(),
        _ => None,
    }
}

fn stack_at<'a>(container: &'a Container, item: &ItemId, index: usize) -> InventoryResult<&'a ItemStack> {
    let stacks = container.stacks(item);
    stacks.get(index).ok_or_else(|| {
        InventoryError::validation(format!(
            "stack index {index} out of range: '{}' holds {} stack(s) of '{item}'",
            container.id(),
            stacks.len()
        ))
    })
}

fn reject_grid(container: &Container, operation: &str) -> InventoryResult<()> {
    if container.grid().is_some() {
        return Err(InventoryError::validation(format!(
            "{operation} is not available for grid container '{}'",
            container.id()
        )));
    }
    Ok(())
}

impl Engine {
    /// Move `quantity` units off stack `index` into a new stack. Returns the
    /// new stack's index.
    pub fn split_stack(
        &mut self,
        container: &ContainerId,
        item: &ItemId,
        index: usize,
        quantity: u32,
    ) -> InventoryResult<usize> {
        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let target = self.registry.get_mut(container)?;
        if target.config().slots_rule().is_some() {
            return Err(InventoryError::validation(format!(
                "stacks in slots container '{container}' cannot be split"
            )));
        }
        let source = stack_at(target, item, index)?;
        if quantity == 0 || quantity >= source.quantity {
            return Err(InventoryError::validation(format!(
                "cannot split {quantity} off a stack of {}",
                source.quantity
            )));
        }
        if let Some(max) = stack_budget(target.config()) {
            if target.stack_count() >= max as usize {
                return Err(InventoryError::validation(format!(
                    "container '{container}' has no free stack for the split"
                )));
            }
        }

        let placement = match target.config().grid_rule() {
            Some(rule) => {
                let size = ctx.meta.size(item)?;
                let at = target
                    .grid()
                    .and_then(|g| g.first_placement(size, rule.allow_rotation))
                    .ok_or_else(|| {
                        InventoryError::validation(format!(
                            "no free grid position in '{container}' for the split stack"
                        ))
                    })?;
                Some((at, size.oriented(at.rotated)))
            }
            None => None,
        };

        let stacks = target.stacks_mut(item);
        stacks[index].quantity -= quantity;
        let new_index = stacks.len();
        stacks.push(ItemStack {
            item_id: item.clone(),
            quantity,
            position: placement.map(|(at, _)| at),
        });
        if let (Some((at, footprint)), Some(grid)) = (placement, target.grid_mut()) {
            grid.occupy(at.x, at.y, footprint, item, new_index);
        }
        tracing::debug!(container = %container, item = %item, index, new_index, quantity, "stack split");
        Ok(new_index)
    }

    /// Move as much of `source` into `destination` as the stack cap allows.
    /// An emptied source stack is removed. Returns the amount moved.
    pub fn merge_stacks(
        &mut self,
        container: &ContainerId,
        source: &StackRef,
        destination: &StackRef,
    ) -> InventoryResult<u32> {
        if source.item_id != destination.item_id {
            return Err(InventoryError::validation(format!(
                "cannot merge a stack of '{}' into a stack of '{}'",
                source.item_id, destination.item_id
            )));
        }
        if source.index == destination.index {
            return Err(InventoryError::validation("cannot merge a stack into itself"));
        }
        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let target = self.registry.get_mut(container)?;
        let item = &source.item_id;
        let available = stack_at(target, item, source.index)?.quantity;
        let room = stack_at(target, item, destination.index)?;
        let cap = target.config().stacking_policy().cap(ctx.meta.stack_limit(item)?);
        let moved = available.min(room.headroom(cap));
        if moved == 0 {
            return Ok(0);
        }

        let stacks = target.stacks_mut(item);
        stacks[source.index].quantity -= moved;
        stacks[destination.index].quantity += moved;
        if stacks[source.index].quantity == 0 {
            target.take_stack(item, source.index);
        }
        tracing::debug!(container = %container, item = %item, moved, "stacks merged");
        Ok(moved)
    }

    /// Repack every item into the fewest stacks its cap allows.
    pub fn consolidate(&mut self, container: &ContainerId) -> InventoryResult<()> {
        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let target = self.registry.get_mut(container)?;
        reject_grid(target, "consolidate")?;
        if target.config().slots_rule().is_some() {
            return Err(InventoryError::validation(format!(
                "consolidate is not available for slots container '{container}'"
            )));
        }

        let policy = target.config().stacking_policy();
        let mut plan = Vec::new();
        for (item, stacks) in target.entries() {
            let cap = u64::from(policy.cap(ctx.meta.stack_limit(item)?));
            let total: u64 = stacks.iter().map(|s| u64::from(s.quantity)).sum();
            plan.push((item.clone(), total, cap));
        }

        target.clear_contents();
        let table = plan
            .into_iter()
            .map(|(item, total, cap)| {
                let mut stacks = Vec::new();
                let mut left = total;
                while left > 0 {
                    let size = left.min(cap);
                    stacks.push(ItemStack::new(item.clone(), size as u32));
                    left -= size;
                }
                (item, stacks)
            })
            .collect();
        target.set_entries(table);
        tracing::debug!(container = %container, stacks = target.stack_count(), "container consolidated");
        Ok(())
    }

    /// Clear a grid container and re-admit everything, largest footprint
    /// first. If anything no longer fits the container is restored as it was.
    pub fn auto_arrange(&mut self, container: &ContainerId) -> InventoryResult<()> {
        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let target = self.registry.get_mut(container)?;
        if target.grid().is_none() {
            return Err(InventoryError::validation(format!(
                "auto_arrange needs a grid container, '{container}' is {}",
                target.mode()
            )));
        }

        let mut order = Vec::new();
        for (item, stacks) in target.entries() {
            let area = ctx.meta.size(item)?.area();
            let total: u64 = stacks.iter().map(|s| u64::from(s.quantity)).sum();
            order.push((area, item.clone(), total));
        }
        order.sort_by(|a, b| b.0.cmp(&a.0));

        let saved = target.clone();
        let config = target.config().clone();
        target.clear_contents();

        if let Err(err) = readmit(ctx, &config, target, &order) {
            *target = saved;
            tracing::warn!(container = %container, error = %err, "auto_arrange rolled back");
            return Err(InventoryError::rolled_back("auto_arrange", err));
        }
        tracing::debug!(container = %container, stacks = target.stack_count(), "container rearranged");
        Ok(())
    }

    /// Reorder the item table with `compare` over per-item totals.
    pub fn sort(
        &mut self,
        container: &ContainerId,
        mut compare: impl FnMut(&ItemTotal, &ItemTotal) -> Ordering,
    ) -> InventoryResult<()> {
        let target = self.registry.get_mut(container)?;
        reject_grid(target, "sort")?;
        let mut totals: Vec<ItemTotal> = target
            .entries()
            .map(|(item, stacks)| ItemTotal {
                item_id: item.clone(),
                quantity: stacks.iter().map(|s| u64::from(s.quantity)).sum(),
                stacks: stacks.len(),
            })
            .collect();
        totals.sort_by(|a, b| compare(a, b));
        let order: Vec<ItemId> = totals.into_iter().map(|t| t.item_id).collect();
        target.reorder(&order);
        Ok(())
    }
}

fn readmit(
    ctx: ModeContext<'_>,
    config: &ModeConfig,
    container: &mut Container,
    order: &[(u64, ItemId, u64)],
) -> InventoryResult<()> {
    for (_, item, total) in order {
        let mut left = *total;
        while left > 0 {
            let chunk = left.min(u64::from(u32::MAX)) as u32;
            let admission = mode::admit(ctx, config, container, item, chunk)?;
            if admission.overflow > 0 {
                return Err(InventoryError::validation(format!(
                    "'{item}' no longer fits in '{}': {} unit(s) left over",
                    container.id(),
                    left - u64::from(admission.accepted)
                )));
            }
            left -= u64::from(chunk);
        }
    }
    Ok(())
}
