use stowage_core::{InventoryError, InventoryResult, ItemId};

use super::unlimited::{existing_headroom, fill};
use super::{Admission, Headroom, ModeContext};
use crate::config::{GridRule, Stacking};
use crate::container::Container;
use crate::outcome::CapacityReason;
use crate::stack::{GridPosition, ItemStack};

fn stacking(rule: &GridRule) -> Stacking {
    Stacking {
        allow: rule.allow_stacking,
        max_stack_size: rule.max_stack_size,
    }
}

fn missing_grid(container: &Container) -> InventoryError {
    InventoryError::validation(format!("container '{}' has no grid", container.id()))
}

/// Auto-placement: top up existing stacks, then claim the first free
/// placement for each new stack, searching again after every placement.
pub(super) fn admit(
    ctx: ModeContext<'_>,
    rule: &GridRule,
    container: &mut Container,
    item: &ItemId,
    quantity: u32,
) -> InventoryResult<Admission> {
    let size = ctx.meta.size(item)?;
    let cap = stacking(rule).cap(ctx.meta.stack_limit(item)?);
    if container.grid().is_none() {
        return Err(missing_grid(container));
    }

    let mut left = quantity - fill(container, item, quantity, cap, Some(0));
    while left > 0 {
        let Some(at) = container
            .grid()
            .and_then(|g| g.first_placement(size, rule.allow_rotation))
        else {
            break;
        };
        let amount = left.min(cap);
        let stacks = container.stacks_mut(item);
        let index = stacks.len();
        stacks.push(ItemStack::at(item.clone(), amount, at));
        if let Some(grid) = container.grid_mut() {
            grid.occupy(at.x, at.y, size.oriented(at.rotated), item, index);
        }
        left -= amount;
    }

    Ok(Admission::partial(quantity - left, quantity, CapacityReason::GridFull))
}

/// Placement at an explicit position. A stack of the same item anchored at
/// `position` is topped up in place when it has room for the whole quantity;
/// otherwise the footprint must be empty and a new stack is opened there.
pub(super) fn admit_at(
    ctx: ModeContext<'_>,
    rule: &GridRule,
    container: &mut Container,
    item: &ItemId,
    position: GridPosition,
    quantity: u32,
) -> InventoryResult<Admission> {
    let size = ctx.meta.size(item)?;
    let cap = stacking(rule).cap(ctx.meta.stack_limit(item)?);
    if position.rotated && !rule.allow_rotation {
        return Err(InventoryError::validation(format!(
            "container '{}' does not allow rotated placements",
            container.id()
        )));
    }
    let footprint = size.oriented(position.rotated);
    let grid = container.grid().ok_or_else(|| missing_grid(container))?;
    if !grid.in_bounds(position.x, position.y, footprint) {
        return Err(InventoryError::validation(format!(
            "{}x{} footprint at ({}, {}) is outside the {}x{} grid of '{}'",
            footprint.width,
            footprint.height,
            position.x,
            position.y,
            grid.width(),
            grid.height(),
            container.id()
        )));
    }
    if quantity == 0 {
        return Ok(Admission::all(0));
    }

    let anchored = grid
        .cell(position.x, position.y)
        .filter(|cell| cell.origin && cell.item_id == *item)
        .map(|cell| cell.stack_index);
    if let Some(index) = anchored {
        if rule.allow_stacking {
            let stacks = container.stacks_mut(item);
            if let Some(stack) = stacks.get_mut(index) {
                if stack.headroom(cap) >= quantity {
                    stack.quantity += quantity;
                    return Ok(Admission::all(quantity));
                }
            }
        }
        return Ok(Admission::rejected(quantity, CapacityReason::PositionOccupied));
    }
    if !grid.is_free(position.x, position.y, footprint) {
        return Ok(Admission::rejected(quantity, CapacityReason::PositionOccupied));
    }

    let amount = quantity.min(cap);
    let stacks = container.stacks_mut(item);
    let index = stacks.len();
    stacks.push(ItemStack::at(item.clone(), amount, position));
    if let Some(grid) = container.grid_mut() {
        grid.occupy(position.x, position.y, footprint, item, index);
    }
    Ok(Admission::partial(amount, quantity, CapacityReason::StackFull))
}

pub(super) fn headroom(
    ctx: ModeContext<'_>,
    rule: &GridRule,
    container: &Container,
    item: &ItemId,
) -> InventoryResult<Headroom> {
    let size = ctx.meta.size(item)?;
    let cap = stacking(rule).cap(ctx.meta.stack_limit(item)?);
    let grid = container.grid().ok_or_else(|| missing_grid(container))?;

    let fresh = grid.count_placements(size, rule.allow_rotation);

    Ok(Headroom {
        max_addable: existing_headroom(container, item, cap).saturating_add(fresh.saturating_mul(u64::from(cap))),
        limited_by: Some(CapacityReason::GridFull),
    })
}
