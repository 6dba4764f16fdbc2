use stowage_core::{InventoryResult, ItemId};

use super::{Admission, ModeContext};
use crate::config::Stacking;
use crate::container::Container;
use crate::stack::ItemStack;

/// Top up existing stacks of `item` to `cap`, then open new stacks of at
/// most `cap` while `new_stacks` allows (`None` = no limit). Returns the
/// amount placed.
pub(super) fn fill(
    container: &mut Container,
    item: &ItemId,
    quantity: u32,
    cap: u32,
    new_stacks: Option<usize>,
) -> u32 {
    let stacks = container.stacks_mut(item);
    let mut left = quantity;

    for stack in stacks.iter_mut() {
        if left == 0 {
            break;
        }
        let add = stack.headroom(cap).min(left);
        stack.quantity += add;
        left -= add;
    }

    let mut budget = new_stacks;
    while left > 0 && budget != Some(0) {
        let size = left.min(cap);
        stacks.push(ItemStack::new(item.clone(), size));
        left -= size;
        if let Some(b) = budget.as_mut() {
            *b -= 1;
        }
    }

    if stacks.is_empty() {
        container.prune(item);
    }
    quantity - left
}

/// Headroom left in existing stacks of `item` under `cap`.
pub(super) fn existing_headroom(container: &Container, item: &ItemId, cap: u32) -> u64 {
    container
        .stacks(item)
        .iter()
        .map(|s| u64::from(s.headroom(cap)))
        .sum()
}

pub(super) fn admit(
    ctx: ModeContext<'_>,
    stacking: Stacking,
    container: &mut Container,
    item: &ItemId,
    quantity: u32,
) -> InventoryResult<Admission> {
    let cap = stacking.cap(ctx.meta.stack_limit(item)?);
    let placed = fill(container, item, quantity, cap, None);
    Ok(Admission::all(placed))
}
