use stowage_core::{InventoryResult, ItemId};

use super::unlimited::{existing_headroom, fill};
use super::{Admission, Headroom, ModeContext};
use crate::config::{CountRule, Stacking};
use crate::container::Container;
use crate::outcome::CapacityReason;

fn free_stacks(rule: &CountRule, container: &Container) -> usize {
    (rule.max_count as usize).saturating_sub(container.stack_count())
}

pub(super) fn admit(
    ctx: ModeContext<'_>,
    rule: &CountRule,
    stacking: Stacking,
    container: &mut Container,
    item: &ItemId,
    quantity: u32,
) -> InventoryResult<Admission> {
    let cap = stacking.cap(ctx.meta.stack_limit(item)?);
    let budget = free_stacks(rule, container);
    let placed = fill(container, item, quantity, cap, Some(budget));
    Ok(Admission::partial(placed, quantity, CapacityReason::CountExceeded))
}

pub(super) fn headroom(
    ctx: ModeContext<'_>,
    rule: &CountRule,
    stacking: Stacking,
    container: &Container,
    item: &ItemId,
) -> InventoryResult<Headroom> {
    let cap = stacking.cap(ctx.meta.stack_limit(item)?);
    let fresh = (free_stacks(rule, container) as u64).saturating_mul(u64::from(cap));
    Ok(Headroom {
        max_addable: existing_headroom(container, item, cap).saturating_add(fresh),
        limited_by: Some(CapacityReason::CountExceeded),
    })
}
