use stowage_core::{InventoryResult, ItemId};

use super::unlimited::fill;
use super::{Admission, Headroom, ModeContext};
use crate::config::{Stacking, WeightRule};
use crate::container::Container;
use crate::metadata::MetadataAdapter;
use crate::outcome::CapacityReason;

/// Tolerance for quotients like 0.3 / 0.1 landing just under an integer.
const EPSILON: f64 = 1e-9;

/// Weight of everything directly held by `container`.
pub(crate) fn contents_weight(meta: MetadataAdapter<'_>, container: &Container) -> InventoryResult<f64> {
    let mut total = 0.0;
    for (item, stacks) in container.entries() {
        let units: u64 = stacks.iter().map(|s| u64::from(s.quantity)).sum();
        total += units as f64 * meta.weight(item)?;
    }
    Ok(total)
}

fn max_units(meta: MetadataAdapter<'_>, rule: &WeightRule, container: &Container, item: &ItemId) -> InventoryResult<u64> {
    let unit = meta.weight(item)?;
    let free = rule.max_weight - contents_weight(meta, container)?;
    if free <= 0.0 {
        return Ok(0);
    }
    Ok((free / unit + EPSILON).floor().min(u64::MAX as f64) as u64)
}

pub(super) fn admit(
    ctx: ModeContext<'_>,
    rule: &WeightRule,
    stacking: Stacking,
    container: &mut Container,
    item: &ItemId,
    quantity: u32,
) -> InventoryResult<Admission> {
    let allowed = max_units(ctx.meta, rule, container, item)?;
    let cap = stacking.cap(ctx.meta.stack_limit(item)?);
    let take = u64::from(quantity).min(allowed) as u32;
    let placed = fill(container, item, take, cap, None);
    Ok(Admission::partial(placed, quantity, CapacityReason::WeightExceeded))
}

pub(super) fn headroom(
    ctx: ModeContext<'_>,
    rule: &WeightRule,
    container: &Container,
    item: &ItemId,
) -> InventoryResult<Headroom> {
    Ok(Headroom {
        max_addable: max_units(ctx.meta, rule, container, item)?,
        limited_by: Some(CapacityReason::WeightExceeded),
    })
}
