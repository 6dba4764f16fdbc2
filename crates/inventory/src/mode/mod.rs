//! Mode strategies: admission and capacity queries per capacity discipline.
//!
//! Strategies are pure functions over a [`Container`]; the engine owns
//! notifications. Each entry point takes the rule to apply separately from
//! the container so combined mode can evaluate one container under several
//! rules. Metadata is validated before a strategy mutates anything.

mod combined;
mod count;
mod grid;
mod slots;
mod unlimited;
mod weight;

pub use slots::{SlotFilter, SlotFilters};

pub(crate) use weight::contents_weight;

use stowage_core::{InventoryError, InventoryResult, ItemId};

use crate::config::ModeConfig;
use crate::container::Container;
use crate::metadata::{ItemMetadata, MetadataAdapter};
use crate::outcome::{CapacityReason, RemainingCapacity, UNBOUNDED};
use crate::stack::GridPosition;

/// Collaborators every strategy may consult.
#[derive(Copy, Clone)]
pub(crate) struct ModeContext<'a> {
    pub(crate) meta: MetadataAdapter<'a>,
    pub(crate) filters: &'a SlotFilters,
}

impl<'a> ModeContext<'a> {
    pub(crate) fn new(metadata: &'a dyn ItemMetadata, filters: &'a SlotFilters) -> Self {
        Self {
            meta: MetadataAdapter::new(metadata),
            filters,
        }
    }
}

/// What a strategy did with an offered quantity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Admission {
    pub(crate) accepted: u32,
    pub(crate) overflow: u32,
    pub(crate) reason: Option<CapacityReason>,
}

impl Admission {
    /// `accepted` out of `requested`, tagging any shortfall with `reason`.
    pub(crate) fn partial(accepted: u32, requested: u32, reason: CapacityReason) -> Self {
        let overflow = requested - accepted;
        Self {
            accepted,
            overflow,
            reason: (overflow > 0).then_some(reason),
        }
    }

    pub(crate) fn all(requested: u32) -> Self {
        Self {
            accepted: requested,
            overflow: 0,
            reason: None,
        }
    }

    pub(crate) fn rejected(requested: u32, reason: CapacityReason) -> Self {
        Self {
            accepted: 0,
            overflow: requested,
            reason: Some(reason),
        }
    }
}

/// Upper bound on what a container accepts right now, and what limits it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Headroom {
    pub(crate) max_addable: u64,
    pub(crate) limited_by: Option<CapacityReason>,
}

/// Offer `quantity` units of `item` to `container` under `rule`.
pub(crate) fn admit(
    ctx: ModeContext<'_>,
    rule: &ModeConfig,
    container: &mut Container,
    item: &ItemId,
    quantity: u32,
) -> InventoryResult<Admission> {
    if quantity == 0 {
        return Ok(Admission::all(0));
    }
    let stacking = rule.stacking_policy();
    match rule {
        ModeConfig::Unlimited(_) => unlimited::admit(ctx, stacking, container, item, quantity),
        ModeConfig::Count(r) => count::admit(ctx, r, stacking, container, item, quantity),
        ModeConfig::Weight(r) => weight::admit(ctx, r, stacking, container, item, quantity),
        ModeConfig::Grid(r) => grid::admit(ctx, r, container, item, quantity),
        ModeConfig::Slots(r) => slots::admit(ctx, r, container, item, quantity),
        ModeConfig::Combined(c) => combined::admit(ctx, &c.rules, stacking, container, item, quantity),
    }
}

/// Offer `quantity` units of `item` at an explicit grid position.
pub(crate) fn admit_at(
    ctx: ModeContext<'_>,
    rule: &ModeConfig,
    container: &mut Container,
    item: &ItemId,
    position: GridPosition,
    quantity: u32,
) -> InventoryResult<Admission> {
    match rule {
        ModeConfig::Grid(r) => grid::admit_at(ctx, r, container, item, position, quantity),
        ModeConfig::Combined(c) => {
            combined::admit_at(ctx, &c.rules, rule.stacking_policy(), container, item, position, quantity)
        }
        _ => Err(InventoryError::validation(format!(
            "container '{}' is in {} mode and has no grid",
            container.id(),
            rule.mode()
        ))),
    }
}

/// How many units of `item` `container` would accept under `rule`.
pub(crate) fn headroom(
    ctx: ModeContext<'_>,
    rule: &ModeConfig,
    container: &Container,
    item: &ItemId,
) -> InventoryResult<Headroom> {
    let stacking = rule.stacking_policy();
    match rule {
        ModeConfig::Unlimited(_) => {
            // Still surface bad metadata.
            ctx.meta.stack_limit(item)?;
            Ok(Headroom {
                max_addable: UNBOUNDED,
                limited_by: None,
            })
        }
        ModeConfig::Count(r) => count::headroom(ctx, r, stacking, container, item),
        ModeConfig::Weight(r) => weight::headroom(ctx, r, container, item),
        ModeConfig::Grid(r) => grid::headroom(ctx, r, container, item),
        ModeConfig::Slots(r) => Ok(Headroom {
            max_addable: slots::eligible(ctx.filters, r, container, item).len() as u64,
            limited_by: Some(CapacityReason::NoFreeSlot),
        }),
        ModeConfig::Combined(c) => combined::headroom(ctx, &c.rules, stacking, container, item),
    }
}

/// Spare capacity of `container` under `rule`.
pub(crate) fn remaining(
    ctx: ModeContext<'_>,
    rule: &ModeConfig,
    container: &Container,
) -> InventoryResult<RemainingCapacity> {
    Ok(match rule {
        ModeConfig::Unlimited(_) => RemainingCapacity::Unlimited,
        ModeConfig::Count(r) => RemainingCapacity::Count {
            free_stacks: u64::from(r.max_count).saturating_sub(container.stack_count() as u64),
        },
        ModeConfig::Weight(r) => RemainingCapacity::Weight {
            remaining_weight: (r.max_weight - weight::contents_weight(ctx.meta, container)?).max(0.0),
        },
        ModeConfig::Grid(_) => RemainingCapacity::Grid {
            free_cells: container.grid().map_or(0, |g| g.free_cells() as u64),
        },
        ModeConfig::Slots(_) => RemainingCapacity::Slots {
            free_slots: container
                .slots()
                .map(|s| s.free_slots().map(str::to_string).collect())
                .unwrap_or_default(),
        },
        ModeConfig::Combined(c) => RemainingCapacity::Combined {
            rules: c
                .rules
                .iter()
                .map(|rule| remaining(ctx, rule, container))
                .collect::<InventoryResult<_>>()?,
        },
    })
}
