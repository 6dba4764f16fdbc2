//! Combined mode: every rule must accept the whole quantity.
//!
//! Each rule is tried on a detached copy of the container (same items, locks
//! and grid state) configured with that rule alone. Probe copies never enter
//! the registry and their admissions fire no events. Once all rules accept,
//! the live container is admitted through its grid rule when it has one,
//! otherwise through the first rule. All rules run under the combined
//! stacking policy so every probe shapes stacks the same way.

use stowage_core::{ContainerId, InventoryError, InventoryResult, ItemId};
use uuid::Uuid;

use super::{Admission, Headroom, ModeContext};
use crate::config::{ModeConfig, Stacking};
use crate::container::Container;
use crate::stack::GridPosition;

fn under_policy(rule: &ModeConfig, policy: Stacking) -> ModeConfig {
    let rule = rule.clone().stacking(policy.allow);
    match policy.max_stack_size {
        Some(max) => rule.max_stack_size(max),
        None => rule,
    }
}

fn probe_id() -> InventoryResult<ContainerId> {
    ContainerId::new(format!("probe-{}", Uuid::now_v7()))
}

// The grid rule must commit whenever there is one: only it writes stack
// positions and grid cells, and every stack in a grid-bearing container needs
// a position for the grid invariant and snapshot round-trips to hold.
fn committing_rule(rules: &[ModeConfig]) -> InventoryResult<&ModeConfig> {
    rules
        .iter()
        .find(|r| matches!(r, ModeConfig::Grid(_)))
        .or_else(|| rules.first())
        .ok_or_else(|| InventoryError::validation("combined mode needs at least one rule"))
}

pub(super) fn admit(
    ctx: ModeContext<'_>,
    rules: &[ModeConfig],
    stacking: Stacking,
    container: &mut Container,
    item: &ItemId,
    quantity: u32,
) -> InventoryResult<Admission> {
    let rules: Vec<ModeConfig> = rules.iter().map(|r| under_policy(r, stacking)).collect();

    for rule in &rules {
        let mut probe = container.probe(probe_id()?, rule.clone());
        let trial = super::admit(ctx, rule, &mut probe, item, quantity)?;
        if trial.overflow > 0 {
            tracing::debug!(
                container = %container.id(),
                item = %item,
                rule = %rule.mode(),
                accepted = trial.accepted,
                "combined rule cannot take the full quantity"
            );
            return Ok(Admission {
                accepted: 0,
                overflow: quantity,
                reason: trial.reason,
            });
        }
    }

    super::admit(ctx, committing_rule(&rules)?, container, item, quantity)
}

/// Explicit placement: the grid rule places, the other rules must have room
/// for the whole quantity.
pub(super) fn admit_at(
    ctx: ModeContext<'_>,
    rules: &[ModeConfig],
    stacking: Stacking,
    container: &mut Container,
    item: &ItemId,
    position: GridPosition,
    quantity: u32,
) -> InventoryResult<Admission> {
    let rules: Vec<ModeConfig> = rules.iter().map(|r| under_policy(r, stacking)).collect();
    let Some(ModeConfig::Grid(grid_rule)) = rules.iter().find(|r| matches!(r, ModeConfig::Grid(_))) else {
        return Err(InventoryError::validation(format!(
            "container '{}' has no grid",
            container.id()
        )));
    };

    for rule in rules.iter().filter(|r| !matches!(r, ModeConfig::Grid(_))) {
        let room = super::headroom(ctx, rule, container, item)?;
        if room.max_addable < u64::from(quantity) {
            return Ok(Admission {
                accepted: 0,
                overflow: quantity,
                reason: room.limited_by,
            });
        }
    }
    super::grid::admit_at(ctx, grid_rule, container, item, position, quantity)
}

/// The smallest headroom across rules, tagged with that rule's limit.
pub(super) fn headroom(
    ctx: ModeContext<'_>,
    rules: &[ModeConfig],
    stacking: Stacking,
    container: &Container,
    item: &ItemId,
) -> InventoryResult<Headroom> {
    let mut tightest: Option<Headroom> = None;
    for rule in rules {
        let h = super::headroom(ctx, &under_policy(rule, stacking), container, item)?;
        if tightest.is_none_or(|t| h.max_addable < t.max_addable) {
            tightest = Some(h);
        }
    }
    tightest.ok_or_else(|| InventoryError::validation("combined mode needs at least one rule"))
}
