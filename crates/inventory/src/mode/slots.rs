use std::collections::HashMap;
use std::sync::Arc;

use stowage_core::{InventoryError, InventoryResult, ItemId};

use super::{Admission, ModeContext};
use crate::config::{SlotDef, SlotsRule};
use crate::container::Container;
use crate::outcome::CapacityReason;
use crate::stack::ItemStack;

/// Predicate deciding whether an item may occupy a slot.
pub type SlotFilter = Arc<dyn Fn(&ItemId) -> bool + Send + Sync>;

/// Slot filters registered on an engine, referenced by name from
/// [`SlotDef::filter`] so configurations stay serializable.
#[derive(Clone, Default)]
pub struct SlotFilters {
    filters: HashMap<String, SlotFilter>,
}

impl SlotFilters {
    /// Register (or replace) the filter called `name`.
    pub fn register(&mut self, name: impl Into<String>, filter: SlotFilter) {
        self.filters.insert(name.into(), filter);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Whether `slot` accepts `item`. An unregistered filter rejects
    /// everything.
    pub fn accepts(&self, slot: &SlotDef, item: &ItemId) -> bool {
        match slot.filter.as_deref() {
            None => true,
            Some(name) => self.filters.get(name).is_some_and(|f| f(item)),
        }
    }
}

impl core::fmt::Debug for SlotFilters {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("SlotFilters").field("filters", &names).finish()
    }
}

/// Free slots whose filter accepts `item`, in configuration order.
pub(crate) fn eligible(
    filters: &SlotFilters,
    rule: &SlotsRule,
    container: &Container,
    item: &ItemId,
) -> Vec<String> {
    let Some(state) = container.slots() else {
        return Vec::new();
    };
    state
        .free_slots()
        .filter(|name| rule.get(name).is_some_and(|def| filters.accepts(def, item)))
        .map(str::to_string)
        .collect()
}

/// Each unit takes the next eligible free slot as a stack of one.
pub(super) fn admit(
    ctx: ModeContext<'_>,
    rule: &SlotsRule,
    container: &mut Container,
    item: &ItemId,
    quantity: u32,
) -> InventoryResult<Admission> {
    if container.slots().is_none() {
        return Err(InventoryError::validation(format!(
            "container '{}' has no slots",
            container.id()
        )));
    }
    let open = eligible(ctx.filters, rule, container, item);
    let mut placed = 0;
    for slot in open.iter().take(quantity as usize) {
        if let Some(state) = container.slots_mut() {
            state.set(slot, Some(item.clone()));
        }
        container.stacks_mut(item).push(ItemStack::new(item.clone(), 1));
        placed += 1;
    }
    Ok(Admission::partial(placed, quantity, CapacityReason::NoFreeSlot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModeConfig;
    use crate::metadata::{ItemCatalog, MetadataAdapter};
    use stowage_core::ContainerId;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn filters() -> SlotFilters {
        let mut filters = SlotFilters::default();
        filters.register("rings", Arc::new(|item: &ItemId| item.as_str().ends_with("ring")));
        filters
    }

    #[test]
    fn units_fill_accepting_slots_in_order() {
        let catalog = ItemCatalog::new();
        let filters = filters();
        let ctx = ModeContext {
            meta: MetadataAdapter::new(&catalog),
            filters: &filters,
        };
        let rule = SlotsRule::new()
            .slot("head")
            .filtered_slot("left", "rings")
            .filtered_slot("right", "rings");
        let config = ModeConfig::slots(rule.clone());
        let mut c = Container::new(ContainerId::new("hero").unwrap(), config.clone());
        let ring = id("gold_ring");

        let outcome = crate::mode::admit(ctx, &config, &mut c, &ring, 5).unwrap();
        assert_eq!((outcome.accepted, outcome.overflow), (3, 2));
        assert_eq!(outcome.reason, Some(CapacityReason::NoFreeSlot));
        assert_eq!(c.stacks(&ring).len(), 3);

        let helm = id("helm");
        assert!(eligible(&filters, &rule, &c, &helm).is_empty());
    }

    #[test]
    fn filters_gate_eligibility() {
        let filters = filters();
        let rule = SlotsRule::new()
            .filtered_slot("finger", "rings")
            .filtered_slot("charm", "missing");
        let c = Container::new(ContainerId::new("hero").unwrap(), ModeConfig::slots(rule.clone()));

        assert_eq!(eligible(&filters, &rule, &c, &id("iron_ring")), vec!["finger"]);
        assert!(eligible(&filters, &rule, &c, &id("amulet")).is_empty());
        assert!(filters.contains("rings"));
        assert!(!filters.contains("missing"));
    }
}
