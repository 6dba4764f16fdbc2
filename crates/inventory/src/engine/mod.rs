//! The engine facade: every public inventory operation.
//!
//! Operations validate before they mutate, then publish events once the
//! registry is consistent again. Capacity shortfalls come back as outcomes;
//! misuse comes back as [`InventoryError`].

mod maintenance;
mod query;
mod slots;
mod snapshot;
mod transaction;

use stowage_core::{ContainerId, InventoryError, InventoryResult, ItemId};
use stowage_events::{EventBus, InMemoryEventBus, ListenerId};

use crate::config::ModeConfig;
use crate::container::Container;
use crate::event::{
    ContainerFull, ContainerRemoved, EventKind, InventoryEvent, ItemAdded, ItemRemoved, ItemTransferred,
};
use crate::limits::EngineLimits;
use crate::metadata::ItemMetadata;
use crate::mode::{self, Admission, ModeContext, SlotFilters};
use crate::nesting::check_nesting;
use crate::outcome::{AddOutcome, TransferOutcome};
use crate::registry::Registry;
use crate::stack::GridPosition;

/// An independent inventory world: containers, item metadata, slot filters
/// and listeners.
pub struct Engine {
    registry: Registry,
    metadata: Box<dyn ItemMetadata>,
    filters: SlotFilters,
    bus: InMemoryEventBus<InventoryEvent>,
    limits: EngineLimits,
}

impl core::fmt::Debug for Engine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Engine")
            .field("containers", &self.registry.len())
            .field("generation", &self.registry.generation())
            .field("filters", &self.filters)
            .field("bus", &self.bus)
            .field("limits", &self.limits)
            .finish()
    }
}

impl Engine {
    pub fn new(metadata: impl ItemMetadata + 'static) -> Self {
        Self::with_limits(metadata, EngineLimits::default())
    }

    pub fn with_limits(metadata: impl ItemMetadata + 'static, limits: EngineLimits) -> Self {
        Self {
            registry: Registry::new(),
            metadata: Box::new(metadata),
            filters: SlotFilters::default(),
            bus: InMemoryEventBus::new(),
            limits,
        }
    }

    pub fn limits(&self) -> &EngineLimits {
        &self.limits
    }

    /// Read-only view of every container.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn container(&self, id: &ContainerId) -> InventoryResult<&Container> {
        self.registry.get(id)
    }

    /// Register a named slot filter that slot definitions can reference.
    pub fn register_slot_filter(
        &mut self,
        name: impl Into<String>,
        filter: impl Fn(&ItemId) -> bool + Send + Sync + 'static,
    ) {
        self.filters.register(name, std::sync::Arc::new(filter));
    }

    // ---- events ----

    /// Subscribe to one kind of event.
    pub fn on(&mut self, kind: EventKind, listener: impl FnMut(&InventoryEvent) + Send + 'static) -> ListenerId {
        self.bus.subscribe(Some(kind.event_type()), Box::new(listener))
    }

    /// Subscribe to every event.
    pub fn on_any(&mut self, listener: impl FnMut(&InventoryEvent) + Send + 'static) -> ListenerId {
        self.bus.subscribe(None, Box::new(listener))
    }

    /// Unsubscribe. Returns `false` for an unknown id.
    pub fn off(&mut self, id: ListenerId) -> bool {
        self.bus.unsubscribe(id)
    }

    fn emit(&mut self, event: InventoryEvent) {
        self.bus.publish(&event);
    }

    // ---- container lifecycle ----

    pub fn create_container(&mut self, id: ContainerId, config: ModeConfig) -> InventoryResult<()> {
        let filters = &self.filters;
        config.validate(&self.limits, &|name| filters.contains(name))?;
        let mode = config.mode();
        self.registry.insert(Container::new(id.clone(), config))?;
        tracing::info!(container = %id, %mode, "container created");
        Ok(())
    }

    /// Remove a container. Containers nested inside it stay registered.
    pub fn remove_container(&mut self, id: &ContainerId) -> InventoryResult<()> {
        let removed = self.registry.remove(id)?;
        tracing::info!(container = %id, stacks = removed.stack_count(), "container removed");
        self.emit(InventoryEvent::ContainerRemoved(ContainerRemoved {
            container_id: id.clone(),
        }));
        Ok(())
    }

    /// Container ids in creation order.
    pub fn list_containers(&self) -> impl Iterator<Item = &ContainerId> {
        self.registry.ids()
    }

    // ---- locks ----

    /// Lock `item` in `container`. Returns `false` if it was already locked.
    pub fn lock_item(&mut self, container: &ContainerId, item: &ItemId) -> InventoryResult<bool> {
        Ok(self.registry.get_mut(container)?.lock(item.clone()))
    }

    /// Returns `false` if the item was not locked.
    pub fn unlock_item(&mut self, container: &ContainerId, item: &ItemId) -> InventoryResult<bool> {
        Ok(self.registry.get_mut(container)?.unlock(item))
    }

    pub fn is_locked(&self, container: &ContainerId, item: &ItemId) -> InventoryResult<bool> {
        Ok(self.registry.get(container)?.is_locked(item))
    }

    // ---- admission / eviction ----

    /// Add up to `quantity` units, reporting how many fit.
    pub fn add_item(&mut self, container: &ContainerId, item: &ItemId, quantity: u32) -> InventoryResult<AddOutcome> {
        self.registry.get(container)?;
        if quantity == 0 {
            return Ok(AddOutcome::nothing());
        }
        check_nesting(&self.registry, container, item)?;

        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let target = self.registry.get_mut(container)?;
        let config = target.config().clone();
        let admission = mode::admit(ctx, &config, target, item, quantity)?;
        let total = target.quantity(item);
        Ok(self.report_admission(container, item, admission, total))
    }

    /// Add units at an explicit grid position.
    pub fn add_item_at(
        &mut self,
        container: &ContainerId,
        item: &ItemId,
        position: GridPosition,
        quantity: u32,
    ) -> InventoryResult<AddOutcome> {
        self.registry.get(container)?;
        if quantity == 0 {
            return Ok(AddOutcome::nothing());
        }
        check_nesting(&self.registry, container, item)?;

        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let target = self.registry.get_mut(container)?;
        let config = target.config().clone();
        let admission = mode::admit_at(ctx, &config, target, item, position, quantity)?;
        let total = target.quantity(item);
        Ok(self.report_admission(container, item, admission, total))
    }

    fn report_admission(
        &mut self,
        container: &ContainerId,
        item: &ItemId,
        admission: Admission,
        new_total: u64,
    ) -> AddOutcome {
        if admission.accepted > 0 {
            tracing::debug!(container = %container, item = %item, added = admission.accepted, new_total, "items admitted");
            self.emit(InventoryEvent::ItemAdded(ItemAdded {
                container_id: container.clone(),
                item_id: item.clone(),
                quantity: admission.accepted,
                new_total,
            }));
        }
        if let (true, Some(reason)) = (admission.overflow > 0, admission.reason) {
            tracing::debug!(container = %container, item = %item, overflow = admission.overflow, %reason, "admission fell short");
            self.emit(InventoryEvent::ContainerFull(ContainerFull {
                container_id: container.clone(),
                item_id: item.clone(),
                overflow: admission.overflow,
                reason,
            }));
        }
        AddOutcome {
            success: admission.overflow == 0,
            added: admission.accepted,
            overflow: admission.overflow,
            reason: admission.reason,
        }
    }

    /// Remove up to `quantity` units, newest stacks first. Returns the
    /// amount removed; an absent item removes nothing.
    pub fn remove_item(&mut self, container: &ContainerId, item: &ItemId, quantity: u32) -> InventoryResult<u32> {
        let target = self.registry.get_mut(container)?;
        if target.is_locked(item) {
            return Err(locked(container, item));
        }
        let removed = target.remove_units(item, quantity);
        let new_total = target.quantity(item);
        if removed > 0 {
            tracing::debug!(container = %container, item = %item, removed, new_total, "items removed");
            self.emit(InventoryEvent::ItemRemoved(ItemRemoved {
                container_id: container.clone(),
                item_id: item.clone(),
                quantity: removed,
                new_total,
            }));
        }
        Ok(removed)
    }

    /// Move up to `quantity` units from one container to another. Whatever
    /// the destination cannot take, or the source does not hold, is
    /// reported as overflow and stays put.
    pub fn transfer(
        &mut self,
        from: &ContainerId,
        to: &ContainerId,
        item: &ItemId,
        quantity: u32,
    ) -> InventoryResult<TransferOutcome> {
        if from == to {
            return Err(InventoryError::validation(format!(
                "cannot transfer from '{from}' to itself"
            )));
        }
        let source = self.registry.get(from)?;
        self.registry.get(to)?;
        if source.is_locked(item) {
            return Err(locked(from, item));
        }
        check_nesting(&self.registry, to, item)?;

        let available = source.quantity(item).min(u64::from(quantity)) as u32;
        if available == 0 {
            return Ok(TransferOutcome {
                transferred: 0,
                overflow: quantity,
                reason: None,
            });
        }

        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let destination = self.registry.get_mut(to)?;
        let config = destination.config().clone();
        let admission = mode::admit(ctx, &config, destination, item, available)?;
        let dest_total = destination.quantity(item);

        let moved = admission.accepted;
        let source = self.registry.get_mut(from)?;
        let removed = source.remove_units(item, moved);
        debug_assert_eq!(removed, moved);
        let source_total = source.quantity(item);

        self.report_admission(to, item, admission, dest_total);
        if moved > 0 {
            self.emit(InventoryEvent::ItemRemoved(ItemRemoved {
                container_id: from.clone(),
                item_id: item.clone(),
                quantity: moved,
                new_total: source_total,
            }));
            self.emit(InventoryEvent::ItemTransferred(ItemTransferred {
                from: from.clone(),
                to: to.clone(),
                item_id: item.clone(),
                quantity: moved,
            }));
        }
        tracing::debug!(from = %from, to = %to, item = %item, moved, requested = quantity, "transfer finished");

        Ok(TransferOutcome {
            transferred: moved,
            overflow: quantity - moved,
            reason: admission.reason,
        })
    }
}

fn locked(container: &ContainerId, item: &ItemId) -> InventoryError {
    InventoryError::validation(format!("item '{item}' is locked in container '{container}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotsRule;
    use crate::metadata::{ItemCatalog, ItemSpec};
    use crate::outcome::CapacityReason;
    use std::sync::{Arc, Mutex};

    fn cid(s: &str) -> ContainerId {
        ContainerId::new(s).unwrap()
    }

    fn iid(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn engine() -> Engine {
        Engine::new(
            ItemCatalog::new()
                .with_item(iid("heavy"), ItemSpec::new().weight(10.0))
                .with_item(iid("potion"), ItemSpec::new().stack_limit(5)),
        )
    }

    fn record(engine: &mut Engine) -> Arc<Mutex<Vec<InventoryEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        engine.on_any(move |e| sink.lock().unwrap().push(e.clone()));
        seen
    }

    #[test]
    fn weight_shortfall_reports_overflow_and_fires_both_events() {
        let mut engine = engine();
        let events = record(&mut engine);
        engine.create_container(cid("c1"), ModeConfig::weight(25.0)).unwrap();

        let outcome = engine.add_item(&cid("c1"), &iid("heavy"), 5).unwrap();
        assert_eq!(
            outcome,
            AddOutcome {
                success: false,
                added: 2,
                overflow: 3,
                reason: Some(CapacityReason::WeightExceeded),
            }
        );

        let kinds: Vec<EventKind> = events.lock().unwrap().iter().map(InventoryEvent::kind).collect();
        assert_eq!(kinds, vec![EventKind::ItemAdded, EventKind::ContainerFull]);
    }

    #[test]
    fn zero_quantity_is_a_silent_success() {
        let mut engine = engine();
        let events = record(&mut engine);
        engine.create_container(cid("bag"), ModeConfig::count(1)).unwrap();
        // Even a self-nesting item id is not inspected for a no-op.
        let outcome = engine.add_item(&cid("bag"), &iid("bag"), 0).unwrap();
        assert!(outcome.success);
        assert!(events.lock().unwrap().is_empty());
        assert!(engine.add_item(&cid("missing"), &iid("x"), 0).is_err());
    }

    #[test]
    fn zero_quantity_at_a_position_is_also_a_silent_success() {
        let mut engine = engine();
        let events = record(&mut engine);
        engine.create_container(cid("bag"), ModeConfig::grid(2, 2)).unwrap();
        let outcome = engine
            .add_item_at(&cid("bag"), &iid("bag"), GridPosition::new(0, 0), 0)
            .unwrap();
        assert_eq!(outcome, AddOutcome::nothing());
        assert!(events.lock().unwrap().is_empty());
        assert!(engine.is_empty(&cid("bag")).unwrap());
        assert!(
            engine
                .add_item_at(&cid("missing"), &iid("x"), GridPosition::new(0, 0), 0)
                .is_err()
        );
        // A real quantity still goes through the nesting check.
        assert!(
            engine
                .add_item_at(&cid("bag"), &iid("bag"), GridPosition::new(0, 0), 1)
                .unwrap_err()
                .is_validation()
        );
    }

    #[test]
    fn grid_capacity_query_scales_to_large_grids() {
        let mut engine = engine();
        engine
            .create_container(cid("hall"), ModeConfig::grid(300, 300).stacking(false))
            .unwrap();
        let check = engine.can_add(&cid("hall"), &iid("pebble"), 1).unwrap();
        assert!(check.can_add);
        assert_eq!(check.max_addable, 300 * 300);

        engine
            .add_item_at(&cid("hall"), &iid("pebble"), GridPosition::new(299, 299), 1)
            .unwrap();
        let check = engine.can_add(&cid("hall"), &iid("pebble"), 1).unwrap();
        assert_eq!(check.max_addable, 300 * 300 - 1);
    }

    #[test]
    fn duplicate_and_invalid_containers_are_rejected() {
        let mut engine = engine();
        engine.create_container(cid("a"), ModeConfig::unlimited()).unwrap();
        assert!(engine.create_container(cid("a"), ModeConfig::unlimited()).is_err());
        let err = engine.create_container(cid("g"), ModeConfig::grid(100_000, 10)).unwrap_err();
        assert!(err.to_string().contains("per-axis limit"));
        let err = engine
            .create_container(cid("s"), ModeConfig::slots(SlotsRule::new().filtered_slot("hand", "weapons")))
            .unwrap_err();
        assert!(err.is_validation());

        engine.register_slot_filter("weapons", |item| item.as_str().starts_with("sword"));
        engine
            .create_container(cid("s"), ModeConfig::slots(SlotsRule::new().filtered_slot("hand", "weapons")))
            .unwrap();
        let ids: Vec<&str> = engine.list_containers().map(|id| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "s"]);
    }

    #[test]
    fn locked_items_cannot_leave() {
        let mut engine = engine();
        engine.create_container(cid("a"), ModeConfig::unlimited()).unwrap();
        engine.create_container(cid("b"), ModeConfig::unlimited()).unwrap();
        engine.add_item(&cid("a"), &iid("potion"), 3).unwrap();
        assert!(engine.lock_item(&cid("a"), &iid("potion")).unwrap());

        assert!(engine.remove_item(&cid("a"), &iid("potion"), 1).is_err());
        assert!(engine.transfer(&cid("a"), &cid("b"), &iid("potion"), 1).is_err());
        assert_eq!(engine.container(&cid("a")).unwrap().quantity(&iid("potion")), 3);

        assert!(engine.unlock_item(&cid("a"), &iid("potion")).unwrap());
        assert_eq!(engine.remove_item(&cid("a"), &iid("potion"), 10).unwrap(), 3);
        assert_eq!(engine.remove_item(&cid("a"), &iid("potion"), 1).unwrap(), 0);
    }

    #[test]
    fn transfer_moves_what_fits_and_conserves_quantity() {
        let mut engine = engine();
        engine.create_container(cid("big"), ModeConfig::unlimited()).unwrap();
        engine.create_container(cid("small"), ModeConfig::count(1)).unwrap();
        engine.add_item(&cid("big"), &iid("potion"), 12).unwrap();
        let events = record(&mut engine);

        let outcome = engine.transfer(&cid("big"), &cid("small"), &iid("potion"), 8).unwrap();
        assert_eq!((outcome.transferred, outcome.overflow), (5, 3));
        assert_eq!(outcome.reason, Some(CapacityReason::CountExceeded));

        let big = engine.container(&cid("big")).unwrap().quantity(&iid("potion"));
        let small = engine.container(&cid("small")).unwrap().quantity(&iid("potion"));
        assert_eq!((big, small), (7, 5));

        let kinds: Vec<EventKind> = events.lock().unwrap().iter().map(InventoryEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::ItemAdded,
                EventKind::ContainerFull,
                EventKind::ItemRemoved,
                EventKind::ItemTransferred
            ]
        );

        assert!(engine.transfer(&cid("big"), &cid("big"), &iid("potion"), 1).is_err());
        let none = engine.transfer(&cid("small"), &cid("big"), &iid("heavy"), 4).unwrap();
        assert_eq!((none.transferred, none.overflow), (0, 4));
    }

    #[test]
    fn removing_a_container_keeps_nested_ones() {
        let mut engine = engine();
        let events = record(&mut engine);
        engine.create_container(cid("chest"), ModeConfig::unlimited()).unwrap();
        engine.create_container(cid("pouch"), ModeConfig::unlimited()).unwrap();
        engine.add_item(&cid("chest"), &iid("pouch"), 1).unwrap();

        engine.remove_container(&cid("chest")).unwrap();
        assert!(engine.container(&cid("pouch")).is_ok());
        assert!(engine.remove_container(&cid("chest")).is_err());
        assert_eq!(events.lock().unwrap().last().map(InventoryEvent::kind), Some(EventKind::ContainerRemoved));
    }

    #[test]
    fn listeners_filter_by_kind_and_can_be_removed() {
        let mut engine = engine();
        engine.create_container(cid("bag"), ModeConfig::unlimited()).unwrap();
        let added = Arc::new(Mutex::new(0u64));
        let sink = added.clone();
        let id = engine.on(EventKind::ItemAdded, move |e| {
            if let InventoryEvent::ItemAdded(a) = e {
                *sink.lock().unwrap() += u64::from(a.quantity);
            }
        });

        engine.add_item(&cid("bag"), &iid("potion"), 4).unwrap();
        engine.remove_item(&cid("bag"), &iid("potion"), 1).unwrap();
        assert!(engine.off(id));
        engine.add_item(&cid("bag"), &iid("potion"), 4).unwrap();

        assert_eq!(*added.lock().unwrap(), 4);
        assert!(!engine.off(id));
    }
}
