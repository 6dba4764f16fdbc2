//! Equipment slots of slots-mode containers.

use stowage_core::{ContainerId, InventoryError, InventoryResult, ItemId};

use super::{Engine, locked};
use crate::config::SlotDef;
use crate::container::Container;
use crate::event::{InventoryEvent, ItemAdded, ItemRemoved, SlotChanged};
use crate::nesting::check_nesting;
use crate::stack::ItemStack;

fn slot_def<'a>(container: &'a Container, slot: &str) -> InventoryResult<&'a SlotDef> {
    let rule = container.config().slots_rule().ok_or_else(|| {
        InventoryError::validation(format!("container '{}' has no slots", container.id()))
    })?;
    rule.get(slot).ok_or_else(|| {
        InventoryError::validation(format!(
            "container '{}' has no slot '{slot}'",
            container.id()
        ))
    })
}

fn occupant<'a>(container: &'a Container, slot: &str) -> Option<&'a ItemId> {
    container.slots().and_then(|s| s.get(slot)).flatten()
}

impl Engine {
    /// Put one unit of `item` in `slot`, returning the item it displaced.
    pub fn set_slot(&mut self, container: &ContainerId, slot: &str, item: &ItemId) -> InventoryResult<Option<ItemId>> {
        let target = self.registry.get(container)?;
        let def = slot_def(target, slot)?;
        if !self.filters.accepts(def, item) {
            return Err(InventoryError::validation(format!(
                "slot '{slot}' of '{container}' does not accept '{item}'"
            )));
        }
        let previous = occupant(target, slot).cloned();
        if previous.as_ref() == Some(item) {
            return Ok(previous);
        }
        if let Some(old) = previous.as_ref().filter(|old| target.is_locked(old)) {
            return Err(locked(container, old));
        }
        check_nesting(&self.registry, container, item)?;

        let target = self.registry.get_mut(container)?;
        let old = swap_slot(target, slot, Some(item));
        let new_total = target.quantity(item);
        let old_total = old.as_ref().map(|o| target.quantity(o));

        tracing::debug!(container = %container, slot, item = %item, "slot equipped");
        if let (Some(old), Some(total)) = (old.as_ref(), old_total) {
            self.emit(InventoryEvent::ItemRemoved(ItemRemoved {
                container_id: container.clone(),
                item_id: old.clone(),
                quantity: 1,
                new_total: total,
            }));
        }
        self.emit(InventoryEvent::ItemAdded(ItemAdded {
            container_id: container.clone(),
            item_id: item.clone(),
            quantity: 1,
            new_total,
        }));
        self.emit(InventoryEvent::SlotChanged(SlotChanged {
            container_id: container.clone(),
            slot: slot.to_string(),
            old_item: old.clone(),
            new_item: Some(item.clone()),
        }));
        Ok(old)
    }

    pub fn get_slot(&self, container: &ContainerId, slot: &str) -> InventoryResult<Option<&ItemId>> {
        let target = self.registry.get(container)?;
        slot_def(target, slot)?;
        Ok(occupant(target, slot))
    }

    /// Every slot with its occupant, in configuration order.
    pub fn all_slots(&self, container: &ContainerId) -> InventoryResult<&[(String, Option<ItemId>)]> {
        let target = self.registry.get(container)?;
        target.slots().map(|s| s.assignments()).ok_or_else(|| {
            InventoryError::validation(format!("container '{container}' has no slots"))
        })
    }

    /// Empty `slot`, returning what it held.
    pub fn clear_slot(&mut self, container: &ContainerId, slot: &str) -> InventoryResult<Option<ItemId>> {
        let target = self.registry.get(container)?;
        slot_def(target, slot)?;
        let Some(current) = occupant(target, slot).cloned() else {
            return Ok(None);
        };
        if target.is_locked(&current) {
            return Err(locked(container, &current));
        }

        let target = self.registry.get_mut(container)?;
        swap_slot(target, slot, None);
        let new_total = target.quantity(&current);

        tracing::debug!(container = %container, slot, item = %current, "slot cleared");
        self.emit(InventoryEvent::ItemRemoved(ItemRemoved {
            container_id: container.clone(),
            item_id: current.clone(),
            quantity: 1,
            new_total,
        }));
        self.emit(InventoryEvent::SlotChanged(SlotChanged {
            container_id: container.clone(),
            slot: slot.to_string(),
            old_item: Some(current.clone()),
            new_item: None,
        }));
        Ok(Some(current))
    }

    /// Whether `set_slot` would succeed, without changing anything.
    pub fn can_equip(&self, container: &ContainerId, slot: &str, item: &ItemId) -> InventoryResult<bool> {
        let target = self.registry.get(container)?;
        let Ok(def) = slot_def(target, slot) else {
            return Ok(false);
        };
        if !self.filters.accepts(def, item) {
            return Ok(false);
        }
        if occupant(target, slot).is_some_and(|old| old != item && target.is_locked(old)) {
            return Ok(false);
        }
        Ok(check_nesting(&self.registry, container, item).is_ok())
    }
}

/// Reassign `slot` and keep the stack table in step: the displaced item
/// loses one single-unit stack, the new item gains one.
fn swap_slot(container: &mut Container, slot: &str, item: Option<&ItemId>) -> Option<ItemId> {
    let old = container.slots_mut().and_then(|s| s.set(slot, item.cloned()));
    if let Some(old) = old.as_ref() {
        let last = container.stacks(old).len().checked_sub(1);
        if let Some(index) = last {
            container.take_stack(old, index);
        }
    }
    if let Some(item) = item {
        container.stacks_mut(item).push(ItemStack::new(item.clone(), 1));
    }
    old
}

#[cfg(test)]
mod tests {
    use crate::config::{ModeConfig, SlotsRule};
    use crate::engine::Engine;
    use crate::event::{EventKind, InventoryEvent};
    use crate::metadata::ItemCatalog;
    use std::sync::{Arc, Mutex};
    use stowage_core::{ContainerId, ItemId};

    fn cid(s: &str) -> ContainerId {
        ContainerId::new(s).unwrap()
    }

    fn iid(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn hero() -> Engine {
        let mut engine = Engine::new(ItemCatalog::new());
        engine.register_slot_filter("weapons", |item| item.as_str().starts_with("sword"));
        engine
            .create_container(
                cid("hero"),
                ModeConfig::slots(SlotsRule::new().slot("head").filtered_slot("hand", "weapons")),
            )
            .unwrap();
        engine
    }

    #[test]
    fn set_slot_returns_the_displaced_item() {
        let mut engine = hero();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        engine.on(EventKind::SlotChanged, move |e| sink.lock().unwrap().push(e.clone()));

        assert_eq!(engine.set_slot(&cid("hero"), "hand", &iid("sword_a")).unwrap(), None);
        assert_eq!(
            engine.set_slot(&cid("hero"), "hand", &iid("sword_b")).unwrap(),
            Some(iid("sword_a"))
        );
        assert_eq!(engine.get_slot(&cid("hero"), "hand").unwrap(), Some(&iid("sword_b")));
        assert_eq!(engine.quantity(&cid("hero"), &iid("sword_a")).unwrap(), 0);
        assert_eq!(engine.quantity(&cid("hero"), &iid("sword_b")).unwrap(), 1);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        match &events[1] {
            InventoryEvent::SlotChanged(change) => {
                assert_eq!(change.old_item, Some(iid("sword_a")));
                assert_eq!(change.new_item, Some(iid("sword_b")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn filters_and_missing_slots_are_errors_for_set_and_false_for_can_equip() {
        let mut engine = hero();
        assert!(engine.set_slot(&cid("hero"), "hand", &iid("shield")).unwrap_err().is_validation());
        assert!(engine.set_slot(&cid("hero"), "tail", &iid("sword")).is_err());
        assert!(!engine.can_equip(&cid("hero"), "hand", &iid("shield")).unwrap());
        assert!(!engine.can_equip(&cid("hero"), "tail", &iid("sword")).unwrap());
        assert!(engine.can_equip(&cid("hero"), "head", &iid("shield")).unwrap());
        assert!(engine.get_slot(&cid("hero"), "tail").is_err());
        assert!(engine.is_empty(&cid("hero")).unwrap());
    }

    #[test]
    fn locked_occupants_stay_put() {
        let mut engine = hero();
        engine.set_slot(&cid("hero"), "head", &iid("crown")).unwrap();
        engine.lock_item(&cid("hero"), &iid("crown")).unwrap();

        assert!(engine.clear_slot(&cid("hero"), "head").is_err());
        assert!(engine.set_slot(&cid("hero"), "head", &iid("helm")).is_err());
        assert!(!engine.can_equip(&cid("hero"), "head", &iid("helm")).unwrap());

        engine.unlock_item(&cid("hero"), &iid("crown")).unwrap();
        assert_eq!(engine.clear_slot(&cid("hero"), "head").unwrap(), Some(iid("crown")));
        assert_eq!(engine.clear_slot(&cid("hero"), "head").unwrap(), None);
        let slots = engine.all_slots(&cid("hero")).unwrap();
        assert!(slots.iter().all(|(_, item)| item.is_none()));
    }
}
