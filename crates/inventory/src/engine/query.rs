//! Read-only queries. None of these mutate or publish.

use std::collections::HashSet;

use stowage_core::{ContainerId, InventoryError, InventoryResult, ItemId};

use super::Engine;
use crate::container::Container;
use crate::grid::CellView;
use crate::metadata::MetadataAdapter;
use crate::mode::{self, ModeContext};
use crate::nesting::check_nesting;
use crate::outcome::{CapacityCheck, ContentEntry, ItemLocation, RemainingCapacity};
use crate::stack::{ItemStack, Placement};

impl Engine {
    /// Every stack in `container`; with `deep`, also the stacks of every
    /// container nested inside it (each visited once).
    pub fn contents(&self, container: &ContainerId, deep: bool) -> InventoryResult<Vec<ContentEntry>> {
        let root = self.registry.get(container)?;
        let mut seen = HashSet::from([root.id().as_str()]);
        let mut out = Vec::new();
        self.collect_contents(root, deep, &mut seen, &mut out);
        Ok(out)
    }

    fn collect_contents<'a>(
        &'a self,
        container: &'a Container,
        deep: bool,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<ContentEntry>,
    ) {
        for (item, stacks) in container.entries() {
            out.extend(stacks.iter().map(|s| ContentEntry {
                container_id: container.id().clone(),
                item_id: item.clone(),
                quantity: s.quantity,
                position: s.position,
            }));
            if !deep {
                continue;
            }
            if let Some(nested) = self.registry.find(item.as_str()) {
                if seen.insert(nested.id().as_str()) {
                    self.collect_contents(nested, deep, seen, out);
                }
            }
        }
    }

    pub fn stacks(&self, container: &ContainerId, item: &ItemId) -> InventoryResult<&[ItemStack]> {
        Ok(self.registry.get(container)?.stacks(item))
    }

    pub fn has_item(&self, container: &ContainerId, item: &ItemId) -> InventoryResult<bool> {
        Ok(self.quantity(container, item)? > 0)
    }

    pub fn quantity(&self, container: &ContainerId, item: &ItemId) -> InventoryResult<u64> {
        Ok(self.registry.get(container)?.quantity(item))
    }

    pub fn is_empty(&self, container: &ContainerId) -> InventoryResult<bool> {
        Ok(self.registry.get(container)?.is_empty())
    }

    /// Whether `quantity` more units would be accepted, and how many would.
    pub fn can_add(&self, container: &ContainerId, item: &ItemId, quantity: u32) -> InventoryResult<CapacityCheck> {
        let target = self.registry.get(container)?;
        if quantity > 0 {
            check_nesting(&self.registry, container, item)?;
        }
        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let room = mode::headroom(ctx, target.config(), target, item)?;
        let can_add = room.max_addable >= u64::from(quantity);
        Ok(CapacityCheck {
            can_add,
            max_addable: room.max_addable,
            reason: if can_add { None } else { room.limited_by },
        })
    }

    pub fn remaining_capacity(&self, container: &ContainerId) -> InventoryResult<RemainingCapacity> {
        let target = self.registry.get(container)?;
        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        mode::remaining(ctx, target.config(), target)
    }

    /// Containers holding `item`, in creation order. With `deep`, a
    /// container also counts what its nested containers hold.
    pub fn find_item(&self, item: &ItemId, deep: bool) -> Vec<ItemLocation> {
        self.registry
            .iter()
            .filter_map(|container| {
                let mut quantity = container.quantity(item);
                if deep {
                    let mut seen = HashSet::from([container.id().as_str()]);
                    quantity += self.nested_quantity(container, item, &mut seen);
                }
                (quantity > 0).then(|| ItemLocation {
                    container_id: container.id().clone(),
                    quantity,
                })
            })
            .collect()
    }

    fn nested_quantity<'a>(&'a self, container: &'a Container, item: &ItemId, seen: &mut HashSet<&'a str>) -> u64 {
        let mut total = 0;
        for held in container.item_ids() {
            let Some(nested) = self.registry.find(held.as_str()) else {
                continue;
            };
            if seen.insert(nested.id().as_str()) {
                total += nested.quantity(item) + self.nested_quantity(nested, item, seen);
            }
        }
        total
    }

    /// Weight of everything in `container`; with `deep`, plus the contents
    /// of nested containers.
    pub fn total_weight(&self, container: &ContainerId, deep: bool) -> InventoryResult<f64> {
        let root = self.registry.get(container)?;
        let meta = MetadataAdapter::new(self.metadata.as_ref());
        if !deep {
            return mode::contents_weight(meta, root);
        }
        let mut seen = HashSet::from([root.id().as_str()]);
        self.deep_weight(meta, root, &mut seen)
    }

    fn deep_weight<'a>(
        &'a self,
        meta: MetadataAdapter<'_>,
        container: &'a Container,
        seen: &mut HashSet<&'a str>,
    ) -> InventoryResult<f64> {
        let mut total = mode::contents_weight(meta, container)?;
        for held in container.item_ids() {
            if let Some(nested) = self.registry.find(held.as_str()) {
                if seen.insert(nested.id().as_str()) {
                    total += self.deep_weight(meta, nested, seen)?;
                }
            }
        }
        Ok(total)
    }

    /// The cell matrix as rows (`[y][x]`), each cell resolved against its
    /// stack's live quantity.
    pub fn grid(&self, container: &ContainerId) -> InventoryResult<Vec<Vec<Option<CellView>>>> {
        let target = self.registry.get(container)?;
        let grid = target.grid().ok_or_else(|| no_grid(container))?;
        let width = grid.width().max(1) as usize;
        Ok(grid
            .cells()
            .chunks(width)
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        let cell = cell.as_ref()?;
                        let stack = target.stacks(&cell.item_id).get(cell.stack_index)?;
                        Some(CellView {
                            item_id: cell.item_id.clone(),
                            stack_index: cell.stack_index,
                            quantity: stack.quantity,
                            origin: cell.origin,
                        })
                    })
                    .collect()
            })
            .collect())
    }

    /// Every position where a new stack of `item` would fit right now.
    pub fn find_placements(&self, container: &ContainerId, item: &ItemId) -> InventoryResult<Vec<Placement>> {
        let target = self.registry.get(container)?;
        let (Some(rule), Some(grid)) = (target.config().grid_rule(), target.grid()) else {
            return Err(no_grid(container));
        };
        let size = MetadataAdapter::new(self.metadata.as_ref()).size(item)?;
        Ok(grid.find_placements(size, rule.allow_rotation))
    }
}

fn no_grid(container: &ContainerId) -> InventoryError {
    InventoryError::validation(format!("container '{container}' has no grid"))
}

#[cfg(test)]
mod tests {
    use crate::config::{ModeConfig, SlotsRule};
    use crate::engine::Engine;
    use crate::metadata::{ItemCatalog, ItemSpec};
    use crate::outcome::{CapacityReason, RemainingCapacity, UNBOUNDED};
    use crate::stack::GridPosition;
    use stowage_core::{ContainerId, ItemId};

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
                .with_item(iid("box"), ItemSpec::new().weight(2.0).size(2, 2))
                .with_item(iid("pouch"), ItemSpec::new().weight(0.5))
                .with_item(iid("coin"), ItemSpec::new().weight(0.01).stack_limit(100)),
        )
    }

    #[test]
    fn total_weight_matches_the_admitted_units() {
        let mut engine = engine();
        engine.create_container(cid("c1"), ModeConfig::weight(25.0)).unwrap();
        engine.add_item(&cid("c1"), &iid("heavy"), 5).unwrap();
        assert_eq!(engine.total_weight(&cid("c1"), false).unwrap(), 20.0);

        let check = engine.can_add(&cid("c1"), &iid("heavy"), 1).unwrap();
        assert!(!check.can_add);
        assert_eq!(check.max_addable, 0);
        assert_eq!(check.reason, Some(CapacityReason::WeightExceeded));
        match engine.remaining_capacity(&cid("c1")).unwrap() {
            RemainingCapacity::Weight { remaining_weight } => assert!((remaining_weight - 5.0).abs() < 1e-9),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn deep_queries_follow_nested_containers_once() {
        let mut engine = engine();
        for id in ["chest", "pouch"] {
            engine.create_container(cid(id), ModeConfig::unlimited()).unwrap();
        }
        engine.add_item(&cid("pouch"), &iid("coin"), 150).unwrap();
        engine.add_item(&cid("chest"), &iid("pouch"), 1).unwrap();
        engine.add_item(&cid("chest"), &iid("coin"), 10).unwrap();

        let shallow = engine.contents(&cid("chest"), false).unwrap();
        assert_eq!(shallow.len(), 2);
        let deep = engine.contents(&cid("chest"), true).unwrap();
        assert_eq!(deep.len(), 4);
        assert!(deep.iter().any(|e| e.container_id == cid("pouch") && e.quantity == 100));

        let found = engine.find_item(&iid("coin"), true);
        let summary: Vec<(&str, u64)> = found.iter().map(|l| (l.container_id.as_str(), l.quantity)).collect();
        assert_eq!(summary, vec![("chest", 160), ("pouch", 150)]);
        assert_eq!(engine.find_item(&iid("coin"), false)[0].quantity, 10);

        let deep_weight = engine.total_weight(&cid("chest"), true).unwrap();
        assert!((deep_weight - (0.5 + 0.1 + 1.5)).abs() < 1e-9);
    }

    #[test]
    fn grid_projection_resolves_live_quantities() {
        let mut engine = engine();
        engine.create_container(cid("bag"), ModeConfig::grid(3, 3)).unwrap();
        engine
            .add_item_at(&cid("bag"), &iid("box"), GridPosition::new(0, 0), 1)
            .unwrap();
        assert!(engine.find_placements(&cid("bag"), &iid("box")).unwrap().is_empty());
        assert_eq!(engine.find_placements(&cid("bag"), &iid("coin")).unwrap().len(), 5);

        engine.add_item(&cid("bag"), &iid("coin"), 30).unwrap();
        let rows = engine.grid(&cid("bag")).unwrap();
        assert_eq!(rows.len(), 3);
        let corner = rows[1][1].as_ref().unwrap();
        assert_eq!((corner.item_id.as_str(), corner.origin, corner.quantity), ("box", false, 1));
        let coins = rows[0][2].as_ref().unwrap();
        assert_eq!((coins.quantity, coins.origin), (30, true));
        assert!(rows[2][2].is_none());

        assert!(engine.grid(&cid("missing")).is_err());
    }

    #[test]
    fn capacity_checks_per_mode() {
        let mut engine = engine();
        engine.create_container(cid("any"), ModeConfig::unlimited()).unwrap();
        let check = engine.can_add(&cid("any"), &iid("coin"), 1_000).unwrap();
        assert!(check.can_add);
        assert_eq!(check.max_addable, UNBOUNDED);

        engine
            .create_container(cid("hero"), ModeConfig::slots(SlotsRule::new().slot("head").slot("feet")))
            .unwrap();
        assert_eq!(engine.can_add(&cid("hero"), &iid("coin"), 2).unwrap().max_addable, 2);
        engine.add_item(&cid("hero"), &iid("coin"), 1).unwrap();
        let check = engine.can_add(&cid("hero"), &iid("coin"), 2).unwrap();
        assert_eq!((check.can_add, check.reason), (false, Some(CapacityReason::NoFreeSlot)));
        assert_eq!(
            engine.remaining_capacity(&cid("hero")).unwrap(),
            RemainingCapacity::Slots { free_slots: vec!["feet".to_string()] }
        );
        assert!(engine.has_item(&cid("hero"), &iid("coin")).unwrap());
        assert!(!engine.is_empty(&cid("hero")).unwrap());
    }
}
