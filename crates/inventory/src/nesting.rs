//! Cycle detection over the "container stored as an item" relation.

use std::collections::HashSet;

use stowage_core::{ContainerId, InventoryError, InventoryResult, ItemId};

use crate::registry::Registry;

/// Reject placing `item` into `destination` when `item` names a container
/// and the new edge would make a container reachable from itself.
pub(crate) fn check_nesting(
    registry: &Registry,
    destination: &ContainerId,
    item: &ItemId,
) -> InventoryResult<()> {
    let Some(nested) = registry.find(item.as_str()) else {
        return Ok(());
    };
    if nested.id() == destination {
        return Err(InventoryError::validation(format!(
            "container '{destination}' cannot contain itself"
        )));
    }

    // Walk everything `nested` (transitively) holds.
    let mut seen: HashSet<&str> = HashSet::new();
    let mut pending = vec![nested];
    while let Some(container) = pending.pop() {
        if !seen.insert(container.id().as_str()) {
            continue;
        }
        for held in container.item_ids() {
            if held.as_str() == destination.as_str() {
                return Err(InventoryError::validation(format!(
                    "placing '{item}' in '{destination}' would create a nesting cycle"
                )));
            }
            if let Some(inner) = registry.find(held.as_str()) {
                pending.push(inner);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModeConfig;
    use crate::container::Container;
    use crate::stack::ItemStack;

    fn cid(s: &str) -> ContainerId {
        ContainerId::new(s).unwrap()
    }

    fn registry_with(edges: &[(&str, &str)], names: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for name in names {
            let mut c = Container::new(cid(name), ModeConfig::unlimited());
            for (outer, inner) in edges {
                if outer == name {
                    let item = ItemId::new(*inner).unwrap();
                    c.stacks_mut(&item).push(ItemStack::new(item.clone(), 1));
                }
            }
            registry.insert(c).unwrap();
        }
        registry
    }

    #[test]
    fn self_nesting_is_rejected() {
        let registry = registry_with(&[], &["bag"]);
        let err = check_nesting(&registry, &cid("bag"), &ItemId::new("bag").unwrap()).unwrap_err();
        assert!(err.to_string().contains("itself"));
    }

    #[test]
    fn transitive_cycles_are_rejected() {
        // chest holds box, box holds pouch.
        let registry = registry_with(&[("chest", "box"), ("box", "pouch")], &["chest", "box", "pouch"]);
        let chest_as_item = ItemId::new("chest").unwrap();

        assert!(check_nesting(&registry, &cid("pouch"), &chest_as_item).is_err());
        assert!(check_nesting(&registry, &cid("box"), &chest_as_item).is_err());
        assert!(check_nesting(&registry, &cid("chest"), &ItemId::new("pouch").unwrap()).is_ok());
    }

    #[test]
    fn plain_items_and_siblings_pass() {
        let registry = registry_with(&[("left", "shared")], &["left", "right", "shared"]);
        assert!(check_nesting(&registry, &cid("right"), &ItemId::new("shared").unwrap()).is_ok());
        assert!(check_nesting(&registry, &cid("left"), &ItemId::new("apple").unwrap()).is_ok());
    }
}
