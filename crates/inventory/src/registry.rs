//! Container registry: the single owner of every container.

use std::collections::HashMap;

use stowage_core::{ContainerId, InventoryError, InventoryResult};

use crate::container::Container;

/// Containers by id, plus creation order.
///
/// `generation` increases whenever the whole registry is replaced
/// (transaction rollback, snapshot restore), so callers can tell a restored
/// registry from the one they last inspected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    containers: HashMap<ContainerId, Container>,
    order: Vec<ContainerId>,
    generation: u64,
}

fn unknown(id: &str) -> InventoryError {
    InventoryError::validation(format!("unknown container '{id}'"))
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.containers.contains_key(id)
    }

    /// Lookup by raw id; also resolves item ids that name a container.
    pub fn find(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    pub fn get(&self, id: &ContainerId) -> InventoryResult<&Container> {
        self.containers.get(id).ok_or_else(|| unknown(id.as_str()))
    }

    pub(crate) fn get_mut(&mut self, id: &ContainerId) -> InventoryResult<&mut Container> {
        self.containers.get_mut(id).ok_or_else(|| unknown(id.as_str()))
    }

    /// Containers in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Container> {
        self.order.iter().filter_map(|id| self.containers.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = &ContainerId> {
        self.order.iter()
    }

    pub(crate) fn insert(&mut self, container: Container) -> InventoryResult<()> {
        let id = container.id().clone();
        if self.containers.contains_key(&id) {
            return Err(InventoryError::validation(format!(
                "container '{id}' already exists"
            )));
        }
        self.order.push(id.clone());
        self.containers.insert(id, container);
        Ok(())
    }

    pub(crate) fn remove(&mut self, id: &ContainerId) -> InventoryResult<Container> {
        let container = self.containers.remove(id).ok_or_else(|| unknown(id.as_str()))?;
        self.order.retain(|other| other != id);
        Ok(container)
    }

    /// Swap in `other` wholesale, advancing the generation past both.
    pub(crate) fn replace(&mut self, mut other: Registry) {
        other.generation = self.generation.max(other.generation) + 1;
        *self = other;
    }
}
