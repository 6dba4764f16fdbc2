use serde::Deserialize;
use serde_json::Value;
use stowage_core::{ContainerId, InventoryResult};

use super::Engine;
use crate::codec::{self, Snapshot};
use crate::mode::ModeContext;

impl Engine {
    /// Typed copy of the whole registry.
    pub fn snapshot(&self) -> Snapshot {
        codec::encode(&self.registry)
    }

    /// The whole registry as a structured value.
    pub fn serialize(&self) -> InventoryResult<Value> {
        Ok(serde_json::to_value(self.snapshot())?)
    }

    /// One container in the same form as an entry of `serialize()`.
    pub fn serialize_container(&self, container: &ContainerId) -> InventoryResult<Value> {
        let target = self.registry.get(container)?;
        Ok(serde_json::to_value(codec::encode_container(target))?)
    }

    /// Replace the registry with the contents of `value`. Nothing changes
    /// unless the whole value is valid.
    pub fn deserialize(&mut self, value: &Value) -> InventoryResult<()> {
        let snapshot = Snapshot::deserialize(value)?;
        self.restore(snapshot)
    }

    pub fn restore(&mut self, snapshot: Snapshot) -> InventoryResult<()> {
        let ctx = ModeContext::new(self.metadata.as_ref(), &self.filters);
        let registry = codec::decode(snapshot, ctx, &self.limits)?;
        self.registry.replace(registry);
        tracing::info!(
            containers = self.registry.len(),
            generation = self.registry.generation(),
            "registry restored from snapshot"
        );
        Ok(())
    }
}
