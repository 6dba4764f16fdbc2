use stowage_core::{InventoryError, InventoryResult};

use super::Engine;

impl Engine {
    /// Run `body` all-or-nothing.
    ///
    /// The registry is copied before `body` runs. If `body` returns an error
    /// the copy is swapped back in (advancing [`Registry::generation`]) and
    /// the error comes back wrapped in [`InventoryError::RolledBack`].
    /// Events published inside `body` are not retracted. Nested
    /// transactions keep their own copies.
    ///
    /// [`Registry::generation`]: crate::Registry::generation
    pub fn transaction<T>(&mut self, body: impl FnOnce(&mut Engine) -> InventoryResult<T>) -> InventoryResult<T> {
        let saved = self.registry.clone();
        match body(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.registry.replace(saved);
                tracing::warn!(error = %err, generation = self.registry.generation(), "transaction rolled back");
                Err(InventoryError::rolled_back("transaction", err))
            }
        }
    }
}
