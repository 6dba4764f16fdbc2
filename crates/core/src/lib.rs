//! `stowage-core`: shared building blocks for the inventory engine.
//!
//! This crate holds the error taxonomy and the validated identifier types. It
//! has no knowledge of containers or capacity rules.

pub mod error;
pub mod id;

pub use error::{InventoryError, InventoryResult};
pub use id::{ContainerId, ItemId, MAX_ID_LEN};
