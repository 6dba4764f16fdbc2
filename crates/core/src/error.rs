//! Engine error model.

use thiserror::Error;

/// Result type used across the engine.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Fatal engine error.
///
/// Capacity shortfalls (a full container, an occupied grid cell) are not
/// errors; they are reported through structured outcomes. This type covers
/// misuse and bad configuration only.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// Misuse or invalid configuration (unknown container, bad metadata,
    /// locked item, malformed snapshot, nesting cycle, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A multi-step operation failed and its effects were rolled back.
    #[error("{operation} rolled back: {source}")]
    RolledBack {
        operation: &'static str,
        #[source]
        source: Box<InventoryError>,
    },
}

impl InventoryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn rolled_back(operation: &'static str, source: InventoryError) -> Self {
        Self::RolledBack {
            operation,
            source: Box::new(source),
        }
    }

    /// The innermost error, looking through any rollback wrappers.
    pub fn root_cause(&self) -> &InventoryError {
        match self {
            InventoryError::RolledBack { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.root_cause(), InventoryError::Validation(_))
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(value: serde_json::Error) -> Self {
        InventoryError::Validation(format!("malformed snapshot: {value}"))
    }
}
