//! Engine-wide limits and their environment overrides.

/// Environment variable overriding [`EngineLimits::max_grid_axis`].
pub const MAX_GRID_AXIS_ENV: &str = "STOWAGE_MAX_GRID_AXIS";
/// Environment variable overriding [`EngineLimits::max_grid_cells`].
pub const MAX_GRID_CELLS_ENV: &str = "STOWAGE_MAX_GRID_CELLS";

/// Bounds applied when validating container configurations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EngineLimits {
    /// Largest accepted grid width or height.
    pub max_grid_axis: u32,
    /// Largest accepted `width * height`.
    pub max_grid_cells: u64,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_grid_axis: 1_000,
            max_grid_cells: 250_000,
        }
    }
}

impl EngineLimits {
    /// Defaults, overridden by `STOWAGE_MAX_GRID_AXIS` / `STOWAGE_MAX_GRID_CELLS`.
    ///
    /// Unparseable or zero values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_grid_axis: read_positive(&lookup, MAX_GRID_AXIS_ENV)
                .unwrap_or(defaults.max_grid_axis),
            max_grid_cells: read_positive(&lookup, MAX_GRID_CELLS_ENV)
                .unwrap_or(defaults.max_grid_cells),
        }
    }
}

fn read_positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: core::str::FromStr + PartialEq + Default,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) if v != T::default() => Some(v),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring invalid engine limit override");
            None
        }
    }
}
