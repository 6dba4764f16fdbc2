//! Container mode configuration.
//!
//! A container is governed by exactly one [`ModeConfig`]. The serialized
//! form is tagged by `mode` with camelCase fields, e.g.
//! `{"mode": "grid", "width": 4, "height": 3, "allowRotation": true}`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use stowage_core::{InventoryError, InventoryResult};

use crate::limits::EngineLimits;

/// Capacity discipline, without its parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Unlimited,
    Count,
    Weight,
    Grid,
    Slots,
    Combined,
}

impl core::fmt::Display for Mode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Mode::Unlimited => "unlimited",
            Mode::Count => "count",
            Mode::Weight => "weight",
            Mode::Grid => "grid",
            Mode::Slots => "slots",
            Mode::Combined => "combined",
        };
        f.write_str(name)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlimitedRule {
    #[serde(default = "default_true")]
    pub allow_stacking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stack_size: Option<u32>,
}

/// At most `max_count` stacks, whatever their quantities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountRule {
    pub max_count: u32,
    #[serde(default = "default_true")]
    pub allow_stacking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stack_size: Option<u32>,
}

/// Total weight of all units at most `max_weight`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightRule {
    pub max_weight: f64,
    #[serde(default = "default_true")]
    pub allow_stacking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stack_size: Option<u32>,
}

/// A `width` x `height` cell matrix; items occupy their footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRule {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_true")]
    pub allow_stacking: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_stack_size: Option<u32>,
    #[serde(default)]
    pub allow_rotation: bool,
}

/// One named equipment slot, optionally guarded by a registered filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Fixed named slots holding one unit each.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsRule {
    pub slots: Vec<SlotDef>,
}

impl SlotsRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slot(mut self, name: impl Into<String>) -> Self {
        self.slots.push(SlotDef {
            name: name.into(),
            filter: None,
        });
        self
    }

    /// Add a slot guarded by the filter registered under `filter`.
    pub fn filtered_slot(mut self, name: impl Into<String>, filter: impl Into<String>) -> Self {
        self.slots.push(SlotDef {
            name: name.into(),
            filter: Some(filter.into()),
        });
        self
    }

    pub fn get(&self, name: &str) -> Option<&SlotDef> {
        self.slots.iter().find(|s| s.name == name)
    }
}

/// Every rule must accept an admission for it to succeed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedRule {
    pub rules: Vec<ModeConfig>,
}

/// Mode configuration of a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ModeConfig {
    Unlimited(UnlimitedRule),
    Count(CountRule),
    Weight(WeightRule),
    Grid(GridRule),
    Slots(SlotsRule),
    Combined(CombinedRule),
}

/// Stacking policy shared by the quantity-based modes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Stacking {
    pub allow: bool,
    pub max_stack_size: Option<u32>,
}

impl Stacking {
    pub const NONE: Stacking = Stacking {
        allow: false,
        max_stack_size: None,
    };

    /// Largest quantity one stack may hold given the item's own limit.
    pub fn cap(&self, item_limit: u32) -> u32 {
        if !self.allow {
            return 1;
        }
        self.max_stack_size.map_or(item_limit, |m| m.min(item_limit))
    }
}

impl ModeConfig {
    pub fn unlimited() -> Self {
        ModeConfig::Unlimited(UnlimitedRule {
            allow_stacking: true,
            max_stack_size: None,
        })
    }

    pub fn count(max_count: u32) -> Self {
        ModeConfig::Count(CountRule {
            max_count,
            allow_stacking: true,
            max_stack_size: None,
        })
    }

    pub fn weight(max_weight: f64) -> Self {
        ModeConfig::Weight(WeightRule {
            max_weight,
            allow_stacking: true,
            max_stack_size: None,
        })
    }

    pub fn grid(width: u32, height: u32) -> Self {
        ModeConfig::Grid(GridRule {
            width,
            height,
            allow_stacking: true,
            max_stack_size: None,
            allow_rotation: false,
        })
    }

    pub fn slots(rule: SlotsRule) -> Self {
        ModeConfig::Slots(rule)
    }

    pub fn combined(rules: Vec<ModeConfig>) -> Self {
        ModeConfig::Combined(CombinedRule { rules })
    }

    /// Enable or disable stacking (no effect on slots/combined).
    pub fn stacking(mut self, allow: bool) -> Self {
        match &mut self {
            ModeConfig::Unlimited(r) => r.allow_stacking = allow,
            ModeConfig::Count(r) => r.allow_stacking = allow,
            ModeConfig::Weight(r) => r.allow_stacking = allow,
            ModeConfig::Grid(r) => r.allow_stacking = allow,
            ModeConfig::Slots(_) | ModeConfig::Combined(_) => {}
        }
        self
    }

    /// Cap stack sizes (no effect on slots/combined).
    pub fn max_stack_size(mut self, max: u32) -> Self {
        match &mut self {
            ModeConfig::Unlimited(r) => r.max_stack_size = Some(max),
            ModeConfig::Count(r) => r.max_stack_size = Some(max),
            ModeConfig::Weight(r) => r.max_stack_size = Some(max),
            ModeConfig::Grid(r) => r.max_stack_size = Some(max),
            ModeConfig::Slots(_) | ModeConfig::Combined(_) => {}
        }
        self
    }

    /// Allow rotated placements (grid only).
    pub fn rotation(mut self, allow: bool) -> Self {
        if let ModeConfig::Grid(r) = &mut self {
            r.allow_rotation = allow;
        }
        self
    }

    pub fn mode(&self) -> Mode {
        match self {
            ModeConfig::Unlimited(_) => Mode::Unlimited,
            ModeConfig::Count(_) => Mode::Count,
            ModeConfig::Weight(_) => Mode::Weight,
            ModeConfig::Grid(_) => Mode::Grid,
            ModeConfig::Slots(_) => Mode::Slots,
            ModeConfig::Combined(_) => Mode::Combined,
        }
    }

    /// Stacking policy. Combined takes the strictest policy of its rules.
    pub fn stacking_policy(&self) -> Stacking {
        match self {
            ModeConfig::Unlimited(r) => Stacking {
                allow: r.allow_stacking,
                max_stack_size: r.max_stack_size,
            },
            ModeConfig::Count(r) => Stacking {
                allow: r.allow_stacking,
                max_stack_size: r.max_stack_size,
            },
            ModeConfig::Weight(r) => Stacking {
                allow: r.allow_stacking,
                max_stack_size: r.max_stack_size,
            },
            ModeConfig::Grid(r) => Stacking {
                allow: r.allow_stacking,
                max_stack_size: r.max_stack_size,
            },
            ModeConfig::Slots(_) => Stacking::NONE,
            ModeConfig::Combined(c) => {
                let mut policy = Stacking {
                    allow: !c.rules.is_empty(),
                    max_stack_size: None,
                };
                for rule in &c.rules {
                    let p = rule.stacking_policy();
                    policy.allow &= p.allow;
                    policy.max_stack_size = match (policy.max_stack_size, p.max_stack_size) {
                        (Some(a), Some(b)) => Some(a.min(b)),
                        (a, b) => a.or(b),
                    };
                }
                policy
            }
        }
    }

    /// The grid governing this container: its own, or a combined container's
    /// first grid rule.
    pub fn grid_rule(&self) -> Option<&GridRule> {
        match self {
            ModeConfig::Grid(r) => Some(r),
            ModeConfig::Combined(c) => c.rules.iter().find_map(|r| match r {
                ModeConfig::Grid(g) => Some(g),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn slots_rule(&self) -> Option<&SlotsRule> {
        match self {
            ModeConfig::Slots(r) => Some(r),
            _ => None,
        }
    }

    /// Check parameters against `limits`. `filter_known` reports whether a
    /// slot filter name is registered.
    pub fn validate(
        &self,
        limits: &EngineLimits,
        filter_known: &dyn Fn(&str) -> bool,
    ) -> InventoryResult<()> {
        let check_stack = |max: Option<u32>| match max {
            Some(0) => Err(InventoryError::validation("maxStackSize must be at least 1")),
            _ => Ok(()),
        };

        match self {
            ModeConfig::Unlimited(r) => check_stack(r.max_stack_size),
            ModeConfig::Count(r) => {
                check_stack(r.max_stack_size)?;
                if r.max_count == 0 {
                    return Err(InventoryError::validation("maxCount must be at least 1"));
                }
                Ok(())
            }
            ModeConfig::Weight(r) => {
                check_stack(r.max_stack_size)?;
                if !r.max_weight.is_finite() || r.max_weight < 0.0 {
                    return Err(InventoryError::validation(format!(
                        "maxWeight {} must be a finite, non-negative number",
                        r.max_weight
                    )));
                }
                Ok(())
            }
            ModeConfig::Grid(r) => {
                check_stack(r.max_stack_size)?;
                validate_grid(r, limits)
            }
            ModeConfig::Slots(r) => validate_slots(r, filter_known),
            ModeConfig::Combined(c) => {
                if c.rules.is_empty() {
                    return Err(InventoryError::validation(
                        "combined mode needs at least one rule",
                    ));
                }
                for rule in &c.rules {
                    if matches!(rule, ModeConfig::Combined(_) | ModeConfig::Slots(_)) {
                        return Err(InventoryError::validation(format!(
                            "combined mode cannot contain a {} rule",
                            rule.mode()
                        )));
                    }
                    rule.validate(limits, filter_known)?;
                }
                Ok(())
            }
        }
    }
}

fn validate_grid(r: &GridRule, limits: &EngineLimits) -> InventoryResult<()> {
    for (axis, value) in [("width", r.width), ("height", r.height)] {
        if value == 0 {
            return Err(InventoryError::validation(format!(
                "grid {axis} must be at least 1"
            )));
        }
        if value > limits.max_grid_axis {
            return Err(InventoryError::validation(format!(
                "grid {axis} {value} exceeds the per-axis limit of {}",
                limits.max_grid_axis
            )));
        }
    }
    let cells = u64::from(r.width) * u64::from(r.height);
    if cells > limits.max_grid_cells {
        return Err(InventoryError::validation(format!(
            "grid of {cells} cells exceeds the limit of {} cells",
            limits.max_grid_cells
        )));
    }
    Ok(())
}

fn validate_slots(r: &SlotsRule, filter_known: &dyn Fn(&str) -> bool) -> InventoryResult<()> {
    if r.slots.is_empty() {
        return Err(InventoryError::validation("slots mode needs at least one slot"));
    }
    let mut seen = HashSet::new();
    for slot in &r.slots {
        if slot.name.trim().is_empty() {
            return Err(InventoryError::validation("slot name cannot be empty"));
        }
        if !seen.insert(slot.name.as_str()) {
            return Err(InventoryError::validation(format!(
                "duplicate slot name '{}'",
                slot.name
            )));
        }
        if let Some(filter) = &slot.filter {
            if !filter_known(filter) {
                return Err(InventoryError::validation(format!(
                    "slot '{}' uses unregistered filter '{filter}'",
                    slot.name
                )));
            }
        }
    }
    Ok(())
}
