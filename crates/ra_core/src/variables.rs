//! Run parameters (configuration domain) and their validation.
//!
//! Notes:
//! - `min_allocation` must be strictly positive; zero is the only invalid
//!   value a `Quantity` can hold and is rejected as an invalid configuration.
//! - `rebalance_ordering = false` keeps the destination order computed once
//!   before matching (stale as idle capacity shrinks). `true` re-sorts the
//!   destinations by current idle capacity before each origin's scan.
//! - Both efficiency metrics are always computed; `headline_metric` only
//!   selects which one is reported as "efficiency".

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

use crate::quantity::Quantity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_MIN_ALLOCATION_UNITS: u64 = 10;
pub const DEFAULT_SELF_SERVED_LABEL: &str = "self-served";
pub const DEFAULT_TRAIL_SEPARATOR: &str = "; ";

/// Which trail representation(s) the assembled result carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TrailMode {
    /// One human-readable string per unit: `"B (20); C (5)"` or the sentinel.
    #[default]
    PerOrigin,
    /// The raw edge list as its own table.
    EdgeTable,
    Both,
}

impl TrailMode {
    pub fn per_origin(self) -> bool {
        matches!(self, TrailMode::PerOrigin | TrailMode::Both)
    }

    pub fn edge_table(self) -> bool {
        matches!(self, TrailMode::EdgeTable | TrailMode::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TrailMode::PerOrigin => "per_origin",
            TrailMode::EdgeTable => "edge_table",
            TrailMode::Both => "both",
        }
    }
}

impl FromStr for TrailMode {
    type Err = ParamsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_origin" => Ok(TrailMode::PerOrigin),
            "edge_table" => Ok(TrailMode::EdgeTable),
            "both" => Ok(TrailMode::Both),
            other => Err(ParamsError::Domain(format!("unknown trail mode: {other}"))),
        }
    }
}

impl fmt::Display for TrailMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which efficiency rate is reported as the headline "efficiency".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeadlineMetric {
    /// Share of initial residual demand eliminated by cross-unit allocation.
    #[default]
    Recovery,
    /// Share of total installed capacity consumed by total served demand.
    Utilization,
}

impl HeadlineMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            HeadlineMetric::Recovery => "recovery",
            HeadlineMetric::Utilization => "utilization",
        }
    }
}

impl FromStr for HeadlineMetric {
    type Err = ParamsError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recovery" => Ok(HeadlineMetric::Recovery),
            "utilization" | "utilisation" => Ok(HeadlineMetric::Utilization),
            other => Err(ParamsError::Domain(format!("unknown metric: {other}"))),
        }
    }
}

impl fmt::Display for HeadlineMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsError {
    #[error("domain error: {0}")]
    Domain(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for one run. Missing fields in a params file take defaults.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Params {
    pub same_group_only: bool,
    pub min_allocation: Quantity,
    pub rebalance_ordering: bool,
    pub trail: TrailMode,
    pub headline_metric: HeadlineMetric,
    pub self_served_label: String,
    pub trail_separator: String,
}

impl Default for Params {
    fn default() -> Self {
        Params {
            same_group_only: true,
            min_allocation: Quantity::from_units(DEFAULT_MIN_ALLOCATION_UNITS),
            rebalance_ordering: false,
            trail: TrailMode::default(),
            headline_metric: HeadlineMetric::default(),
            self_served_label: DEFAULT_SELF_SERVED_LABEL.to_string(),
            trail_separator: DEFAULT_TRAIL_SEPARATOR.to_string(),
        }
    }
}

impl Params {
    /// Domain validation; run after every merge (defaults → file → flags).
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.min_allocation.is_zero() {
            return Err(ParamsError::InvalidConfig(
                "min_allocation must be greater than 0".into(),
            ));
        }
        if self.self_served_label.trim().is_empty() {
            return Err(ParamsError::Domain("self_served_label must not be blank".into()));
        }
        if self.trail_separator.is_empty() {
            return Err(ParamsError::Domain("trail_separator must not be empty".into()));
        }
        Ok(())
    }
}
