//! LOAD stage: input table (file or built-in sample) and merged params.
//!
//! Params precedence, lowest to highest: defaults → params file → overrides.
//! `Params::validate` runs once, after the merge.

use std::path::{Path, PathBuf};

use ra_core::{HeadlineMetric, Params, Quantity, TrailMode};
use ra_io::loader::{self, RawTable};
use ra_io::{params as io_params, sample};
use tracing::info;

use crate::PipelineError;

/// Where the unit table comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputSource {
    Path(PathBuf),
    Sample,
}

impl InputSource {
    pub fn label(&self) -> String {
        match self {
            InputSource::Path(p) => p.display().to_string(),
            InputSource::Sample => sample::SAMPLE_SOURCE.to_string(),
        }
    }
}

/// Per-field overrides (CLI flags). `None` keeps the lower layer's value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParamOverrides {
    pub same_group_only: Option<bool>,
    pub min_allocation: Option<Quantity>,
    pub rebalance_ordering: Option<bool>,
    pub trail: Option<TrailMode>,
    pub headline_metric: Option<HeadlineMetric>,
}

impl ParamOverrides {
    pub fn apply(&self, mut p: Params) -> Params {
        if let Some(v) = self.same_group_only {
            p.same_group_only = v;
        }
        if let Some(v) = self.min_allocation {
            p.min_allocation = v;
        }
        if let Some(v) = self.rebalance_ordering {
            p.rebalance_ordering = v;
        }
        if let Some(v) = self.trail {
            p.trail = v;
        }
        if let Some(v) = self.headline_metric {
            p.headline_metric = v;
        }
        p
    }
}

pub fn load_input(src: &InputSource) -> Result<RawTable, PipelineError> {
    match src {
        InputSource::Path(p) => Ok(loader::load_table(p)?),
        InputSource::Sample => {
            info!("using built-in sample data");
            Ok(sample::sample_table())
        }
    }
}

pub fn resolve_params(file: Option<&Path>, overrides: &ParamOverrides) -> Result<Params, PipelineError> {
    let base = match file {
        Some(p) => io_params::load_params(p)?,
        None => Params::default(),
    };
    let params = overrides.apply(base);
    params.validate()?;
    info!(
        same_group_only = params.same_group_only,
        min_allocation = %params.min_allocation,
        rebalance_ordering = params.rebalance_ordering,
        trail = %params.trail,
        metric = %params.headline_metric,
        "params resolved"
    );
    Ok(params)
}
