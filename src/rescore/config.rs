use crate::error::{Error, Result};

/// exactly one of these selects the rescoring traversal (§4.4/§6); `prune`
/// is the default when the caller leaves every flag unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Exact,
    Prune,
    Grow,
    GrowCoarse,
    Incremental,
}

impl Default for Variant {
    fn default() -> Self {
        Variant::Prune
    }
}

/// which half of a mutually exclusive split is active; `None` means
/// neither flag was set and both feature classes remain active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Split {
    Either,
    First,
    Second,
}

/// configuration for a rescoring pass (§4.4/§6); constructed via
/// [`RescoreConfig::builder`] then validated with [`RescoreConfig::build`],
/// which is the only way to produce one — so a live config is always
/// internally consistent.
#[derive(Debug, Clone)]
pub struct RescoreConfig {
    pub variant: Variant,
    pub size: usize,
    pub diversity: f64,
    pub rejection: bool,
    pub forced: bool,
    pub prune_bin: bool,
    pub density: Split,
    pub statefulness: Split,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RescoreConfigBuilder {
    pub exact: bool,
    pub prune: bool,
    pub grow: bool,
    pub grow_coarse: bool,
    pub incremental: bool,
    pub size: Option<usize>,
    pub diversity: f64,
    pub rejection: bool,
    pub forced: bool,
    pub prune_bin: bool,
    pub sparse: bool,
    pub dense: bool,
    pub state_full: bool,
    pub state_less: bool,
}

impl RescoreConfig {
    pub fn builder() -> RescoreConfigBuilder {
        RescoreConfigBuilder::default()
    }
}

impl RescoreConfigBuilder {
    pub fn build(self) -> Result<RescoreConfig> {
        let selected: Vec<Variant> = [
            (self.exact, Variant::Exact),
            (self.prune, Variant::Prune),
            (self.grow, Variant::Grow),
            (self.grow_coarse, Variant::GrowCoarse),
            (self.incremental, Variant::Incremental),
        ]
        .into_iter()
        .filter_map(|(set, variant)| set.then_some(variant))
        .collect();

        let variant = match selected.len() {
            0 => Variant::default(),
            1 => selected[0],
            _ => {
                return Err(Error::InvalidConfig(
                    "exactly one of exact/prune/grow/grow-coarse/incremental may be set".into(),
                ))
            }
        };

        if self.sparse && self.dense {
            return Err(Error::InvalidConfig("sparse and dense are mutually exclusive".into()));
        }
        if self.state_full && self.state_less {
            return Err(Error::InvalidConfig(
                "state-full and state-less are mutually exclusive".into(),
            ));
        }

        let density = match (self.sparse, self.dense) {
            (true, false) => Split::First,
            (false, true) => Split::Second,
            _ => Split::Either,
        };
        let statefulness = match (self.state_full, self.state_less) {
            (true, false) => Split::First,
            (false, true) => Split::Second,
            _ => Split::Either,
        };

        let size = self.size.unwrap_or(1);
        if size < 1 && !matches!(variant, Variant::Exact) {
            return Err(Error::InvalidConfig("size must be >= 1 when pruning is enabled".into()));
        }

        Ok(RescoreConfig {
            variant,
            size,
            diversity: self.diversity,
            rejection: self.rejection,
            forced: self.forced,
            prune_bin: self.prune_bin,
            density,
            statefulness,
        })
    }
}
