// Copyright 2025 The gdeltnet Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration for an analysis run
//!
//! Every tunable of the pipeline lives here: edge weight coefficients, the
//! day -> month missing-value policy, community detection and the path
//! length used by the centrality measures. Values come from defaults, an
//! optional TOML file, and `GDELTNET_*` environment overrides, in that order.

use crate::error::{GdeltNetError, Result};
use crate::weight::EdgeWeights;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Default minimum number of members for a community to be retained.
pub const DEFAULT_MIN_COMMUNITY_SIZE: usize = 5;

/// Default random walk length for Walktrap.
pub const DEFAULT_WALKTRAP_STEPS: usize = 4;

/// Community detection algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunityAlgorithmKind {
    /// Modularity optimisation (Louvain).
    #[default]
    Louvain,
    /// Hierarchical agglomeration driven by random walks (Walktrap).
    Walktrap,
}

impl FromStr for CommunityAlgorithmKind {
    type Err = GdeltNetError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "louvain" => Ok(Self::Louvain),
            "walktrap" => Ok(Self::Walktrap),
            other => Err(GdeltNetError::Config(format!(
                "unknown community algorithm {:?} (available: louvain, walktrap)",
                other
            ))),
        }
    }
}

/// Edge length used by shortest-path based centralities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMetric {
    /// Every edge has length 1.
    #[default]
    Hops,
    /// Edge length is `1 / weight`: strong ties are short.
    InverseWeight,
}

/// What to do with events whose two actors are the same country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfLoopPolicy {
    /// Drop the event before accumulation.
    #[default]
    Discard,
    /// Add the weight to the diagonal cell (twice, like any other event).
    Accumulate,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LouvainConfig {
    pub resolution: f64,
    /// Minimum modularity gain for another aggregation level.
    pub threshold: f64,
    /// Seed for the node visiting order.
    pub seed: u64,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            threshold: 1e-7,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalktrapConfig {
    /// Random walk length.
    pub steps: usize,
}

impl Default for WalktrapConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_WALKTRAP_STEPS,
        }
    }
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub weights: EdgeWeights,

    /// Treat zero day cells as missing when averaging a month.
    pub exclude_zero_edges: bool,

    pub self_loops: SelfLoopPolicy,

    pub min_community_size: usize,

    pub community_algorithm: CommunityAlgorithmKind,

    pub louvain: LouvainConfig,

    pub walktrap: WalktrapConfig,

    pub path_metric: PathMetric,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            weights: EdgeWeights::default(),
            exclude_zero_edges: true,
            self_loops: SelfLoopPolicy::Discard,
            min_community_size: DEFAULT_MIN_COMMUNITY_SIZE,
            community_algorithm: CommunityAlgorithmKind::Louvain,
            louvain: LouvainConfig::default(),
            walktrap: WalktrapConfig::default(),
            path_metric: PathMetric::Hops,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            GdeltNetError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), algorithm = ?config.community_algorithm, "loaded analysis config");
        Ok(config)
    }

    /// Apply `GDELTNET_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(key: &str, value: String) -> Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| GdeltNetError::Config(format!("invalid value for {}: {:?}", key, value)))
        }

        if let Some(v) = lookup("GDELTNET_THETA1") {
            self.weights.theta1 = parsed("GDELTNET_THETA1", v)?;
        }
        if let Some(v) = lookup("GDELTNET_THETA2") {
            self.weights.theta2 = parsed("GDELTNET_THETA2", v)?;
        }
        if let Some(v) = lookup("GDELTNET_THETA3") {
            self.weights.theta3 = parsed("GDELTNET_THETA3", v)?;
        }
        if let Some(v) = lookup("GDELTNET_EXCLUDE_ZERO_EDGES") {
            self.exclude_zero_edges = parsed("GDELTNET_EXCLUDE_ZERO_EDGES", v)?;
        }
        if let Some(v) = lookup("GDELTNET_MIN_COMMUNITY_SIZE") {
            self.min_community_size = parsed("GDELTNET_MIN_COMMUNITY_SIZE", v)?;
        }
        if let Some(v) = lookup("GDELTNET_COMMUNITY_ALGORITHM") {
            self.community_algorithm = v.parse()?;
        }
        if let Some(v) = lookup("GDELTNET_SEED") {
            self.louvain.seed = parsed("GDELTNET_SEED", v)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        if !self.weights.is_finite() {
            return Err(GdeltNetError::Validation(
                "edge weight coefficients must be finite".to_string(),
            ));
        }
        if self.min_community_size == 0 {
            return Err(GdeltNetError::Validation(
                "min_community_size must be at least 1".to_string(),
            ));
        }
        if self.walktrap.steps == 0 {
            return Err(GdeltNetError::Validation(
                "walktrap.steps must be at least 1".to_string(),
            ));
        }
        if !(self.louvain.resolution.is_finite() && self.louvain.resolution > 0.0) {
            return Err(GdeltNetError::Validation(
                "louvain.resolution must be positive".to_string(),
            ));
        }
        if !(self.louvain.threshold.is_finite() && self.louvain.threshold >= 0.0) {
            return Err(GdeltNetError::Validation(
                "louvain.threshold must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
