use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables of the recommendation heuristic. Chart windows are fixed in
/// [`crate::chart::windows`] and are not part of this config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub recommend_window: usize,
    pub cold_gap_threshold: u32,
    pub hot_count: usize,
    pub max_hot_in_recommendation: usize,
    pub max_cold: usize,
    pub min_recommended: usize,
    pub max_recommended: usize,
    pub sum_offset: u8,
    pub span_offset: u8,
    pub pattern_affinity_count: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            recommend_window: 50,
            cold_gap_threshold: 8,
            hot_count: 3,
            max_hot_in_recommendation: 2,
            max_cold: 2,
            min_recommended: 3,
            max_recommended: 4,
            sum_offset: 3,
            span_offset: 2,
            pattern_affinity_count: 2,
        }
    }
}

impl AnalysisConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read {:?}", path))?;
        let config: AnalysisConfig = serde_json::from_str(&json)
            .with_context(|| format!("Invalid JSON in {:?}", path))?;
        log::info!("analysis config loaded from {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Cannot write {:?}", path))?;
        Ok(())
    }
}
