//! Significance cutoffs separating a latent's signal from its background.

use crate::dataset::{ActivationRecord, Latent};
use anyhow::Result;
use std::collections::HashMap;
use std::fs;

const RUNTIME_OVERRIDES_PATH: &str = "data/resources/threshold_overrides.json";
const BUILTIN_OVERRIDES_JSON: &str = include_str!("../assets/threshold_overrides.json");

/// Curated per-latent cutoffs plus the computed fallback heuristic.
/// Overrides always win over the heuristic.
#[derive(Clone, Debug)]
pub struct Thresholds {
    overrides: HashMap<String, f64>,
}

impl Thresholds {
    fn new(json_text: &str) -> Result<Self> {
        let overrides: HashMap<String, f64> = serde_json::from_str(json_text)?;
        Ok(Self { overrides })
    }

    pub fn from_overrides(overrides: HashMap<String, f64>) -> Self {
        Self { overrides }
    }

    #[inline(always)]
    pub fn override_for(&self, latent_id: &str) -> Option<f64> {
        self.overrides.get(latent_id).copied()
    }

    /// Cutoff for one latent's activation values.
    ///
    /// An explicit override is returned as-is; otherwise the midpoint
    /// heuristic over `values`. `None` means the latent is dead and all
    /// significance logic must be suppressed for it.
    pub fn threshold(&self, latent_id: &str, values: &[f64]) -> Option<f64> {
        if let Some(fixed) = self.override_for(latent_id) {
            return Some(fixed);
        }
        significance_cutoff(values)
    }

    pub fn threshold_for(&self, latent: &Latent) -> Option<f64> {
        if latent.is_dead() {
            return None;
        }
        self.threshold(&latent.id, &latent.activation_values())
    }

    /// Records at or above the latent's cutoff (inclusive comparison).
    /// Empty for dead latents.
    pub fn significant_records<'a>(&self, latent: &'a Latent) -> Vec<&'a ActivationRecord> {
        match self.threshold_for(latent) {
            Some(cutoff) => latent
                .activations
                .iter()
                .filter(|record| record.value >= cutoff)
                .collect(),
            None => vec![],
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        let base = Self::new(BUILTIN_OVERRIDES_JSON).expect("Invalid builtin threshold overrides");
        if let Ok(text) = fs::read_to_string(RUNTIME_OVERRIDES_PATH) {
            if let Ok(custom) = Self::new(&text) {
                if !custom.overrides.is_empty() {
                    return custom;
                }
            }
        }
        base
    }
}

/// Midpoint between the mean and the maximum activation. This partitions
/// significant from background activations for summary display; it is not a
/// statistical test. `None` when there is no signal at all.
pub fn significance_cutoff(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max == 0.0 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    Some(mean + (max - mean) * 0.5)
}
