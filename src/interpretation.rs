//! Per-latent interpretation summaries and the curated explanation table.

use crate::dataset::Latent;
use crate::search::annotation_tokens;
use crate::thresholds::Thresholds;
use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;

const RUNTIME_EXPLANATIONS_PATH: &str = "data/resources/latent_explanations.json";
const BUILTIN_EXPLANATIONS_JSON: &str = include_str!("../assets/latent_explanations.json");

/// What a latent appears to be detecting, distilled from its significant
/// activations.
#[derive(Clone, Debug, Serialize)]
pub struct LatentInterpretation {
    pub latent_id: String,
    pub dead: bool,
    pub threshold: Option<f64>,
    /// Distinct annotation tokens on at-or-above-threshold records, in order
    /// of appearance.
    pub significant_annotations: Vec<String>,
    /// Distinct motifs on at-or-above-threshold records, in order of
    /// appearance.
    pub significant_motifs: Vec<String>,
}

impl LatentInterpretation {
    /// One-line summary for display next to the activation chart.
    pub fn headline(&self) -> String {
        if self.dead {
            return "This latent shows no activation on the analyzed inputs.".to_string();
        }
        let annotations = match self.significant_annotations.as_slice() {
            [] => "unknown functions".to_string(),
            tokens => tokens.iter().take(2).join(", "),
        };
        let motifs = match self.significant_motifs.as_slice() {
            [] => "not clearly defined".to_string(),
            motifs => motifs.iter().take(3).join(", "),
        };
        format!(
            "This latent appears to be detecting patterns related to {annotations}. \
             The significant motifs activating this latent are {motifs}."
        )
    }
}

/// Summarize one latent against its significance cutoff. Dead latents get a
/// fixed no-activation interpretation with the threshold suppressed.
pub fn interpret_latent(latent: &Latent, thresholds: &Thresholds) -> LatentInterpretation {
    if latent.is_dead() {
        return LatentInterpretation {
            latent_id: latent.id.clone(),
            dead: true,
            threshold: None,
            significant_annotations: vec![],
            significant_motifs: vec![],
        };
    }
    let significant = thresholds.significant_records(latent);
    LatentInterpretation {
        latent_id: latent.id.clone(),
        dead: false,
        threshold: thresholds.threshold_for(latent),
        significant_annotations: significant
            .iter()
            .flat_map(|record| annotation_tokens(&record.annotations))
            .unique()
            .collect(),
        significant_motifs: significant
            .iter()
            .map(|record| record.input.clone())
            .filter(|motif| !motif.is_empty())
            .unique()
            .collect(),
    }
}

/// Analyst-written explanations for individual latents, keyed by id.
#[derive(Clone, Debug)]
pub struct LatentExplanations {
    texts: HashMap<String, String>,
}

impl LatentExplanations {
    fn new(json_text: &str) -> Result<Self> {
        let texts: HashMap<String, String> = serde_json::from_str(json_text)?;
        Ok(Self { texts })
    }

    pub fn from_texts(texts: HashMap<String, String>) -> Self {
        Self { texts }
    }

    #[inline(always)]
    pub fn get(&self, latent_id: &str) -> Option<&str> {
        self.texts.get(latent_id).map(String::as_str)
    }

    pub fn explained_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.texts.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

impl Default for LatentExplanations {
    fn default() -> Self {
        let base =
            Self::new(BUILTIN_EXPLANATIONS_JSON).expect("Invalid builtin latent explanations");
        if let Ok(text) = fs::read_to_string(RUNTIME_EXPLANATIONS_PATH) {
            if let Ok(custom) = Self::new(&text) {
                if !custom.texts.is_empty() {
                    return custom;
                }
            }
        }
        base
    }
}
