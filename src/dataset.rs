//! Canonical in-memory form of the precomputed latent activation dataset.

use crate::gc_content::gc_fraction;
use anyhow::{anyhow, Result};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;

/// One observed input sequence and the latent's response to it.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct ActivationRecord {
    /// Short genomic token (the motif).
    pub input: String,
    /// Non-negative activation strength.
    pub value: f64,
    /// Genomic neighborhood of the motif, written `prefix|motif|suffix`.
    pub context: String,
    /// Known biological function label(s); may be empty.
    pub annotations: String,
    /// Statistical significance of the match, display-only.
    #[serde(rename = "e-value")]
    pub e_value: String,
    /// Derived from `context` at normalization time, never supplied raw.
    pub gc_content: f64,
}

impl ActivationRecord {
    /// Split the pipe-delimited context into (prefix, motif, suffix).
    /// A context without both delimiters degrades to empty flanks around the
    /// record's own input.
    pub fn context_parts(&self) -> (&str, &str, &str) {
        let mut parts = self.context.split('|');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(prefix), Some(motif), Some(suffix)) => (prefix, motif, suffix),
            _ => ("", self.input.as_str(), ""),
        }
    }
}

/// One unit of the autoencoder with its observed activations, most-activating
/// first as emitted by the upstream analysis job.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Latent {
    pub id: String,
    pub activations: Vec<ActivationRecord>,
}

impl Latent {
    pub fn max_activation(&self) -> f64 {
        self.activations
            .iter()
            .map(|record| record.value)
            .fold(0.0, f64::max)
    }

    pub fn mean_activation(&self) -> f64 {
        if self.activations.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.activations.iter().map(|record| record.value).sum();
        sum / self.activations.len() as f64
    }

    /// A latent with no activations, or whose maximum activation is zero,
    /// never crosses any significance threshold.
    pub fn is_dead(&self) -> bool {
        self.activations.is_empty() || self.max_activation() == 0.0
    }

    pub fn activation_values(&self) -> Vec<f64> {
        self.activations.iter().map(|record| record.value).collect()
    }
}

/// Counts the dashboard header shows for a loaded dataset.
#[derive(Clone, Debug, Serialize)]
pub struct DatasetSummary {
    pub latent_count: usize,
    pub record_count: usize,
    pub dead_latents: Vec<String>,
}

/// All latents of one load, keyed by id, iterated in source order.
/// Read-only after construction.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Dataset {
    latents: HashMap<String, Latent>,
    order: Vec<String>,
}

/// The two payload shapes the upstream analysis job emits.
#[derive(Clone, Copy, Debug, PartialEq)]
enum RawShape {
    /// `{id: {"activations": [...]}}` — records already shaped.
    PreShaped,
    /// `{id: [token objects]}` — raw per-token export.
    TokenExport,
}

impl Dataset {
    pub fn from_json_text(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_json_value(&raw)
    }

    pub fn from_json_file(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_text(&text)
    }

    /// Normalize either payload variant into the canonical dataset.
    ///
    /// The shape is sniffed once from a sample value; per-record defects
    /// degrade to defaults instead of failing the load. Only a payload that
    /// is not a non-empty JSON object of one of the two known shapes is an
    /// error.
    pub fn from_json_value(raw: &Value) -> Result<Self> {
        let map = raw
            .as_object()
            .ok_or(anyhow!("Dataset payload is not a JSON object"))?;
        let Some(sample) = map.values().next() else {
            return Err(anyhow!("Dataset payload is empty"));
        };
        let shape = detect_shape(sample)?;

        let entries: Vec<(&String, &Value)> = map.iter().collect();
        let latents: Vec<Latent> = entries
            .par_iter()
            .map(|&(id, value)| match shape {
                RawShape::PreShaped => latent_from_pre_shaped(id, value),
                RawShape::TokenExport => latent_from_token_export(id, value),
            })
            .collect();

        let mut ret = Self::default();
        for latent in latents {
            validate_activation_order(&latent);
            ret.order.push(latent.id.clone());
            ret.latents.insert(latent.id.clone(), latent);
        }
        Ok(ret)
    }

    #[inline(always)]
    pub fn get(&self, id: &str) -> Option<&Latent> {
        self.latents.get(id)
    }

    /// Latent ids in source order.
    #[inline(always)]
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Latents in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Latent> {
        self.order.iter().filter_map(|id| self.latents.get(id))
    }

    pub fn record_count(&self) -> usize {
        self.iter().map(|latent| latent.activations.len()).sum()
    }

    pub fn dead_latent_ids(&self) -> Vec<String> {
        self.iter()
            .filter(|latent| latent.is_dead())
            .map(|latent| latent.id.clone())
            .collect()
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            latent_count: self.len(),
            record_count: self.record_count(),
            dead_latents: self.dead_latent_ids(),
        }
    }
}

fn detect_shape(sample: &Value) -> Result<RawShape> {
    if sample
        .as_object()
        .is_some_and(|obj| obj.contains_key("activations"))
    {
        return Ok(RawShape::PreShaped);
    }
    if sample.is_array() {
        return Ok(RawShape::TokenExport);
    }
    Err(anyhow!(
        "Unrecognized dataset shape: values are neither activation objects nor token arrays"
    ))
}

fn latent_from_pre_shaped(id: &str, value: &Value) -> Latent {
    let activations = value
        .get("activations")
        .and_then(Value::as_array)
        .map(|records| records.iter().map(record_from_value).collect())
        .unwrap_or_default();
    Latent {
        id: id.to_string(),
        activations,
    }
}

fn latent_from_token_export(id: &str, value: &Value) -> Latent {
    let activation_key = format!("latent_{id}");
    let activations = value
        .as_array()
        .map(|tokens| {
            tokens
                .iter()
                .map(|token| record_from_token(token, &activation_key))
                .collect()
        })
        .unwrap_or_default();
    Latent {
        id: id.to_string(),
        activations,
    }
}

fn record_from_value(value: &Value) -> ActivationRecord {
    let context = string_field(value, "context");
    ActivationRecord {
        input: string_field(value, "input"),
        value: value.get("value").and_then(Value::as_f64).unwrap_or(0.0),
        annotations: annotation_text(value.get("annotations")),
        e_value: e_value_text(value.get("e-value")),
        gc_content: gc_fraction(&context),
        context,
    }
}

fn record_from_token(token: &Value, activation_key: &str) -> ActivationRecord {
    let context = string_field(token, "context");
    let annotations = {
        let primary = annotation_text(token.get("annotations"));
        if primary.is_empty() {
            annotation_text(token.get("annotation"))
        } else {
            primary
        }
    };
    ActivationRecord {
        input: string_field(token, "token"),
        value: token.get(activation_key).and_then(Value::as_f64).unwrap_or(0.0),
        annotations,
        e_value: e_value_text(token.get("e-value")),
        gc_content: gc_fraction(&context),
        context,
    }
}

// Annotations arrive as a plain string or as a list; lists collapse to a
// comma-joined string, matching how the upstream export prints them.
fn annotation_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|part| match part {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn e_value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        _ => "0.0".to_string(),
    }
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

// The upstream job emits activations sorted by descending value; dead-latent
// detection and the display both lean on that, so a violation is called out
// instead of silently assumed. The order itself is preserved as received.
fn validate_activation_order(latent: &Latent) {
    let sorted = latent
        .activations
        .windows(2)
        .all(|pair| pair[0].value >= pair[1].value);
    if !sorted {
        log::warn!(
            "Latent {} activations are not sorted by descending value",
            latent.id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARIANT_A: &str = r#"{
        "12": {
            "activations": [
                {"input": "TATAAT", "value": 2.5, "context": "GGC|TATAAT|ACT", "annotations": "['promoter', 'TATA-box']", "e-value": "1.2e-8"},
                {"input": "TATGAT", "value": 0.4, "context": "AAA|TATGAT|GGG", "annotations": "promoter", "e-value": "3.1e-2"}
            ]
        },
        "7": {
            "activations": [
                {"input": "GGCGCC", "value": 1.1, "context": "TT|GGCGCC|AA", "annotations": [], "e-value": 0.004}
            ]
        }
    }"#;

    const VARIANT_B: &str = r#"{
        "12": [
            {"token": "TATAAT", "context": "GGC|TATAAT|ACT", "latent_12": 2.5, "annotations": "['promoter', 'TATA-box']", "e-value": "1.2e-8"},
            {"token": "TATGAT", "context": "AAA|TATGAT|GGG", "latent_12": 0.4, "annotation": "promoter", "e-value": "3.1e-2"}
        ]
    }"#;

    #[test]
    fn test_variant_a_normalization() {
        let dataset = Dataset::from_json_text(VARIANT_A).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.ids(), ["12", "7"]);

        let latent = dataset.get("12").unwrap();
        assert_eq!(latent.activations.len(), 2);
        let first = &latent.activations[0];
        assert_eq!(first.input, "TATAAT");
        assert_eq!(first.value, 2.5);
        assert_eq!(first.annotations, "['promoter', 'TATA-box']");
        assert_eq!(first.e_value, "1.2e-8");
        // gc over "GGCTATAATACT": 4 of 12
        assert_eq!(first.gc_content, 4.0 / 12.0);
    }

    #[test]
    fn test_variant_b_matches_variant_a() {
        let a = Dataset::from_json_text(VARIANT_A).unwrap();
        let b = Dataset::from_json_text(VARIANT_B).unwrap();
        let from_a = a.get("12").unwrap();
        let from_b = b.get("12").unwrap();
        assert_eq!(from_a.activations[0], from_b.activations[0]);
        // The alternate annotation field fills in when the primary is absent
        assert_eq!(from_b.activations[1].annotations, "promoter");
        assert_eq!(from_b.activations[1].value, 0.4);
    }

    #[test]
    fn test_token_export_defaults() {
        let text = r#"{"3": [{"token": "ACGT", "context": "A|ACGT|T"}]}"#;
        let dataset = Dataset::from_json_text(text).unwrap();
        let record = &dataset.get("3").unwrap().activations[0];
        assert_eq!(record.value, 0.0);
        assert_eq!(record.annotations, "");
        assert_eq!(record.e_value, "0.0");
    }

    #[test]
    fn test_rejects_non_object_payloads() {
        assert!(Dataset::from_json_text("[]").is_err());
        assert!(Dataset::from_json_text("{}").is_err());
        assert!(Dataset::from_json_text(r#"{"1": 42}"#).is_err());
        assert!(Dataset::from_json_text("not json").is_err());
    }

    #[test]
    fn test_from_json_file() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("latents.json");
        std::fs::write(&path, VARIANT_A).unwrap();
        let dataset = Dataset::from_json_file(&path.to_string_lossy()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert!(Dataset::from_json_file("no_such_file.json").is_err());
    }

    #[test]
    fn test_source_order_preserved() {
        let text = r#"{
            "9": {"activations": []},
            "2": {"activations": []},
            "150": {"activations": []}
        }"#;
        let dataset = Dataset::from_json_text(text).unwrap();
        assert_eq!(dataset.ids(), ["9", "2", "150"]);
    }

    #[test]
    fn test_dead_latents() {
        let text = r#"{
            "1": {"activations": []},
            "2": {"activations": [{"input": "AC", "value": 0.0, "context": "A|AC|G"}]},
            "3": {"activations": [{"input": "AC", "value": 0.5, "context": "A|AC|G"}]}
        }"#;
        let dataset = Dataset::from_json_text(text).unwrap();
        assert!(dataset.get("1").unwrap().is_dead());
        assert!(dataset.get("2").unwrap().is_dead());
        assert!(!dataset.get("3").unwrap().is_dead());
        assert_eq!(dataset.dead_latent_ids(), ["1", "2"]);

        let summary = dataset.summary();
        assert_eq!(summary.latent_count, 3);
        assert_eq!(summary.record_count, 2);
    }

    #[test]
    fn test_context_parts() {
        let dataset = Dataset::from_json_text(VARIANT_A).unwrap();
        let record = &dataset.get("12").unwrap().activations[0];
        assert_eq!(record.context_parts(), ("GGC", "TATAAT", "ACT"));

        let undelimited = ActivationRecord {
            input: "ACGT".to_string(),
            context: "ACGTACGT".to_string(),
            ..Default::default()
        };
        assert_eq!(undelimited.context_parts(), ("", "ACGT", ""));
    }

    #[test]
    fn test_latent_statistics() {
        let dataset = Dataset::from_json_text(VARIANT_A).unwrap();
        let latent = dataset.get("12").unwrap();
        assert_eq!(latent.max_activation(), 2.5);
        assert_eq!(latent.mean_activation(), (2.5 + 0.4) / 2.0);
        assert_eq!(latent.activation_values(), [2.5, 0.4]);
    }
}
