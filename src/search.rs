//! Search, filtering and grouping over the latent id space.

use crate::dataset::{Dataset, Latent};
use crate::thresholds::Thresholds;
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::str::FromStr;

lazy_static! {
    // Upstream annotation lists print as "['promoter', 'enhancer']"
    static ref ANNOTATION_PUNCTUATION: Regex =
        Regex::new(r#"[\[\]'"]"#).expect("Invalid annotation punctuation pattern");
}

pub const SEARCH_RESULTS_GROUP: &str = "Search Results";
pub const UNPARSED_GROUP: &str = "unparsed";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    /// Match against the latent id itself.
    Id,
    /// Match against annotations and motif sequences.
    Content,
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "id" => Ok(SearchMode::Id),
            "content" | "interpretation" => Ok(SearchMode::Content),
            other => Err(format!(
                "Unknown search mode '{other}', expected 'id' or 'content'"
            )),
        }
    }
}

/// Distinct annotation tokens of one raw annotation string: bracket/quote
/// punctuation stripped, split on commas, trimmed, empties dropped.
pub fn annotation_tokens(raw: &str) -> Vec<String> {
    ANNOTATION_PUNCTUATION
        .replace_all(raw, "")
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ids of the latents matching `query`, in dataset order. An empty query
/// matches everything.
pub fn filter_latents(
    dataset: &Dataset,
    thresholds: &Thresholds,
    query: &str,
    mode: SearchMode,
) -> Vec<String> {
    if query.is_empty() {
        return dataset.ids().to_vec();
    }
    match mode {
        SearchMode::Id => filter_by_id(dataset, query),
        SearchMode::Content => filter_by_content(dataset, thresholds, query),
    }
}

fn is_all_digits(query: &str) -> bool {
    !query.is_empty() && query.chars().all(|c| c.is_ascii_digit())
}

// An all-digit query asks for one specific latent and matches its id exactly,
// regardless of query length; anything else is a case-insensitive substring
// match on the id.
fn filter_by_id(dataset: &Dataset, query: &str) -> Vec<String> {
    if is_all_digits(query) {
        return dataset
            .ids()
            .iter()
            .filter(|id| id.as_str() == query)
            .cloned()
            .collect();
    }
    let needle = query.to_lowercase();
    dataset
        .ids()
        .iter()
        .filter(|id| id.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

fn filter_by_content(dataset: &Dataset, thresholds: &Thresholds, query: &str) -> Vec<String> {
    let needle = query.to_lowercase();
    dataset
        .iter()
        .filter(|latent| latent_matches_content(latent, thresholds, &needle))
        .map(|latent| latent.id.clone())
        .collect()
}

fn latent_matches_content(latent: &Latent, thresholds: &Thresholds, needle: &str) -> bool {
    if latent.is_dead() {
        return false;
    }
    let significant = thresholds.significant_records(latent);
    let annotation_hit = significant.iter().any(|record| {
        annotation_tokens(&record.annotations)
            .iter()
            .any(|token| token.to_lowercase().contains(needle))
    });
    let motif_hit = significant
        .iter()
        .any(|record| record.input.to_lowercase().contains(needle));
    if annotation_hit || motif_hit {
        return true;
    }
    // A latent can be labeled only on background records; check those before
    // concluding no match
    latent.activations.iter().any(|record| {
        annotation_tokens(&record.annotations)
            .iter()
            .any(|token| token.to_lowercase().contains(needle))
    })
}

/// Ordered (label, ids) buckets for the selector dropdown.
///
/// Without an active query (or with an id-mode query carrying no digits at
/// all) the ids partition into decade buckets of one hundred, labeled
/// `"N-N+99"`, in first-appearance order. Ids without a parseable numeric
/// form go to a dedicated [`UNPARSED_GROUP`] bucket. Any other active query
/// produces a single [`SEARCH_RESULTS_GROUP`] bucket in filtered order.
pub fn group_latents(
    filtered_ids: &[String],
    query: &str,
    mode: SearchMode,
) -> Vec<(String, Vec<String>)> {
    let grouping_active = query.is_empty()
        || (mode == SearchMode::Id && !query.chars().any(|c| c.is_ascii_digit()));
    if !grouping_active {
        return vec![(SEARCH_RESULTS_GROUP.to_string(), filtered_ids.to_vec())];
    }

    let mut order: Vec<String> = vec![];
    let mut buckets: HashMap<String, Vec<String>> = HashMap::new();
    for id in filtered_ids {
        let label = match id.parse::<u64>() {
            Ok(numeric) => {
                let base = numeric / 100 * 100;
                format!("{base}-{}", base + 99)
            }
            Err(_) => UNPARSED_GROUP.to_string(),
        };
        if !buckets.contains_key(&label) {
            order.push(label.clone());
        }
        buckets.entry(label).or_default().push(id.clone());
    }
    order
        .into_iter()
        .map(|label| {
            let ids = buckets.remove(&label).unwrap_or_default();
            (label, ids)
        })
        .collect()
}

/// Index of monosemantic latents: latents whose significant activations carry
/// exactly one distinct annotation token, keyed by that annotation.
#[derive(Clone, Debug, Default, Serialize)]
pub struct MonosemanticIndex {
    latents_by_annotation: HashMap<String, Vec<String>>,
    annotation_order: Vec<String>,
}

impl MonosemanticIndex {
    pub fn ids_for(&self, annotation: &str) -> Option<&[String]> {
        self.latents_by_annotation
            .get(annotation)
            .map(Vec::as_slice)
    }

    /// Every monosemantic latent id, in dataset order.
    pub fn latent_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = vec![];
        for annotation in &self.annotation_order {
            if let Some(latents) = self.latents_by_annotation.get(annotation) {
                ids.extend(latents.iter().cloned());
            }
        }
        ids
    }

    pub fn latent_count(&self) -> usize {
        self.latents_by_annotation.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.annotation_order.is_empty()
    }

    /// (annotation, latent count) pairs, descending by count; ties keep
    /// first-appearance order.
    pub fn annotation_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .annotation_order
            .iter()
            .map(|annotation| {
                let count = self
                    .latents_by_annotation
                    .get(annotation)
                    .map_or(0, Vec::len);
                (annotation.clone(), count)
            })
            .collect();
        counts.sort_by_key(|(_, count)| Reverse(*count));
        counts
    }
}

/// Build the monosemantic index for a dataset. Dead latents and latents with
/// zero or two-plus distinct significant annotations are excluded.
pub fn monosemantic_index(dataset: &Dataset, thresholds: &Thresholds) -> MonosemanticIndex {
    let mut index = MonosemanticIndex::default();
    for latent in dataset.iter() {
        if latent.is_dead() {
            continue;
        }
        let distinct: Vec<String> = thresholds
            .significant_records(latent)
            .iter()
            .flat_map(|record| annotation_tokens(&record.annotations))
            .unique()
            .collect();
        let [sole] = distinct.as_slice() else {
            continue;
        };
        if !index.latents_by_annotation.contains_key(sole) {
            index.annotation_order.push(sole.clone());
        }
        index
            .latents_by_annotation
            .entry(sole.clone())
            .or_default()
            .push(latent.id.clone());
    }
    index
}
