//! Loading the precomputed latent dataset from its well-known sources.

use crate::dataset::Dataset;
use std::fs;
use std::path::PathBuf;

/// Well-known dataset locations, tried in fixed order.
pub const PRIMARY_DATASET_SOURCE: &str = "latents_data.json";
pub const FALLBACK_DATASET_SOURCE: &str = "data/latents_data.json";

fn is_http_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch one source to a string. A source is an http(s) URL, a `file://`
/// URL, or a plain filesystem path.
pub fn read_source(source: &str) -> Result<String, String> {
    if is_http_source(source) {
        let response = reqwest::blocking::get(source)
            .map_err(|e| format!("Could not fetch '{source}': {e}"))?
            .error_for_status()
            .map_err(|e| format!("Could not fetch '{source}': {e}"))?;
        return response
            .text()
            .map_err(|e| format!("Could not read body of '{source}': {e}"));
    }
    let path = if let Some(stripped) = source.strip_prefix("file://") {
        PathBuf::from(stripped)
    } else {
        PathBuf::from(source)
    };
    fs::read_to_string(&path)
        .map_err(|e| format!("Could not read dataset file '{}': {e}", path.display()))
}

/// Fetch and normalize one source.
pub fn load_from_source(source: &str) -> Result<Dataset, String> {
    let text = read_source(source)?;
    Dataset::from_json_text(&text)
        .map_err(|e| format!("Could not parse dataset from '{source}': {e}"))
}

/// Try the primary source, then the fallback as a fully independent second
/// attempt. Both failing is terminal; there is no retry loop.
pub fn load_dataset(primary: &str, fallback: &str) -> Result<Dataset, String> {
    match load_from_source(primary) {
        Ok(dataset) => {
            log::info!("Loaded {} latents from '{primary}'", dataset.len());
            Ok(dataset)
        }
        Err(primary_err) => {
            log::warn!("{primary_err}; trying fallback '{fallback}'");
            match load_from_source(fallback) {
                Ok(dataset) => {
                    log::info!("Loaded {} latents from fallback '{fallback}'", dataset.len());
                    Ok(dataset)
                }
                Err(fallback_err) => Err(format!("{primary_err}; {fallback_err}")),
            }
        }
    }
}

pub fn load_default_dataset() -> Result<Dataset, String> {
    load_dataset(PRIMARY_DATASET_SOURCE, FALLBACK_DATASET_SOURCE)
}
