use glossary::Glossary;
use interpretation::LatentExplanations;
use lazy_static::lazy_static;
use thresholds::Thresholds;

pub mod csv_export;
pub mod data_source;
pub mod dataset;
pub mod gc_content;
pub mod glossary;
pub mod interpretation;
pub mod search;
pub mod selection;
pub mod session;
pub mod thresholds;

lazy_static! {
    // Curated per-latent threshold overrides
    pub static ref THRESHOLDS: Thresholds = Thresholds::default();

    // Analyst-written latent explanations
    pub static ref EXPLANATIONS: LatentExplanations = LatentExplanations::default();

    // Dashboard terminology
    pub static ref GLOSSARY: Glossary = Glossary::default();
}
