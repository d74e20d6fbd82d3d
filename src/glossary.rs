//! Analyst-facing glossary of dashboard terminology.

use csv::ReaderBuilder;
use std::collections::HashMap;

pub struct Glossary {
    definitions: HashMap<String, String>,
}

impl Glossary {
    fn from_text(csv_text: &str) -> Self {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .from_reader(csv_text.as_bytes());

        let mut definitions = HashMap::new();
        for record in rdr.records().flatten() {
            if let (Some(term), Some(definition)) = (record.get(0), record.get(1)) {
                definitions.insert(term.to_lowercase(), definition.to_string());
            }
        }

        Self { definitions }
    }

    /// Look up a term, case-insensitively.
    pub fn get(&self, term: &str) -> Option<&str> {
        self.definitions.get(&term.to_lowercase()).map(String::as_str)
    }

    pub fn terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.definitions.keys().cloned().collect();
        terms.sort_unstable();
        terms
    }
}

impl Default for Glossary {
    fn default() -> Self {
        let text = include_str!("../assets/glossary.csv");
        Self::from_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let glossary = Glossary::default();
        assert_eq!(
            glossary.get("dead latent"),
            Some("A latent whose maximum observed activation across the dataset is zero.")
        );
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let glossary = Glossary::default();
        assert_eq!(glossary.get("GC content"), glossary.get("gc content"));
        assert_eq!(glossary.get("no such term"), None);
    }

    #[test]
    fn test_terms_listing() {
        let glossary = Glossary::default();
        let terms = glossary.terms();
        assert!(terms.contains(&"latent".to_string()));
        assert!(terms.contains(&"threshold".to_string()));
    }
}
