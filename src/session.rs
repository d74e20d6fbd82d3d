//! One analyst session: the one-time dataset load plus the live selection.

use crate::data_source::{load_dataset, FALLBACK_DATASET_SOURCE, PRIMARY_DATASET_SOURCE};
use crate::dataset::Dataset;
use crate::interpretation::LatentExplanations;
use crate::selection::Selection;

/// How many latents are preselected after a successful load, so the
/// dashboard has something to show right away.
pub const INITIAL_SELECTION_LIMIT: usize = 5;

/// Where the one-time dataset load stands. `Failed` is terminal; there is no
/// automatic recovery and no retry beyond the single fallback attempt.
#[derive(Clone, Debug, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready(Dataset),
    Failed(String),
}

/// Everything above runs synchronously on the caller's thread; the session
/// itself is the loading flag that keeps a second load from being triggered
/// while one is outstanding.
#[derive(Clone, Debug, Default)]
pub struct Session {
    state: LoadState,
    pub selection: Selection,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, LoadState::Loading)
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        match &self.state {
            LoadState::Ready(dataset) => Some(dataset),
            _ => None,
        }
    }

    pub fn load_error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Resolve the pending load. A success seeds the selection with the
    /// first few latents; a failure is terminal.
    pub fn finish_load(&mut self, result: Result<Dataset, String>) {
        match result {
            Ok(dataset) => {
                let initial: Vec<String> = dataset
                    .ids()
                    .iter()
                    .take(INITIAL_SELECTION_LIMIT)
                    .cloned()
                    .collect();
                self.selection.select_all(&initial);
                self.state = LoadState::Ready(dataset);
            }
            Err(message) => self.state = LoadState::Failed(message),
        }
    }

    /// Run the load against explicit sources. A session that already reached
    /// `Ready` or `Failed` never loads again.
    pub fn load_from(&mut self, primary: &str, fallback: &str) {
        if !self.is_loading() {
            return;
        }
        let result = load_dataset(primary, fallback);
        self.finish_load(result);
    }

    pub fn load_default(&mut self) {
        self.load_from(PRIMARY_DATASET_SOURCE, FALLBACK_DATASET_SOURCE);
    }

    /// Replace the selection with one random latent from the whole dataset.
    pub fn select_random(&mut self) {
        let LoadState::Ready(dataset) = &self.state else {
            return;
        };
        let pool = dataset.ids().to_vec();
        self.selection.select_random(&pool, &mut rand::thread_rng());
    }

    /// Replace the selection with one random latent that has a curated
    /// explanation and is present in the dataset.
    pub fn select_random_explained(&mut self, explanations: &LatentExplanations) {
        let LoadState::Ready(dataset) = &self.state else {
            return;
        };
        let pool: Vec<String> = dataset
            .ids()
            .iter()
            .filter(|id| explanations.get(id).is_some())
            .cloned()
            .collect();
        self.selection.select_random(&pool, &mut rand::thread_rng());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn ready_session() -> Session {
        let dataset = Dataset::from_json_text(
            r#"{
            "1": {"activations": []},
            "2": {"activations": []},
            "3": {"activations": []},
            "4": {"activations": []},
            "5": {"activations": []},
            "6": {"activations": []},
            "7": {"activations": []}
        }"#,
        )
        .unwrap();
        let mut session = Session::new();
        session.finish_load(Ok(dataset));
        session
    }

    #[test]
    fn test_successful_load_seeds_selection() {
        let session = ready_session();
        assert!(!session.is_loading());
        assert!(session.dataset().is_some());
        assert_eq!(session.selection.ids(), ["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_failed_load_is_terminal() {
        let mut session = Session::new();
        assert!(session.is_loading());
        session.finish_load(Err("both sources down".to_string()));
        assert_eq!(session.load_error(), Some("both sources down"));
        assert!(session.dataset().is_none());

        // Terminal state never reloads
        session.load_from("anything.json", "anything-else.json");
        assert_eq!(session.load_error(), Some("both sources down"));
    }

    #[test]
    fn test_load_from_file_sources() {
        let td = tempfile::tempdir().unwrap();
        let primary = td.path().join("latents_data.json");
        std::fs::write(
            &primary,
            r#"{"42": {"activations": [{"input": "ACGT", "value": 1.0, "context": "A|ACGT|T"}]}}"#,
        )
        .unwrap();

        let mut session = Session::new();
        session.load_from(
            &primary.to_string_lossy(),
            &td.path().join("missing.json").to_string_lossy(),
        );
        assert!(session.dataset().is_some());
        assert_eq!(session.selection.ids(), ["42"]);
    }

    #[test]
    fn test_select_random_draws_from_dataset() {
        let mut session = ready_session();
        session.select_random();
        assert_eq!(session.selection.len(), 1);
        assert!(session.dataset().unwrap().get(&session.selection.ids()[0]).is_some());
    }

    #[test]
    fn test_select_random_explained_pool() {
        let mut session = ready_session();
        let mut texts = HashMap::new();
        texts.insert("3".to_string(), "Tracks a toy motif.".to_string());
        texts.insert("999".to_string(), "Not in this dataset.".to_string());
        let explanations = LatentExplanations::from_texts(texts);

        session.select_random_explained(&explanations);
        assert_eq!(session.selection.ids(), ["3"]);
    }
}
