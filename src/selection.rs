//! The set of latents currently chosen for display.

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

/// Display-ordered, duplicate-free latent id list. Membership is the only
/// semantic, but insertion order is kept so charts do not jump around when
/// the selection changes.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct Selection {
    ids: Vec<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|selected| selected == id)
    }

    /// Remove `id` if present, else append it.
    pub fn toggle(&mut self, id: &str) {
        if let Some(position) = self.ids.iter().position(|selected| selected == id) {
            self.ids.remove(position);
        } else {
            self.ids.push(id.to_string());
        }
    }

    /// Replace the selection wholesale, keeping the first occurrence of any
    /// repeated id.
    pub fn select_all(&mut self, ids: &[String]) {
        self.ids = ids.iter().cloned().unique().collect();
    }

    pub fn select_none(&mut self) {
        self.ids.clear();
    }

    /// Group checkbox semantics: if every id of `group` is already selected,
    /// drop them all; otherwise append the missing ones in group order and
    /// leave the rest untouched.
    pub fn select_group(&mut self, group: &[String]) {
        let all_selected = group.iter().all(|id| self.contains(id));
        if all_selected {
            self.ids.retain(|id| !group.contains(id));
        } else {
            for id in group {
                if !self.contains(id) {
                    self.ids.push(id.clone());
                }
            }
        }
    }

    /// Replace the selection with exactly the filtered set.
    pub fn select_found(&mut self, found: &[String]) {
        self.select_all(found);
    }

    /// Replace the selection with one uniformly chosen id from `pool`.
    /// An empty pool clears the selection.
    pub fn select_random<R: Rng + ?Sized>(&mut self, pool: &[String], rng: &mut R) {
        self.ids = pool
            .choose(rng)
            .map(|id| vec![id.clone()])
            .unwrap_or_default();
    }
}
