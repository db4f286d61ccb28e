//! Fallback card selection.

use rand::seq::SliceRandom;
use rand::Rng;
use tod_core::{ContentType, DedupStore, DifficultyLevel};

use crate::catalog::FallbackCatalog;

/// Picks a catalog card, preferring ones not yet emitted.
pub struct FallbackSelector;

impl FallbackSelector {
    /// Select a card for the pair.
    ///
    /// Entries already in `dedup` are skipped and one of the rest is chosen
    /// uniformly. When every entry has been used, the first one is returned.
    /// The result is always a member of the pair's list.
    pub fn select<'a, R: Rng + ?Sized>(
        catalog: &'a FallbackCatalog,
        content_type: ContentType,
        level: DifficultyLevel,
        dedup: Option<&dyn DedupStore>,
        rng: &mut R,
    ) -> &'a str {
        let entries = catalog.entries(content_type, level);
        debug_assert!(!entries.is_empty(), "Catalog pairs are never empty");

        let fresh: Vec<&String> = entries
            .iter()
            .filter(|entry| dedup.map_or(true, |store| !store.contains(entry)))
            .collect();

        match fresh.choose(rng) {
            Some(&entry) => entry.as_str(),
            None => entries.first().map(String::as_str).unwrap_or_default(),
        }
    }
}
