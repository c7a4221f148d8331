//! Diversified selection over ranked candidates
//!
//! Four passes over the ranked list, each skipping products already picked:
//! up to two picks from the user's own categories, then other categories
//! until four picks, then one pick from anywhere, then fill in rank order
//! up to [`MAX_RESULTS`].

use std::collections::HashSet;

use super::scoring::Candidate;
use crate::catalog::CatalogItem;

/// Upper bound on recommendations returned
pub const MAX_RESULTS: usize = 10;

const SAME_CATEGORY_PICKS: usize = 2;
const DIVERSE_TARGET: usize = 4;

/// Picked items plus the set of picked product keys
struct Picks {
    selected: HashSet<String>,
    items: Vec<CatalogItem>,
}

impl Picks {
    fn new() -> Self {
        Self {
            selected: HashSet::new(),
            items: Vec::with_capacity(MAX_RESULTS),
        }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn contains(&self, candidate: &Candidate) -> bool {
        self.selected.contains(&candidate.item.key())
    }

    /// Pick a candidate unless it is already picked
    fn push(&mut self, candidate: &Candidate) -> bool {
        if !self.selected.insert(candidate.item.key()) {
            return false;
        }
        self.items.push(candidate.item.clone());
        true
    }
}

/// Build the final list from candidates sorted best-first
pub fn assemble(ranked: &[Candidate], owned_categories: &HashSet<String>) -> Vec<CatalogItem> {
    let same_category =
        |c: &Candidate| owned_categories.contains(&c.item.category.to_lowercase());
    let mut picks = Picks::new();

    for candidate in ranked.iter().filter(|c| same_category(c)) {
        if picks.len() >= SAME_CATEGORY_PICKS {
            break;
        }
        picks.push(candidate);
    }

    for candidate in ranked.iter().filter(|c| !same_category(c)) {
        if picks.len() >= DIVERSE_TARGET {
            break;
        }
        picks.push(candidate);
    }

    // One surprise pick, whatever its category
    if let Some(candidate) = ranked.iter().find(|c| !picks.contains(c)) {
        picks.push(candidate);
    }

    for candidate in ranked {
        if picks.len() >= MAX_RESULTS {
            break;
        }
        picks.push(candidate);
    }

    picks.items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(product: &str, category: &str, score: f32) -> Candidate {
        Candidate {
            item: CatalogItem::new(product, category, 1.0, 10),
            score,
        }
    }

    fn categories(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn products(items: &[CatalogItem]) -> Vec<&str> {
        items.iter().map(|i| i.product.as_str()).collect()
    }

    #[test]
    fn test_composition_order() {
        let ranked = vec![
            candidate("Cola", "drinks", 0.1),
            candidate("Cheese", "dairy", 0.2),
            candidate("Chips", "snacks", 0.3),
            candidate("Yogurt", "dairy", 0.4),
            candidate("Butter", "dairy", 0.5),
            candidate("Rice", "grains", 0.6),
            candidate("Oats", "grains", 0.7),
        ];

        let picks = assemble(&ranked, &categories(&["dairy"]));

        // Two dairy, then two others, then the best remaining, then fill
        assert_eq!(
            products(&picks),
            vec!["Cheese", "Yogurt", "Cola", "Chips", "Butter", "Rice", "Oats"]
        );
    }

    #[test]
    fn test_caps_at_max_results() {
        let ranked: Vec<Candidate> = (0..25)
            .map(|i| candidate(&format!("Item {}", i), if i % 2 == 0 { "a" } else { "b" }, i as f32))
            .collect();

        let picks = assemble(&ranked, &categories(&["a"]));
        assert_eq!(picks.len(), MAX_RESULTS);

        let unique: HashSet<String> = picks.iter().map(|i| i.key()).collect();
        assert_eq!(unique.len(), MAX_RESULTS);
    }

    #[test]
    fn test_no_same_category_candidates() {
        let ranked = vec![
            candidate("Cola", "drinks", 0.1),
            candidate("Rice", "grains", 0.2),
            candidate("Oats", "grains", 0.3),
            candidate("Chips", "snacks", 0.4),
            candidate("Popcorn", "snacks", 0.5),
        ];

        // Pass B fills to four, surprise takes the fifth
        let picks = assemble(&ranked, &categories(&["dairy"]));
        assert_eq!(products(&picks), vec!["Cola", "Rice", "Oats", "Chips", "Popcorn"]);
    }

    #[test]
    fn test_only_same_category_candidates() {
        let ranked = vec![
            candidate("Cheese", "Dairy", 0.1),
            candidate("Yogurt", "dairy", 0.2),
            candidate("Butter", "dairy", 0.3),
        ];

        let picks = assemble(&ranked, &categories(&["dairy"]));
        assert_eq!(products(&picks), vec!["Cheese", "Yogurt", "Butter"]);
    }

    #[test]
    fn test_empty_candidates() {
        assert!(assemble(&[], &categories(&["dairy"])).is_empty());
    }

    #[test]
    fn test_structurally_equal_names_picked_once() {
        let ranked = vec![
            candidate("Milk", "dairy", 0.1),
            candidate("milk", "dairy", 0.2),
            candidate("Tea", "drinks", 0.3),
        ];

        let picks = assemble(&ranked, &categories(&["dairy"]));
        assert_eq!(products(&picks), vec!["Milk", "Tea"]);
    }
}
