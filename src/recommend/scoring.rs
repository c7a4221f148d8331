//! Candidate scoring and deduplication
//!
//! Scores are distances, so lower is better. A candidate in a category the
//! user already shops in has its distance shrunk, anything else has it
//! stretched.

use std::collections::HashMap;

use crate::catalog::CatalogItem;
use crate::config::RecommendConfig;

/// Category-affinity multipliers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub same_category: f32,
    pub cross_category: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            same_category: 0.8,
            cross_category: 1.2,
        }
    }
}

impl From<&RecommendConfig> for ScoreWeights {
    fn from(config: &RecommendConfig) -> Self {
        Self {
            same_category: config.same_category_boost,
            cross_category: config.cross_category_penalty,
        }
    }
}

impl ScoreWeights {
    /// Score for a raw search distance
    pub fn adjust(&self, distance: f32, same_category: bool) -> f32 {
        if same_category {
            distance * self.same_category
        } else {
            distance * self.cross_category
        }
    }
}

/// A catalog item under consideration, with its best score so far
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub item: CatalogItem,
    pub score: f32,
}

/// Candidates keyed by lowercased product name.
///
/// Keeps one candidate per key with the lowest score offered. Candidates
/// stay in the order their key was first seen, which is the tie-break
/// order after ranking.
#[derive(Debug, Default)]
pub struct CandidatePool {
    slots: HashMap<String, usize>,
    candidates: Vec<Candidate>,
}

impl CandidatePool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Record `item` at `score`, replacing an existing candidate for the same
    /// product only if the new score is strictly lower
    pub fn offer(&mut self, item: &CatalogItem, score: f32) {
        let key = item.key();
        match self.slots.get(&key) {
            Some(&slot) => {
                let existing = &mut self.candidates[slot];
                if score < existing.score {
                    existing.item = item.clone();
                    existing.score = score;
                }
            }
            None => {
                self.slots.insert(key, self.candidates.len());
                self.candidates.push(Candidate {
                    item: item.clone(),
                    score,
                });
            }
        }
    }

    /// Candidates sorted ascending by score; equal scores keep first-seen order
    pub fn into_ranked(self) -> Vec<Candidate> {
        let mut ranked = self.candidates;
        ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
        ranked
    }
}
