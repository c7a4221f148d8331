//! Fuzzy product-name matching
//!
//! Spoken product names rarely match the catalog exactly ("apples" vs
//! "Apple"). Names are compared with a sequence-matcher ratio: twice the
//! number of characters in matching blocks over the combined length.

/// Minimum ratio for two names to be considered the same product
pub const MATCH_CUTOFF: f64 = 0.6;

/// Similarity ratio in `[0, 1]` between two strings, compared by character.
///
/// Not symmetric: matching blocks are searched left to right in `a`, so
/// swapping the arguments can change the result.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = matching_chars(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Index of the candidate closest to `query` (case-insensitive), if any
/// reaches [`MATCH_CUTOFF`].
///
/// Each candidate is scored as `sequence_ratio(candidate, query)`. Equal
/// ratios go to the lexicographically larger lowercased name, and identical
/// names to the earlier candidate.
pub fn closest_match<'a, I>(query: &str, candidates: I) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let query = query.to_lowercase();
    let mut best: Option<(usize, f64, String)> = None;

    for (idx, candidate) in candidates.into_iter().enumerate() {
        let name = candidate.to_lowercase();
        let ratio = sequence_ratio(&name, &query);
        if ratio < MATCH_CUTOFF {
            continue;
        }

        let better = match &best {
            None => true,
            Some((_, best_ratio, best_name)) => {
                ratio > *best_ratio || (ratio == *best_ratio && name > *best_name)
            }
        };
        if better {
            best = Some((idx, ratio, name));
        }
    }

    best.map(|(idx, _, _)| idx)
}

/// Total length of matching blocks: take the longest common substring,
/// then recurse on the pieces to its left and right.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, size) = longest_common_block(a, b);
    if size == 0 {
        return 0;
    }

    size + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + size..], &b[j + size..])
}

/// Longest common substring as (start in a, start in b, length).
/// The earliest block in `a`, then in `b`, wins ties.
fn longest_common_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb { prev[j] + 1 } else { 0 };
            if curr[j + 1] > best.2 {
                best = (i + 1 - curr[j + 1], j + 1 - curr[j + 1], curr[j + 1]);
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_identical_and_disjoint() {
        assert_eq!(sequence_ratio("milk", "milk"), 1.0);
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
        assert_eq!(sequence_ratio("", ""), 1.0);
    }

    #[test]
    fn test_ratio_known_values() {
        // "apple" vs "apples": 5 matching of 11 chars
        assert!((sequence_ratio("apple", "apples") - 10.0 / 11.0).abs() < 1e-9);
        // longest block is "bcd"; the two "a"s sit on opposite sides of it
        assert!((sequence_ratio("abcd", "bcda") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_closest_match_plural_and_case() {
        let catalog = ["Milk", "Apple", "Orange Juice", "Cheese"];
        assert_eq!(closest_match("apples", catalog), Some(1));
        assert_eq!(closest_match("MILK", catalog), Some(0));
        assert_eq!(closest_match("orange juce", catalog), Some(2));
    }

    #[test]
    fn test_closest_match_below_cutoff() {
        let catalog = ["Milk", "Apple"];
        assert_eq!(closest_match("unicorn meat", catalog), None);
        assert_eq!(closest_match("anything", std::iter::empty()), None);
    }

    #[test]
    fn test_closest_match_prefers_best_ratio() {
        let catalog = ["Orange", "Orange Juice"];
        assert_eq!(closest_match("orange juice", catalog), Some(1));
        assert_eq!(closest_match("oranges", catalog), Some(0));
    }

    #[test]
    fn test_ratio_depends_on_argument_order() {
        assert!((sequence_ratio("btru", "butter") - 0.6).abs() < 1e-9);
        assert!((sequence_ratio("butter", "btru") - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_closest_match_scores_candidate_against_query() {
        // ratio("butter", "btru") is 0.4, below the cutoff
        assert_eq!(closest_match("btru", ["Butter"]), None);
        assert_eq!(closest_match("buter", ["Butter"]), Some(0));
    }

    #[test]
    fn test_closest_match_ties_prefer_larger_name() {
        // "abx" and "aby" both score 0.8 against "ab"
        assert_eq!(closest_match("ab", ["abx", "aby"]), Some(1));
        assert_eq!(closest_match("ab", ["ABY", "abx"]), Some(0));
        assert_eq!(closest_match("ab", ["abx", "ABX"]), Some(0));
    }
}
