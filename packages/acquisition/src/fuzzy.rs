//! Three-tier fuzzy name resolution.
//!
//! Matches a free-text input against a candidate list in strict precedence:
//! exact, then substring, then approximate similarity. The tier order is a
//! contract, not an optimization: the looser tiers can produce false
//! positives that the stricter tiers would have avoided.

use strsim::normalized_levenshtein;

/// Minimum normalized similarity accepted by the approximate tier.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Resolve `text` against `candidates`, reading each candidate's name via
/// `name_of`.
///
/// Tiers, first success wins:
/// 1. case-insensitive exact match;
/// 2. case-insensitive substring match (either contains the other);
/// 3. best approximate match, accepted only at similarity >= 0.6.
///
/// No match at any tier is `None`, not an error; the caller decides how to
/// proceed.
pub fn resolve<'a, T, F>(text: &str, candidates: &'a [T], name_of: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    let target = text.trim().to_lowercase();
    if target.is_empty() {
        return None;
    }

    // Tier 1: exact
    for candidate in candidates {
        if name_of(candidate).trim().to_lowercase() == target {
            return Some(candidate);
        }
    }

    // Tier 2: substring, either direction
    for candidate in candidates {
        let name = name_of(candidate).trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        if name.contains(&target) || target.contains(&name) {
            return Some(candidate);
        }
    }

    // Tier 3: best approximate match above the threshold
    let mut best: Option<(&'a T, f64)> = None;
    for candidate in candidates {
        let name = name_of(candidate).trim().to_lowercase();
        let score = normalized_levenshtein(&target, &name);
        if score >= SIMILARITY_THRESHOLD && best.map_or(true, |(_, b)| score > b) {
            best = Some((candidate, score));
        }
    }

    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let candidates = names(&["Auckland", "Wellington", "Canterbury"]);
        let found = resolve("wellington", &candidates, |s| s).unwrap();
        assert_eq!(found, "Wellington");
    }

    #[test]
    fn test_exact_beats_substring() {
        // "Auckland" is a substring of "Auckland Central", but the exact
        // candidate must win even when listed after it.
        let candidates = names(&["Auckland Central", "Auckland"]);
        let found = resolve("auckland", &candidates, |s| s).unwrap();
        assert_eq!(found, "Auckland");
    }

    #[test]
    fn test_substring_either_direction() {
        // Input contained in the candidate name.
        let candidates = names(&["Wellington City"]);
        assert_eq!(
            resolve("wellington", &candidates, |s| s).unwrap(),
            "Wellington City"
        );

        // Candidate name contained in the input.
        let candidates = names(&["Te Aro"]);
        assert_eq!(
            resolve("te aro waterfront", &candidates, |s| s).unwrap(),
            "Te Aro"
        );
    }

    #[test]
    fn test_approximate_match_above_threshold() {
        let candidates = names(&["Christchurch", "Queenstown"]);
        let found = resolve("Christchuch", &candidates, |s| s).unwrap();
        assert_eq!(found, "Christchurch");
    }

    #[test]
    fn test_approximate_rejects_below_threshold() {
        let candidates = names(&["Invercargill"]);
        assert_eq!(resolve("Whangarei", &candidates, |s| s), None);
    }

    #[test]
    fn test_empty_input_and_empty_candidates() {
        let candidates = names(&["Auckland"]);
        assert_eq!(resolve("   ", &candidates, |s| s), None);

        let empty: Vec<String> = vec![];
        assert_eq!(resolve("Auckland", &empty, |s| s), None);
    }

    #[test]
    fn test_best_approximate_wins() {
        // Both are close; the closer one must be returned.
        let candidates = names(&["Hamiltown", "Hamilton"]);
        let found = resolve("Hamillton", &candidates, |s| s).unwrap();
        assert_eq!(found, "Hamilton");
    }

    proptest! {
        /// Exact match wins over every other tier regardless of candidate
        /// ordering.
        #[test]
        fn prop_exact_match_wins_regardless_of_order(
            mut others in proptest::collection::vec("[A-Za-z]{3,12}", 0..8),
            position in 0usize..8,
        ) {
            let target = "Wellington".to_string();
            others.retain(|name| !name.eq_ignore_ascii_case(&target));

            let index = position.min(others.len());
            others.insert(index, target.clone());

            let found = resolve("wellington", &others, |s| s).unwrap();
            prop_assert_eq!(found, &target);
        }
    }
}
