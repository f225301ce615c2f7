//! Position-anchored string similarity.
//!
//! This is not an edit distance: two strings score by how many character
//! positions agree from the start, so a single insertion near the front
//! shifts everything after it and tanks the score. Canonical binding and
//! incremental attachment thresholds are calibrated against exactly this
//! metric; swapping in something smarter changes which groups bind.

use crate::normalize::normalize;

/// Similarity of `a` and `b` after normalization, in `[0, 1]`.
///
/// `0` if either side is empty, `1` if equal, otherwise the count of
/// agreeing positions up to the shorter length divided by the longer length.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize(a).chars().collect();
    let b: Vec<char> = normalize(b).chars().collect();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let agreeing = a.iter().zip(&b).filter(|(x, y)| x == y).count();
    agreeing as f64 / a.len().max(b.len()) as f64
}

/// Index and score of the best-scoring candidate. Ties keep the earliest.
pub fn best_match<'a, I>(name: &str, candidates: I) -> Option<(usize, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, candidate) in candidates.into_iter().enumerate() {
        let score = similarity(name, candidate);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((i, score));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_and_empty() {
        assert_eq!(similarity("Kitchen", "Kitchen"), 1.0);
        assert_eq!(similarity("Kitchen", "  KITCHEN "), 1.0);
        assert_eq!(similarity("Kitchen", ""), 0.0);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("   ", "a"), 0.0);
    }

    #[test]
    fn test_position_anchored() {
        // "greenlit hq" vs "greenlit headquarters": first 10 chars agree, of 21.
        let s = similarity("Greenlit HQ", "Greenlit Headquarters");
        assert!((s - 10.0 / 21.0).abs() < 1e-9);
        assert!(s < 0.5);
    }

    #[test]
    fn test_shifted_alignment_scores_low() {
        // One leading character shifts every position.
        assert_eq!(similarity("abcd", "xabcd"), 0.0);
        assert_eq!(similarity("abcd", "abce"), 0.75);
    }

    #[test]
    fn test_symmetric() {
        assert_eq!(similarity("harbor", "harbour"), similarity("harbour", "harbor"));
    }

    #[test]
    fn test_best_match_keeps_first_tie() {
        let names = ["Loft", "Loft", "Harbor"];
        assert_eq!(best_match("loft", names), Some((0, 1.0)));
        assert_eq!(best_match("loft", std::iter::empty()), None);
    }
}
