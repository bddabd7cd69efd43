//! Suspected-plagiarism network construction.
//!
//! A pure filter over the comparison list: pairs whose overall similarity
//! strictly exceeds the threshold become directed-looking (but semantically
//! unordered) edges keyed by the two source ids.

use crate::models::{PairwiseComparison, PlagiarismEdge};

/// Build the network from a comparison list. A comparison scoring exactly
/// the threshold is excluded — the inequality is strict.
pub fn build_network(comparisons: &[PairwiseComparison], threshold: f64) -> Vec<PlagiarismEdge> {
    comparisons
        .iter()
        .filter(|c| c.overall_similarity > threshold)
        .map(|c| PlagiarismEdge {
            source: c.id_a.clone(),
            target: c.id_b.clone(),
            similarity: c.overall_similarity,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(id_a: &str, id_b: &str, overall: f64) -> PairwiseComparison {
        PairwiseComparison {
            id_a: id_a.to_string(),
            id_b: id_b.to_string(),
            text_similarity: overall,
            image_similarity: overall,
            structure_similarity: overall,
            metadata_similarity: overall,
            overall_similarity: overall,
        }
    }

    #[test]
    fn edges_require_strictly_greater_scores() {
        let comparisons = vec![
            comparison("a", "b", 0.71),
            comparison("a", "c", 0.70),
            comparison("b", "c", 0.69),
        ];
        let edges = build_network(&comparisons, 0.7);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source, "a");
        assert_eq!(edges[0].target, "b");
        assert_eq!(edges[0].similarity, 0.71);
    }

    #[test]
    fn empty_comparisons_yield_empty_network() {
        assert!(build_network(&[], 0.7).is_empty());
    }

    #[test]
    fn zero_threshold_keeps_any_positive_score() {
        let comparisons = vec![comparison("a", "b", 0.01), comparison("a", "c", 0.0)];
        let edges = build_network(&comparisons, 0.0);
        assert_eq!(edges.len(), 1);
    }
}
