//! Text, image, and structure comparators plus the weighted combiner.
//!
//! Each comparator is a pure function of two feature sets returning a score
//! in [0, 1]. Metadata similarity lives with its rule table in
//! [`crate::metadata`].

use std::collections::{HashMap, HashSet};

use crate::config::ScoringConfig;

/// Hex characters of each content hash taking part in the Hamming
/// comparison: a fixed 64-bit window. Hashes are 128-bit MD5 digests, so
/// only their leading half is compared — kept for score compatibility with
/// the historical behavior, though it reads like a perceptual-hash constant
/// applied to MD5 output. See DESIGN.md.
const HASH_WINDOW_HEX: usize = 16;
const HASH_WINDOW_BITS: u32 = 64;

/// Cosine similarity over case-folded word-frequency vectors.
///
/// Tokenization is `\w+`: maximal runs of ASCII alphanumerics and
/// underscore. Either side with zero tokens scores 0.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let freq_a = word_frequencies(a);
    let freq_b = word_frequencies(b);
    if freq_a.is_empty() || freq_b.is_empty() {
        return 0.0;
    }

    let dot: f64 = freq_a
        .iter()
        .filter_map(|(word, x)| freq_b.get(word).map(|y| (*x as f64) * (*y as f64)))
        .sum();
    let norm_a = norm(&freq_a);
    let norm_b = norm(&freq_b);

    dot / (norm_a * norm_b)
}

fn word_frequencies(text: &str) -> HashMap<String, u64> {
    let mut freq = HashMap::new();
    for word in text
        .to_lowercase()
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
    {
        *freq.entry(word.to_string()).or_insert(0) += 1;
    }
    freq
}

fn norm(freq: &HashMap<String, u64>) -> f64 {
    freq.values()
        .map(|x| (*x as f64) * (*x as f64))
        .sum::<f64>()
        .sqrt()
}

/// Best-match image similarity over two lists of hex content hashes.
///
/// For every hash in one list, take the best `1 − hamming/64` against the
/// other list; average the per-hash bests of both directions. Two documents
/// with no images at all count as a match (1); images on exactly one side
/// count as a mismatch (0).
pub fn image_similarity(a: &[String], b: &[String]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let mut sims = Vec::with_capacity(a.len() + b.len());
    push_best_matches(a, b, &mut sims);
    push_best_matches(b, a, &mut sims);

    sims.iter().sum::<f64>() / sims.len() as f64
}

fn push_best_matches(src: &[String], tgt: &[String], sims: &mut Vec<f64>) {
    for src_hash in src {
        let mut best = 0.0f64;
        for tgt_hash in tgt {
            if src_hash.len() == tgt_hash.len() {
                let distance = hamming_window(src_hash, tgt_hash);
                let sim = 1.0 - f64::from(distance) / f64::from(HASH_WINDOW_BITS);
                if sim > best {
                    best = sim;
                }
            }
        }
        sims.push(best);
    }
}

/// Bit-level Hamming distance over the leading [`HASH_WINDOW_HEX`]
/// characters of two hex strings.
fn hamming_window(a: &str, b: &str) -> u32 {
    a.chars()
        .zip(b.chars())
        .take(HASH_WINDOW_HEX)
        .map(|(ca, cb)| {
            let xa = ca.to_digit(16).unwrap_or(0);
            let xb = cb.to_digit(16).unwrap_or(0);
            (xa ^ xb).count_ones()
        })
        .sum()
}

/// Jaccard index over the two heading sets. Order and duplicates are
/// ignored; two documents with no headings at all count as a match (1).
pub fn structure_similarity(a: &[String], b: &[String]) -> f64 {
    let set_a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let set_b: HashSet<&str> = b.iter().map(String::as_str).collect();

    let union = set_a.union(&set_b).count();
    if union == 0 {
        return 1.0;
    }
    set_a.intersection(&set_b).count() as f64 / union as f64
}

/// Weighted combination of the four component scores.
pub fn overall_similarity(
    text: f64,
    image: f64,
    structure: f64,
    metadata: f64,
    scoring: &ScoringConfig,
) -> f64 {
    scoring.text_weight * text
        + scoring.image_weight * image
        + scoring.structure_weight * structure
        + scoring.metadata_weight * metadata
}

/// Round to two decimals for storage in a comparison record.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
