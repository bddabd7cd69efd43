//! Batch analysis orchestration.
//!
//! Coordinates one full run: feature extraction per document, all-pairs
//! similarity scoring, and network construction. Extraction failures are
//! per-document and non-fatal — the batch continues with whatever parsed.
//!
//! Pair scoring is quadratic in the number of surviving documents
//! (`n·(n−1)/2` comparisons, each with its own nested image best-match
//! loops). That is the known scalability limit of a batch; large cohorts
//! pay for it in wall-clock time, not correctness.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::extract;
use crate::metadata::metadata_similarity;
use crate::models::{AnalysisResult, DocumentFeatures, DocumentRef, PairwiseComparison};
use crate::network::build_network;
use crate::similarity::{
    image_similarity, overall_similarity, round2, structure_similarity, text_similarity,
};

/// Run the full pipeline over one batch.
///
/// Fewer than two successfully extracted documents is a valid, empty result —
/// nothing to compare is not an error. An `Err` from this function is
/// pipeline-fatal and fails the whole task at the worker boundary.
pub fn run_analysis(refs: &[DocumentRef], config: &Config) -> Result<AnalysisResult> {
    info!(documents = refs.len(), "starting analysis batch");

    let features = extract_batch(refs);

    if features.len() < 2 {
        info!(
            extracted = features.len(),
            "fewer than two comparable documents, returning empty result"
        );
        return Ok(AnalysisResult::default());
    }

    let comparisons = compare_all_pairs(&features, config);
    let network = build_network(&comparisons, config.scoring.threshold);

    info!(
        extracted = features.len(),
        comparisons = comparisons.len(),
        suspected_pairs = network.len(),
        "analysis batch complete"
    );

    Ok(AnalysisResult {
        comparisons,
        network,
    })
}

/// Extract features for every reference, in input order, skipping failures.
fn extract_batch(refs: &[DocumentRef]) -> Vec<DocumentFeatures> {
    let mut features = Vec::with_capacity(refs.len());
    for (index, doc_ref) in refs.iter().enumerate() {
        match extract::extract_features(&doc_ref.path) {
            Ok(mut f) => {
                // Attach the submitter identity before the record is handed
                // to scoring; from here on it is read-only.
                if let Some(owner) = &doc_ref.owner_id {
                    f.metadata.submitter = Some(owner.clone());
                }
                debug!(
                    n = index + 1,
                    total = refs.len(),
                    source = %f.source_id,
                    headings = f.headings.len(),
                    images = f.image_hashes.len(),
                    "extracted document features"
                );
                features.push(f);
            }
            Err(err) => {
                warn!(path = %doc_ref.path.display(), error = %err, "skipping document");
            }
        }
    }
    features
}

/// Score every unordered pair `(i, j)`, `i < j`, in surviving-extraction
/// order. Component and overall scores are rounded to two decimals when
/// stored.
fn compare_all_pairs(features: &[DocumentFeatures], config: &Config) -> Vec<PairwiseComparison> {
    let total = features.len() * (features.len() - 1) / 2;
    let progress_step = total.div_ceil(10).max(1);
    let mut comparisons = Vec::with_capacity(total);

    for i in 0..features.len() {
        for j in (i + 1)..features.len() {
            let a = &features[i];
            let b = &features[j];

            let text = text_similarity(&a.text, &b.text);
            let image = image_similarity(&a.image_hashes, &b.image_hashes);
            let structure = structure_similarity(&a.headings, &b.headings);
            let metadata = metadata_similarity(&a.metadata, &b.metadata);
            let overall = overall_similarity(text, image, structure, metadata, &config.scoring);

            comparisons.push(PairwiseComparison {
                id_a: a.source_id.clone(),
                id_b: b.source_id.clone(),
                text_similarity: round2(text),
                image_similarity: round2(image),
                structure_similarity: round2(structure),
                metadata_similarity: round2(metadata),
                overall_similarity: round2(overall),
            });

            let done = comparisons.len();
            if done % progress_step == 0 || done == total {
                debug!(done, total, "comparison progress");
            }
        }
    }

    comparisons
}
