//! Core data models used throughout docsim.
//!
//! These types represent the documents, pairwise scores, and queued tasks
//! that flow through the analysis pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Structured features extracted from one document.
///
/// Built once per successfully parsed document and never mutated afterwards.
/// Missing sub-parts (no headings, no images, no properties) come through as
/// empty values, not errors.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentFeatures {
    /// Node key in the plagiarism network — the submitted file path.
    pub source_id: String,
    /// Full body text, one line per paragraph.
    pub text: String,
    /// Heading paragraphs in document order, duplicates retained.
    pub headings: Vec<String>,
    /// MD5 (hex) of each embedded image's raw bytes, duplicates retained.
    pub image_hashes: Vec<String>,
    /// Document properties from `docProps/`.
    pub metadata: DocMeta,
}

/// Document properties gathered from the core, application, and custom
/// property parts.
///
/// Known fields have fixed slots; custom properties land in [`DocMeta::custom`].
/// Numeric fields that fail to parse stay `None` — never zero, so a missing
/// count can't masquerade as an exact match.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocMeta {
    pub author: Option<String>,
    pub last_modified_by: Option<String>,
    pub company: Option<String>,
    pub manager: Option<String>,

    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub last_printed: Option<DateTime<Utc>>,

    pub revision_number: Option<f64>,
    pub total_editing_time: Option<f64>,
    pub application: Option<String>,

    pub template: Option<String>,
    pub subject: Option<String>,
    pub category: Option<String>,
    pub keywords: Option<String>,
    pub title: Option<String>,

    pub page_count: Option<f64>,
    pub word_count: Option<f64>,
    pub char_count: Option<f64>,
    pub paragraph_count: Option<f64>,

    /// Submitter identity carried over from the [`DocumentRef`], when known.
    pub submitter: Option<String>,

    /// Custom properties (`docProps/custom.xml`), keyed by property name.
    pub custom: BTreeMap<String, String>,
}

/// Four-axis similarity result for one unordered document pair.
///
/// `id_a` precedes `id_b` in input iteration order. All scores are in [0, 1]
/// and rounded to two decimals when stored here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseComparison {
    pub id_a: String,
    pub id_b: String,
    pub text_similarity: f64,
    pub image_similarity: f64,
    pub structure_similarity: f64,
    pub metadata_similarity: f64,
    pub overall_similarity: f64,
}

/// A suspected-plagiarism edge: a comparison whose overall score exceeded
/// the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlagiarismEdge {
    pub source: String,
    pub target: String,
    pub similarity: f64,
}

/// Output of one full pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisResult {
    pub comparisons: Vec<PairwiseComparison>,
    pub network: Vec<PlagiarismEdge>,
}

/// One document in a submitted batch.
///
/// The owner fields are opaque to the scoring core except that `owner_id`
/// feeds the optional submitter-identity metadata rule.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRef {
    pub path: PathBuf,
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
}

impl DocumentRef {
    /// A bare reference with no submitter attached (CLI and test batches).
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            owner_id: None,
            owner_name: None,
        }
    }
}

/// Lifecycle state of a queued analysis task.
///
/// `Completed` and `Failed` are terminal; a task never leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// One queued analysis run over a batch of documents.
///
/// `result` is present iff the task completed; `error` iff it failed.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisTask {
    pub id: String,
    pub inputs: Vec<DocumentRef>,
    pub status: TaskStatus,
    pub result: Option<AnalysisResult>,
    pub error: Option<String>,
}
