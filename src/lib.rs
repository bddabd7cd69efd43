//! # docsim
//!
//! Batch similarity analysis for office documents.
//!
//! docsim parses a batch of OOXML documents, extracts comparable features
//! (body text, heading structure, embedded-image hashes, document
//! properties), scores every pair of documents on four independent metrics,
//! and flags pairs whose combined score crosses a configurable threshold.
//! Analysis runs are scheduled through an in-process task queue with a
//! single background worker, so callers submit a batch and poll for the
//! result.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────┐   ┌──────────┐
//! │  Queue   │──▶│ Pipeline  │──▶│ Similarity │──▶│ Network  │
//! │ (worker) │   │ (extract) │   │  (4 axes)  │   │ (edges)  │
//! └────┬─────┘   └───────────┘   └────────────┘   └──────────┘
//!      │
//!   submit / poll
//! ```
//!
//! ## Quick start
//!
//! ```bash
//! docsim analyze a.docx b.docx c.docx     # compare a batch, print summary
//! docsim analyze --json *.docx            # machine-readable result
//! docsim inspect a.docx                   # show extracted features
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration: scoring weights, threshold, worker interval |
//! | [`models`] | Core data types |
//! | [`container`] | Read-only view over a document's ZIP archive |
//! | [`extract`] | Feature extraction (text, headings, images, properties) |
//! | [`metadata`] | Document-properties parsing and metadata similarity |
//! | [`similarity`] | Text, image, and structure comparators plus the combiner |
//! | [`network`] | Suspected-plagiarism edge builder |
//! | [`pipeline`] | Batch orchestration: extract all, compare all pairs |
//! | [`queue`] | Task queue with a fixed-interval background worker |

pub mod config;
pub mod container;
pub mod extract;
pub mod metadata;
pub mod models;
pub mod network;
pub mod pipeline;
pub mod queue;
pub mod similarity;
