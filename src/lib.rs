//! # certigrade — Certificate Credibility Classifier
//!
//! Turns the raw text extracted from a certificate document into a structured
//! verdict: canonical issuer, skill tags, an authenticity status, and a final
//! credibility tier. Downstream systems (hiring platforms, credential wallets)
//! consume the verdict as a trust signal without manual review.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CertigradeEngine                        │
//! │                                                              │
//! │  image/bytes ──► TextExtractor (external OCR boundary)       │
//! │                        │                                     │
//! │                  TextNormalizer                              │
//! │                   ┌────┴─────┐                               │
//! │            IssuerMatcher  SkillTagger                        │
//! │                   │            │                             │
//! │         AuthenticityClassifier │   ◄── structural signals    │
//! │                   │            │                             │
//! │             TierClassifier     │                             │
//! │                   └────┬───────┘                             │
//! │                 ResultAssembler ──► JSON document            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Per-certificate classification is a single synchronous pipeline over
//! immutable reference data; the engine fans batches out over a bounded
//! worker pool with a cancellable timeout around the extraction call.

pub mod authenticity;
pub mod engine;
pub mod extract;
pub mod matcher;
pub mod normalize;
pub mod registry;
pub mod report;
pub mod signals;
pub mod tagger;
pub mod tier;

// Re-exports for convenience
pub use authenticity::{AuthenticityClassifier, AuthenticityStatus, DecisionThresholds, WeightTable};
pub use engine::{CertificateJob, CertificateOutcome, CertigradeEngine, EngineConfig};
pub use extract::{InputSource, PlainTextExtractor, RawExtraction, TextExtractor};
pub use matcher::{IssuerMatch, IssuerMatcher, MatchMethod};
pub use normalize::{ConfusionMap, NormalizedText, TextNormalizer};
pub use registry::{IssuerRecord, ReferenceData, SkillEntry, TrustTier};
pub use report::ClassificationResult;
pub use signals::{Signal, StructuralSignals};
pub use tagger::SkillTagger;
pub use tier::CredibilityTier;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CertigradeError {
    /// Normalization received no usable text. Non-fatal: surfaced as a
    /// failed result for that one certificate.
    #[error("extraction produced no usable text")]
    EmptyExtraction,

    /// The extraction boundary could not process the input at all.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// The external extractor failed mid-flight.
    #[error("text extraction failed: {0}")]
    Extraction(String),

    /// The extraction call exceeded the configured deadline.
    #[error("text extraction timed out after {0}s")]
    ExtractionTimeout(u64),

    /// Malformed weight table, thresholds, or reference data at load time.
    /// Fatal at startup: the engine refuses work rather than classifying
    /// with silently-substituted defaults.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unexpected fault caught at the certificate boundary.
    #[error("internal fault: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type CertigradeResult<T> = Result<T, CertigradeError>;
