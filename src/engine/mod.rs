//! Engine — configuration, per-certificate pipeline, bounded batch execution
//!
//! One engine owns the normalizer, matchers, and classifier built from a
//! validated configuration plus immutable reference data. Per-certificate
//! classification is synchronous and side-effect free; batches fan out over
//! a bounded tokio worker pool, with the blocking extraction call held
//! under a cancellable timeout so one pathological image cannot stall a
//! worker indefinitely. Any fault inside one certificate's classification
//! is caught at the certificate boundary and converted into a typed
//! failure — one bad document never takes down the batch.

use crate::authenticity::{AuthenticityClassifier, DecisionThresholds, WeightTable};
use crate::extract::{InputSource, RawExtraction, TextExtractor};
use crate::matcher::IssuerMatcher;
use crate::normalize::{ConfusionMap, TextNormalizer};
use crate::registry::ReferenceData;
use crate::report::ClassificationResult;
use crate::signals::StructuralSignals;
use crate::tagger::SkillTagger;
use crate::{report, signals, tier, CertigradeError, CertigradeResult};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{timeout, Duration};

// ─── Configuration ─────────────────────────────────────────────────

/// Engine configuration. Everything policy-shaped lives here so it can be
/// tuned without redeploying logic; `validate` runs at startup and a bad
/// table prevents the engine from accepting work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub weights: WeightTable,
    #[serde(default)]
    pub thresholds: DecisionThresholds,
    /// Minimum normalized Levenshtein similarity for a fuzzy issuer match
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Maximum certificates in flight during batch processing
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Deadline for one external extraction call
    #[serde(default = "default_extraction_timeout")]
    pub extraction_timeout_secs: u64,
    /// Extra OCR confusion pairs on top of the defaults, e.g. `[["€","e"]]`
    #[serde(default)]
    pub confusion_pairs: Vec<(char, char)>,
}

fn default_fuzzy_threshold() -> f64 {
    0.84
}
fn default_max_in_flight() -> usize {
    8
}
fn default_extraction_timeout() -> u64 {
    30
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            thresholds: DecisionThresholds::default(),
            fuzzy_threshold: default_fuzzy_threshold(),
            max_in_flight: default_max_in_flight(),
            extraction_timeout_secs: default_extraction_timeout(),
            confusion_pairs: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> CertigradeResult<Self> {
        let config: EngineConfig = toml::from_str(content)
            .map_err(|e| CertigradeError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> CertigradeResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CertigradeError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> CertigradeResult<()> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        if !(self.fuzzy_threshold > 0.0 && self.fuzzy_threshold <= 1.0) {
            return Err(CertigradeError::Config(format!(
                "fuzzy_threshold must be in (0, 1], got {}",
                self.fuzzy_threshold
            )));
        }
        if self.max_in_flight == 0 {
            return Err(CertigradeError::Config("max_in_flight must be ≥ 1".into()));
        }
        if self.extraction_timeout_secs == 0 {
            return Err(CertigradeError::Config(
                "extraction_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

// ─── Batch Types ───────────────────────────────────────────────────

/// One certificate submitted for batch classification
#[derive(Debug, Clone)]
pub struct CertificateJob {
    pub id: String,
    pub input: InputSource,
    /// Detector output, when available; the text-derived fallback is used
    /// otherwise
    pub signals: Option<StructuralSignals>,
}

/// Per-certificate batch outcome. A Fake/Unrated verdict is a successful
/// classification; only extraction/input faults land in `Err`.
#[derive(Debug)]
pub struct CertificateOutcome {
    pub id: String,
    pub outcome: CertigradeResult<ClassificationResult>,
}

// ─── Engine ────────────────────────────────────────────────────────

/// The certificate classification engine
pub struct CertigradeEngine {
    config: EngineConfig,
    normalizer: TextNormalizer,
    matcher: IssuerMatcher,
    tagger: SkillTagger,
    authenticity: AuthenticityClassifier,
}

impl CertigradeEngine {
    /// Build an engine from validated configuration and reference data.
    /// Fails fast on either — a misconfigured engine refuses work instead
    /// of classifying with silently-substituted defaults.
    pub fn new(config: EngineConfig, data: &ReferenceData) -> CertigradeResult<Self> {
        config.validate()?;
        data.validate()?;

        let normalizer =
            TextNormalizer::new(ConfusionMap::with_extra_pairs(&config.confusion_pairs));
        let matcher = IssuerMatcher::new(data, &normalizer, config.fuzzy_threshold);
        let tagger = SkillTagger::new(data, &normalizer)?;
        let authenticity =
            AuthenticityClassifier::new(config.weights.clone(), config.thresholds)?;

        tracing::info!(
            issuers = data.issuers.len(),
            skills = data.skills.len(),
            "engine ready"
        );

        Ok(Self {
            config,
            normalizer,
            matcher,
            tagger,
            authenticity,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify one already-extracted certificate. Synchronous, no internal
    /// concurrency, no shared mutable state — safe to call from any number
    /// of threads at once.
    pub fn classify_extraction(
        &self,
        raw: RawExtraction,
        signals: Option<StructuralSignals>,
    ) -> CertigradeResult<ClassificationResult> {
        let text = self.normalizer.normalize(raw)?;
        let mut issuer = self.matcher.resolve(&text);
        if let Some(ocr) = text.raw.mean_confidence() {
            // issuer evidence read off a barely-legible scan is worth no
            // more than the OCR pass that produced it
            issuer.confidence *= ocr.clamp(0.0, 1.0);
        }
        let tags = self.tagger.tag(&text);
        let signals = signals.unwrap_or_else(|| signals::from_text(&text));
        let (status, score) = self.authenticity.classify(&issuer, &signals);
        let (final_tier, review_required) = tier::assign_tier(status, issuer.tier);

        tracing::debug!(
            issuer = %issuer.issuer,
            method = ?issuer.method,
            %status,
            tier = %final_tier,
            score,
            "classified certificate"
        );

        Ok(report::assemble(
            &issuer,
            tags,
            status,
            score,
            final_tier,
            review_required,
        ))
    }

    /// Classify one input end to end: extraction under the configured
    /// deadline, then the guarded pipeline.
    pub async fn classify_input(
        &self,
        extractor: Arc<dyn TextExtractor>,
        input: InputSource,
        signals: Option<StructuralSignals>,
    ) -> CertigradeResult<ClassificationResult> {
        let raw = self.extract_with_timeout(extractor, input).await?;
        self.classify_guarded(raw, signals)
    }

    /// Classify a batch over a bounded worker pool. Every job produces an
    /// outcome; failures are per-certificate and never abort the rest.
    pub async fn classify_batch(
        self: &Arc<Self>,
        extractor: Arc<dyn TextExtractor>,
        jobs: Vec<CertificateJob>,
    ) -> Vec<CertificateOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_in_flight));
        let mut handles = Vec::with_capacity(jobs.len());

        for job in jobs {
            let engine = Arc::clone(self);
            let extractor = Arc::clone(&extractor);
            let semaphore = Arc::clone(&semaphore);
            let id = job.id.clone();
            let handle = tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return CertificateOutcome {
                            id: job.id,
                            outcome: Err(CertigradeError::Internal(format!(
                                "worker pool closed: {e}"
                            ))),
                        }
                    }
                };
                let outcome = engine
                    .classify_input(extractor, job.input, job.signals)
                    .await;
                CertificateOutcome {
                    id: job.id,
                    outcome,
                }
            });
            handles.push((id, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (id, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => outcomes.push(CertificateOutcome {
                    id,
                    outcome: Err(CertigradeError::Internal(format!("worker task failed: {e}"))),
                }),
            }
        }
        outcomes
    }

    /// Run the blocking extractor off the async runtime, bounded by the
    /// configured deadline. On timeout the abandoned call finishes (or
    /// hangs) on the blocking pool while the worker moves on.
    async fn extract_with_timeout(
        &self,
        extractor: Arc<dyn TextExtractor>,
        input: InputSource,
    ) -> CertigradeResult<RawExtraction> {
        let secs = self.config.extraction_timeout_secs;
        let task = tokio::task::spawn_blocking(move || extractor.extract(&input));
        match timeout(Duration::from_secs(secs), task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(CertigradeError::Internal(format!(
                "extraction task failed: {e}"
            ))),
            Err(_) => {
                tracing::warn!(deadline_secs = secs, "extraction timed out");
                Err(CertigradeError::ExtractionTimeout(secs))
            }
        }
    }

    /// Certificate-boundary guard: a panic inside one classification
    /// becomes a typed failure for that certificate only.
    fn classify_guarded(
        &self,
        raw: RawExtraction,
        signals: Option<StructuralSignals>,
    ) -> CertigradeResult<ClassificationResult> {
        match catch_unwind(AssertUnwindSafe(|| self.classify_extraction(raw, signals))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic);
                tracing::error!(%message, "classification panicked");
                Err(CertigradeError::Internal(message))
            }
        }
    }
}

fn panic_message(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authenticity::AuthenticityStatus;
    use crate::extract::PlainTextExtractor;
    use crate::signals::Signal;
    use crate::tier::CredibilityTier;

    fn engine() -> Arc<CertigradeEngine> {
        Arc::new(CertigradeEngine::new(EngineConfig::default(), &ReferenceData::builtin()).unwrap())
    }

    #[test]
    fn test_invalid_config_refused_at_startup() {
        let config = EngineConfig {
            fuzzy_threshold: 0.0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            CertigradeEngine::new(config, &ReferenceData::builtin()),
            Err(CertigradeError::Config(_))
        ));

        let config = EngineConfig {
            max_in_flight: 0,
            ..EngineConfig::default()
        };
        assert!(CertigradeEngine::new(config, &ReferenceData::builtin()).is_err());
    }

    #[test]
    fn test_config_toml_defaults_and_overrides() {
        let config = EngineConfig::from_toml_str(
            r#"
            fuzzy_threshold = 0.9
            extraction_timeout_secs = 5

            [thresholds]
            high = 0.8
            low = 0.2
        "#,
        )
        .unwrap();
        assert_eq!(config.fuzzy_threshold, 0.9);
        assert_eq!(config.extraction_timeout_secs, 5);
        assert_eq!(config.thresholds.high, 0.8);
        // untouched sections fall back to defaults
        assert_eq!(config.weights.issuer_match, 0.5);
        assert_eq!(config.max_in_flight, 8);
    }

    #[test]
    fn test_config_bad_thresholds_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [thresholds]
            high = 0.2
            low = 0.8
        "#,
        )
        .unwrap_err();
        assert!(matches!(err, CertigradeError::Config(_)));
    }

    #[test]
    fn test_fake_verdict_is_ok_not_err() {
        let result = engine()
            .classify_extraction(
                RawExtraction::new("Hooli Institute of Excellence\nCertificate of Attendance"),
                Some(StructuralSignals::none()),
            )
            .unwrap();
        assert_eq!(result.status, AuthenticityStatus::Fake);
        assert_eq!(result.tier, CredibilityTier::Unrated);
    }

    #[test]
    fn test_uncertain_sets_review_flag() {
        // exact issuer (0.5 weighted) with no structural evidence lands
        // between the thresholds
        let result = engine()
            .classify_extraction(
                RawExtraction::new("IBM Certificate of Completion"),
                Some(StructuralSignals::none()),
            )
            .unwrap();
        assert_eq!(result.status, AuthenticityStatus::Uncertain);
        assert_eq!(result.tier, CredibilityTier::Tier3);
        assert!(result.review_required);
    }

    #[test]
    fn test_ocr_confidence_discounts_issuer_evidence() {
        let e = engine();
        let signals = StructuralSignals::new(Signal::detected(1.0), Signal::detected(1.0));

        let clean = e
            .classify_extraction(
                RawExtraction::new("IBM Data Analysis Certificate"),
                Some(signals),
            )
            .unwrap();
        assert_eq!(clean.status, AuthenticityStatus::Real);

        // identical wording, but the OCR engine barely trusted its own read
        let garbled = e
            .classify_extraction(
                RawExtraction::with_confidence(
                    "IBM Data Analysis Certificate",
                    vec![0.2, 0.2, 0.2, 0.2],
                ),
                Some(signals),
            )
            .unwrap();
        assert_eq!(garbled.status, AuthenticityStatus::Uncertain);
        assert!(garbled.confidence < clean.confidence);
    }

    #[tokio::test]
    async fn test_classify_input_via_extractor() {
        let result = engine()
            .classify_input(
                Arc::new(PlainTextExtractor),
                InputSource::Text("Stanford Machine Learning\nSignature on file".into()),
                Some(StructuralSignals::new(
                    Signal::detected(1.0),
                    Signal::detected(1.0),
                )),
            )
            .await
            .unwrap();
        assert_eq!(result.issuer, "Stanford University");
        assert_eq!(result.status, AuthenticityStatus::Real);
        assert_eq!(result.tier, CredibilityTier::Tier1);
    }

    struct SlowExtractor;
    impl TextExtractor for SlowExtractor {
        fn extract(&self, _input: &InputSource) -> CertigradeResult<RawExtraction> {
            std::thread::sleep(std::time::Duration::from_secs(5));
            Ok(RawExtraction::new("too late"))
        }
    }

    #[tokio::test]
    async fn test_extraction_timeout() {
        let config = EngineConfig {
            extraction_timeout_secs: 1,
            ..EngineConfig::default()
        };
        let engine =
            Arc::new(CertigradeEngine::new(config, &ReferenceData::builtin()).unwrap());
        let err = engine
            .classify_input(
                Arc::new(SlowExtractor),
                InputSource::Text("anything".into()),
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CertigradeError::ExtractionTimeout(1)));
    }
}
