//! Extraction boundary — image in, raw text out
//!
//! Optical character recognition is an external collaborator. The pipeline
//! only ever sees a [`RawExtraction`]; whether the text came from Tesseract,
//! a PDF text layer, or a remote OCR service is hidden behind the
//! [`TextExtractor`] trait. Implementations may block — the engine runs them
//! on a blocking worker under a cancellable timeout.

use crate::{CertigradeError, CertigradeResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─── Input Specification ───────────────────────────────────────────

/// Anything a certificate can arrive as
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Local file: a text sidecar, or an image handed to an OCR-backed extractor
    Path(PathBuf),

    /// In-memory bytes with an optional filename hint
    Bytes {
        data: Vec<u8>,
        filename_hint: Option<String>,
    },

    /// Already-extracted text (e.g. piped through stdin)
    Text(String),
}

// ─── Raw Extraction ────────────────────────────────────────────────

/// Raw text handed back by the extraction boundary.
///
/// Immutable once produced; lives for exactly one pipeline invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawExtraction {
    pub text: String,
    /// Per-token confidence reported by the OCR engine (0.0–1.0), if any
    pub token_confidence: Option<Vec<f64>>,
}

impl RawExtraction {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            token_confidence: None,
        }
    }

    pub fn with_confidence(text: impl Into<String>, confidence: Vec<f64>) -> Self {
        Self {
            text: text.into(),
            token_confidence: Some(confidence),
        }
    }

    /// Mean OCR confidence, if the engine reported any
    pub fn mean_confidence(&self) -> Option<f64> {
        match &self.token_confidence {
            Some(conf) if !conf.is_empty() => {
                Some(conf.iter().sum::<f64>() / conf.len() as f64)
            }
            _ => None,
        }
    }
}

// ─── Extractor Trait ───────────────────────────────────────────────

/// The external text-extraction collaborator.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, input: &InputSource) -> CertigradeResult<RawExtraction>;
}

/// Default extractor: plain UTF-8 text only.
///
/// Certificates that are already text (or ship a text sidecar) work out of
/// the box; anything that needs real OCR must come through a caller-supplied
/// [`TextExtractor`].
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, input: &InputSource) -> CertigradeResult<RawExtraction> {
        match input {
            InputSource::Text(text) => Ok(RawExtraction::new(text.clone())),
            InputSource::Path(path) => {
                let data = std::fs::read(path)?;
                text_from_bytes(&data, &path.to_string_lossy())
            }
            InputSource::Bytes {
                data,
                filename_hint,
            } => text_from_bytes(data, filename_hint.as_deref().unwrap_or("<bytes>")),
        }
    }
}

fn text_from_bytes(data: &[u8], origin: &str) -> CertigradeResult<RawExtraction> {
    // Common image/PDF magic bytes — these need a real OCR extractor
    if data.starts_with(b"%PDF")
        || data.starts_with(&[0x89, b'P', b'N', b'G'])
        || data.starts_with(&[0xFF, 0xD8, 0xFF])
    {
        return Err(CertigradeError::UnsupportedInput(format!(
            "{origin}: image/PDF input requires an OCR-backed extractor"
        )));
    }
    match std::str::from_utf8(data) {
        Ok(text) => Ok(RawExtraction::new(text)),
        Err(_) => Err(CertigradeError::UnsupportedInput(format!(
            "{origin}: not valid UTF-8 text"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_passthrough() {
        let raw = PlainTextExtractor
            .extract(&InputSource::Text("IBM Certificate".into()))
            .unwrap();
        assert_eq!(raw.text, "IBM Certificate");
        assert!(raw.token_confidence.is_none());
    }

    #[test]
    fn test_pdf_magic_rejected() {
        let err = PlainTextExtractor
            .extract(&InputSource::Bytes {
                data: b"%PDF-1.7 ...".to_vec(),
                filename_hint: Some("cert.pdf".into()),
            })
            .unwrap_err();
        assert!(matches!(err, CertigradeError::UnsupportedInput(_)));
    }

    #[test]
    fn test_non_utf8_rejected() {
        let err = PlainTextExtractor
            .extract(&InputSource::Bytes {
                data: vec![0xC0, 0x80, 0xFE],
                filename_hint: None,
            })
            .unwrap_err();
        assert!(matches!(err, CertigradeError::UnsupportedInput(_)));
    }

    #[test]
    fn test_mean_confidence() {
        let raw = RawExtraction::with_confidence("a b c", vec![0.9, 0.8, 0.7]);
        let mean = raw.mean_confidence().unwrap();
        assert!((mean - 0.8).abs() < 1e-9);
        assert!(RawExtraction::new("a b c").mean_confidence().is_none());
    }
}
