//! The normalized text-plus-metadata unit consumed by the index.

use serde::{Deserialize, Serialize};

/// Provenance and quality metadata attached to a [`DocumentRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Path of the image the text came from.
    pub source_path: String,
    /// OCR model version that produced the text.
    pub ocr_model: String,
    /// Recognition language code.
    pub ocr_lang: String,
    /// Arithmetic mean of the per-block confidence scores, rounded to
    /// four decimals.
    pub avg_confidence: f64,
    /// Number of scored text blocks.
    pub num_text_blocks: usize,
}

/// One recognized image, flattened to a newline-joined text body.
///
/// A record is only ever created when at least one text line was
/// recognized; "no text" and "error" are separate outcomes, not empty
/// records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub text: String,
    pub metadata: DocumentMetadata,
}
