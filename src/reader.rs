//! Image-to-document reader.
//!
//! Validates candidate paths, runs the OCR engine over each valid image
//! in order, and flattens the recognized lines into [`DocumentRecord`]s.
//! One engine instance is constructed per reader and reused; images are
//! processed strictly one at a time.

use std::path::{Path, PathBuf};

use crate::document::{DocumentMetadata, DocumentRecord};
use crate::ocr::{OcrEngine, OcrEngineInfo, OcrResult};

/// Extensions the reader accepts, lowercase without the dot.
const SUPPORTED_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "pdf"];

/// Outcome of flattening one image's OCR output.
///
/// "No text" and "failed" are distinct states, so callers can tell an
/// empty page from a broken engine without consulting the logs.
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    /// At least one text line was recognized.
    Document(DocumentRecord),
    /// The engine ran cleanly but found no text.
    NoText,
    /// The engine errored or returned out-of-contract output.
    Failed(String),
}

/// Keep only paths that exist, are regular files, and carry a supported
/// extension. Order is preserved; rejected paths are logged and skipped.
/// An empty result is legal.
pub fn validate_paths(candidates: &[String]) -> Vec<PathBuf> {
    let mut valid = Vec::new();

    for candidate in candidates {
        let path = Path::new(candidate);

        if !path.exists() {
            tracing::warn!("path {} does not exist, skipping", candidate);
            continue;
        }
        if !path.is_file() {
            tracing::warn!("path {} is not a regular file, skipping", candidate);
            continue;
        }

        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase());
        match extension {
            Some(ext) if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) => {
                valid.push(path.to_path_buf());
            }
            Some(ext) => {
                tracing::warn!("file {} has unsupported format '{}', skipping", candidate, ext);
            }
            None => {
                tracing::warn!("file {} has no extension, skipping", candidate);
            }
        }
    }

    valid
}

/// Flatten per-region-group OCR output into a document record.
///
/// Lines are concatenated in encounter order and joined with newlines.
/// The average confidence is the arithmetic mean of all scores, 0.0 when
/// the engine returned no scores at all. A non-empty score list whose
/// length disagrees with the text list breaks the engine contract and
/// rejects the image.
pub fn flatten_results(
    source_path: &Path,
    results: &[OcrResult],
    info: &OcrEngineInfo,
) -> ExtractionOutcome {
    let mut text_lines: Vec<&str> = Vec::new();
    let mut scores: Vec<f32> = Vec::new();
    for group in results {
        text_lines.extend(group.texts.iter().map(String::as_str));
        scores.extend_from_slice(&group.scores);
    }

    if text_lines.is_empty() {
        return ExtractionOutcome::NoText;
    }
    if !scores.is_empty() && scores.len() != text_lines.len() {
        return ExtractionOutcome::Failed(format!(
            "misaligned engine output: {} texts, {} scores",
            text_lines.len(),
            scores.len()
        ));
    }

    let avg_confidence = if scores.is_empty() {
        0.0
    } else {
        let sum: f64 = scores.iter().map(|score| *score as f64).sum();
        round4(sum / scores.len() as f64)
    };

    ExtractionOutcome::Document(DocumentRecord {
        text: text_lines.join("\n"),
        metadata: DocumentMetadata {
            source_path: source_path.display().to_string(),
            ocr_model: info.model_version.clone(),
            ocr_lang: info.lang.clone(),
            avg_confidence,
            num_text_blocks: scores.len(),
        },
    })
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Batch driver: one reusable engine, sequential processing, per-image
/// failure isolation.
pub struct OcrDocumentReader<E> {
    engine: E,
}

impl<E: OcrEngine> OcrDocumentReader<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Load documents from a single candidate path.
    pub async fn load_document(&self, candidate: &str) -> Option<DocumentRecord> {
        let candidates = [candidate.to_string()];
        self.load_documents(&candidates).await.into_iter().next()
    }

    /// Load documents from a list of candidate paths.
    ///
    /// Invalid paths are skipped, per-image engine failures and blank
    /// pages are dropped, and whatever remains comes back in input
    /// order. Empty input yields an empty list, never an error.
    pub async fn load_documents(&self, candidates: &[String]) -> Vec<DocumentRecord> {
        if candidates.is_empty() {
            tracing::warn!("input file list is empty");
            return Vec::new();
        }

        let valid_paths = validate_paths(candidates);
        if valid_paths.is_empty() {
            tracing::warn!("no valid image files among {} candidates", candidates.len());
            return Vec::new();
        }

        tracing::info!("processing {} image files", valid_paths.len());

        let mut documents = Vec::new();
        for path in &valid_paths {
            match self.extract_document(path).await {
                ExtractionOutcome::Document(record) => {
                    tracing::info!(
                        "processed {}: {} text blocks, avg confidence {}",
                        path.display(),
                        record.metadata.num_text_blocks,
                        record.metadata.avg_confidence
                    );
                    documents.push(record);
                }
                ExtractionOutcome::NoText => {
                    tracing::warn!("no text recognized in {}", path.display());
                }
                ExtractionOutcome::Failed(reason) => {
                    tracing::error!("failed to process {}: {}", path.display(), reason);
                }
            }
        }

        tracing::info!(
            "produced {} documents from {} valid paths",
            documents.len(),
            valid_paths.len()
        );
        documents
    }

    async fn extract_document(&self, path: &Path) -> ExtractionOutcome {
        match self.engine.recognize(path).await {
            Ok(results) => flatten_results(path, &results, self.engine.info()),
            Err(err) => ExtractionOutcome::Failed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::PipelineError;

    fn engine_info() -> OcrEngineInfo {
        OcrEngineInfo {
            model_version: "PP-OCRv5".to_string(),
            lang: "ch".to_string(),
            device: "cpu".to_string(),
        }
    }

    /// Scripted engine: each known path maps to canned results or an error.
    struct ScriptedEngine {
        info: OcrEngineInfo,
        outputs: HashMap<PathBuf, Result<Vec<OcrResult>, String>>,
    }

    impl ScriptedEngine {
        fn new(outputs: HashMap<PathBuf, Result<Vec<OcrResult>, String>>) -> Self {
            Self {
                info: engine_info(),
                outputs,
            }
        }
    }

    #[async_trait]
    impl OcrEngine for ScriptedEngine {
        fn name(&self) -> &str {
            "scripted"
        }

        fn info(&self) -> &OcrEngineInfo {
            &self.info
        }

        async fn recognize(&self, image_path: &Path) -> Result<Vec<OcrResult>, PipelineError> {
            match self.outputs.get(image_path) {
                Some(Ok(results)) => Ok(results.clone()),
                Some(Err(reason)) => Err(PipelineError::Ocr(reason.clone())),
                None => Ok(Vec::new()),
            }
        }
    }

    fn touch(dir: &Path, name: &str) -> String {
        let path = dir.join(name);
        fs::write(&path, b"fake image bytes").expect("write");
        path.display().to_string()
    }

    #[test]
    fn validator_keeps_supported_files_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = touch(dir.path(), "b.jpg");
        let second = touch(dir.path(), "a.PNG");
        let third = touch(dir.path(), "c.pdf");

        let valid = validate_paths(&[first.clone(), second.clone(), third.clone()]);

        let expected: Vec<PathBuf> =
            [&first, &second, &third].iter().map(PathBuf::from).collect();
        assert_eq!(valid, expected);
    }

    #[test]
    fn validator_skips_missing_directories_and_unsupported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = touch(dir.path(), "ok.webp");
        let unsupported = touch(dir.path(), "notes.txt");
        let no_ext = touch(dir.path(), "bare");
        let missing = dir.path().join("ghost.jpg").display().to_string();
        let directory = dir.path().display().to_string();

        let valid = validate_paths(&[
            missing,
            directory,
            unsupported,
            no_ext,
            good.clone(),
        ]);

        assert_eq!(valid, vec![PathBuf::from(good)]);
    }

    #[test]
    fn validator_empty_input_returns_empty() {
        assert!(validate_paths(&[]).is_empty());
    }

    #[test]
    fn flatten_returns_no_text_for_empty_regions() {
        let outcome = flatten_results(Path::new("x.jpg"), &[], &engine_info());
        assert!(matches!(outcome, ExtractionOutcome::NoText));

        let empty_group = OcrResult::default();
        let outcome = flatten_results(Path::new("x.jpg"), &[empty_group], &engine_info());
        assert!(matches!(outcome, ExtractionOutcome::NoText));
    }

    #[test]
    fn flatten_joins_lines_and_averages_scores() {
        let results = vec![OcrResult {
            texts: vec!["A".to_string(), "B".to_string()],
            scores: vec![0.9, 0.7],
        }];

        let outcome = flatten_results(Path::new("x.jpg"), &results, &engine_info());
        let ExtractionOutcome::Document(record) = outcome else {
            panic!("expected a document");
        };

        assert_eq!(record.text, "A\nB");
        assert_eq!(record.metadata.avg_confidence, 0.8);
        assert_eq!(record.metadata.num_text_blocks, 2);
        assert_eq!(record.metadata.source_path, "x.jpg");
        assert_eq!(record.metadata.ocr_model, "PP-OCRv5");
        assert_eq!(record.metadata.ocr_lang, "ch");
    }

    #[test]
    fn flatten_collects_across_region_groups_in_order() {
        let results = vec![
            OcrResult {
                texts: vec!["one".to_string()],
                scores: vec![0.5],
            },
            OcrResult {
                texts: vec!["two".to_string(), "three".to_string()],
                scores: vec![0.6, 0.7],
            },
        ];

        let outcome = flatten_results(Path::new("x.jpg"), &results, &engine_info());
        let ExtractionOutcome::Document(record) = outcome else {
            panic!("expected a document");
        };

        assert_eq!(record.text, "one\ntwo\nthree");
        assert_eq!(record.metadata.num_text_blocks, 3);
        assert_eq!(record.metadata.avg_confidence, 0.6);
    }

    #[test]
    fn flatten_defaults_average_when_scores_missing() {
        let results = vec![OcrResult {
            texts: vec!["unscored".to_string()],
            scores: vec![],
        }];

        let outcome = flatten_results(Path::new("x.jpg"), &results, &engine_info());
        let ExtractionOutcome::Document(record) = outcome else {
            panic!("expected a document");
        };

        assert_eq!(record.metadata.avg_confidence, 0.0);
        assert_eq!(record.metadata.num_text_blocks, 0);
    }

    #[test]
    fn flatten_rejects_misaligned_scores() {
        let results = vec![OcrResult {
            texts: vec!["A".to_string(), "B".to_string()],
            scores: vec![0.9],
        }];

        let outcome = flatten_results(Path::new("x.jpg"), &results, &engine_info());
        let ExtractionOutcome::Failed(reason) = outcome else {
            panic!("expected a rejection");
        };
        assert!(reason.contains("2 texts"));
        assert!(reason.contains("1 scores"));
    }

    #[test]
    fn flatten_rounds_confidence_to_four_decimals() {
        let results = vec![OcrResult {
            texts: vec!["line".to_string()],
            scores: vec![0.123_456],
        }];

        let outcome = flatten_results(Path::new("x.jpg"), &results, &engine_info());
        let ExtractionOutcome::Document(record) = outcome else {
            panic!("expected a document");
        };
        assert_eq!(record.metadata.avg_confidence, 0.1235);
    }

    #[test]
    fn flattened_text_splits_back_into_original_lines() {
        let lines = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let results = vec![OcrResult {
            texts: lines.clone(),
            scores: vec![0.9, 0.8, 0.7],
        }];

        let outcome = flatten_results(Path::new("x.jpg"), &results, &engine_info());
        let ExtractionOutcome::Document(record) = outcome else {
            panic!("expected a document");
        };

        let recovered: Vec<String> = record.text.split('\n').map(str::to_string).collect();
        assert_eq!(recovered, lines);
    }

    #[tokio::test]
    async fn driver_isolates_per_image_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let failing = touch(dir.path(), "broken.jpg");
        let succeeding = touch(dir.path(), "good.jpg");

        let mut outputs = HashMap::new();
        outputs.insert(
            PathBuf::from(&failing),
            Err("engine exploded".to_string()),
        );
        outputs.insert(
            PathBuf::from(&succeeding),
            Ok(vec![OcrResult {
                texts: vec!["hello".to_string()],
                scores: vec![0.95],
            }]),
        );

        let reader = OcrDocumentReader::new(ScriptedEngine::new(outputs));
        let documents = reader.load_documents(&[failing, succeeding.clone()]).await;

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].metadata.source_path, succeeding);
    }

    #[tokio::test]
    async fn driver_returns_empty_for_empty_and_blank_input() {
        let reader = OcrDocumentReader::new(ScriptedEngine::new(HashMap::new()));

        assert!(reader.load_documents(&[]).await.is_empty());
        assert!(reader.load_documents(&["".to_string()]).await.is_empty());
    }

    #[tokio::test]
    async fn driver_skips_no_text_images() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blank = touch(dir.path(), "blank.jpg");

        let mut outputs = HashMap::new();
        outputs.insert(PathBuf::from(&blank), Ok(vec![]));

        let reader = OcrDocumentReader::new(ScriptedEngine::new(outputs));
        assert!(reader.load_documents(&[blank]).await.is_empty());
    }

    #[tokio::test]
    async fn single_path_loader_wraps_the_batch_driver() {
        let dir = tempfile::tempdir().expect("tempdir");
        let image = touch(dir.path(), "one.jpg");

        let mut outputs = HashMap::new();
        outputs.insert(
            PathBuf::from(&image),
            Ok(vec![OcrResult {
                texts: vec!["only".to_string()],
                scores: vec![0.5],
            }]),
        );

        let reader = OcrDocumentReader::new(ScriptedEngine::new(outputs));
        let record = reader.load_document(&image).await.expect("document");
        assert_eq!(record.text, "only");
    }
}
