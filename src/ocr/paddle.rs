use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::config::OcrConfig;
use crate::core::errors::PipelineError;
use super::engine::OcrEngine;
use super::types::{OcrEngineInfo, OcrResult};

/// Model identifier reported in document metadata.
const MODEL_VERSION: &str = "PP-OCRv5";

const FILE_TYPE_PDF: u8 = 0;
const FILE_TYPE_IMAGE: u8 = 1;

/// HTTP client for a PaddleOCR serving endpoint.
///
/// Files are shipped base64-encoded in a JSON body; the response carries
/// aligned `rec_texts`/`rec_scores` arrays per detected region group.
/// The document-orientation and unwarping stages are disabled; the
/// research setup runs plain detection and recognition.
pub struct PaddleOcrClient {
    endpoint: String,
    client: Client,
    info: OcrEngineInfo,
    options: Map<String, Value>,
}

impl PaddleOcrClient {
    /// Construct the client. Fails on an invalid endpoint or HTTP client
    /// configuration; there is no recovering from either, so the error
    /// propagates to the caller.
    pub fn new(config: &OcrConfig) -> Result<Self, PipelineError> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        reqwest::Url::parse(&endpoint).map_err(|err| {
            PipelineError::Config(format!("invalid ocr endpoint '{}': {}", endpoint, err))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| PipelineError::Config(format!("failed to build http client: {}", err)))?;

        Ok(Self {
            endpoint,
            client,
            info: OcrEngineInfo {
                model_version: MODEL_VERSION.to_string(),
                lang: config.lang.clone(),
                device: config.device.clone(),
            },
            options: config.options.clone(),
        })
    }
}

#[async_trait]
impl OcrEngine for PaddleOcrClient {
    fn name(&self) -> &str {
        "paddleocr"
    }

    fn info(&self) -> &OcrEngineInfo {
        &self.info
    }

    async fn recognize(&self, image_path: &Path) -> Result<Vec<OcrResult>, PipelineError> {
        let bytes = tokio::fs::read(image_path).await.map_err(|err| {
            PipelineError::Ocr(format!("failed to read {}: {}", image_path.display(), err))
        })?;

        let mut body = json!({
            "file": STANDARD.encode(&bytes),
            "fileType": file_type_for(image_path),
            "useDocOrientationClassify": false,
            "useDocUnwarping": false,
            "useTextlineOrientation": false,
        });
        if let Some(obj) = body.as_object_mut() {
            // Configured passthrough options go into the request unchanged.
            for (key, value) in &self.options {
                obj.insert(key.clone(), value.clone());
            }
        }

        let url = format!("{}/ocr", self.endpoint);
        tracing::debug!("submitting {} to {}", image_path.display(), url);

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| PipelineError::Ocr(format!("ocr request failed: {}", err)))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(PipelineError::Ocr(format!(
                "ocr serving returned {}: {}",
                status, text
            )));
        }

        let payload: ServingResponse = res
            .json()
            .await
            .map_err(|err| PipelineError::Ocr(format!("malformed ocr response: {}", err)))?;

        Ok(payload
            .result
            .ocr_results
            .into_iter()
            .map(|entry| OcrResult {
                texts: entry.pruned_result.rec_texts,
                scores: entry.pruned_result.rec_scores,
            })
            .collect())
    }
}

fn file_type_for(path: &Path) -> u8 {
    let is_pdf = path
        .extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if is_pdf {
        FILE_TYPE_PDF
    } else {
        FILE_TYPE_IMAGE
    }
}

#[derive(Deserialize)]
struct ServingResponse {
    result: ServingResult,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServingResult {
    #[serde(default)]
    ocr_results: Vec<ServingOcrResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServingOcrResult {
    pruned_result: PrunedResult,
}

#[derive(Deserialize)]
struct PrunedResult {
    #[serde(default)]
    rec_texts: Vec<String>,
    #[serde(default)]
    rec_scores: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serving_response_parses_aligned_arrays() {
        let payload = json!({
            "result": {
                "ocrResults": [
                    {
                        "prunedResult": {
                            "rec_texts": ["first line", "second line"],
                            "rec_scores": [0.98, 0.91]
                        }
                    }
                ]
            }
        });

        let parsed: ServingResponse = serde_json::from_value(payload).expect("parse");
        let groups = &parsed.result.ocr_results;

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].pruned_result.rec_texts.len(), 2);
        assert_eq!(groups[0].pruned_result.rec_scores, vec![0.98, 0.91]);
    }

    #[test]
    fn serving_response_tolerates_missing_fields() {
        let payload = json!({
            "result": { "ocrResults": [ { "prunedResult": {} } ] }
        });

        let parsed: ServingResponse = serde_json::from_value(payload).expect("parse");
        assert!(parsed.result.ocr_results[0].pruned_result.rec_texts.is_empty());
    }

    #[test]
    fn pdf_files_get_the_pdf_type() {
        assert_eq!(file_type_for(Path::new("scan.PDF")), FILE_TYPE_PDF);
        assert_eq!(file_type_for(Path::new("photo.jpg")), FILE_TYPE_IMAGE);
        assert_eq!(file_type_for(Path::new("no_extension")), FILE_TYPE_IMAGE);
    }

    #[test]
    fn construction_rejects_invalid_endpoint() {
        let config = OcrConfig {
            endpoint: "not a url".to_string(),
            ..OcrConfig::default()
        };

        let result = PaddleOcrClient::new(&config);
        assert!(matches!(result, Err(PipelineError::Config(_))));
    }

    #[test]
    fn construction_strips_trailing_slash() {
        let config = OcrConfig {
            endpoint: "http://localhost:8080/".to_string(),
            ..OcrConfig::default()
        };

        let client = PaddleOcrClient::new(&config).expect("client");
        assert_eq!(client.endpoint, "http://localhost:8080");
        assert_eq!(client.info().model_version, MODEL_VERSION);
    }
}
