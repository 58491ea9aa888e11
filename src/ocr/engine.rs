use std::path::Path;

use async_trait::async_trait;

use crate::core::errors::PipelineError;
use super::types::{OcrEngineInfo, OcrResult};

#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// return the engine name (e.g. "paddleocr")
    fn name(&self) -> &str;

    /// identity of the running engine: model version, language, device
    fn info(&self) -> &OcrEngineInfo;

    /// recognize text in one image, returning per-region-group results
    async fn recognize(&self, image_path: &Path) -> Result<Vec<OcrResult>, PipelineError>;
}
