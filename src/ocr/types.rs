/// Recognition output for one region group of an image.
///
/// `texts` and `scores` are index-aligned: `scores[i]` is the confidence
/// for `texts[i]`. Engines may return several of these per image.
#[derive(Debug, Clone, Default)]
pub struct OcrResult {
    pub texts: Vec<String>,
    pub scores: Vec<f32>,
}

/// Identity of the engine instance, recorded into document metadata.
#[derive(Debug, Clone)]
pub struct OcrEngineInfo {
    pub model_version: String,
    pub lang: String,
    pub device: String,
}
