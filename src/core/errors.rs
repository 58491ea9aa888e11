use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("ocr engine error: {0}")]
    Ocr(String),
    #[error("llm provider error: {0}")]
    Provider(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        PipelineError::Internal(err.to_string())
    }
}
