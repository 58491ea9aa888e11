//! OCR engine collaborator.
//!
//! The pipeline never runs recognition itself; it talks to an engine
//! behind the [`OcrEngine`] trait. The shipped implementation is
//! [`PaddleOcrClient`], an HTTP client for a PaddleOCR serving endpoint.

pub mod engine;
pub mod paddle;
pub mod types;

pub use engine::OcrEngine;
pub use paddle::PaddleOcrClient;
pub use types::{OcrEngineInfo, OcrResult};
