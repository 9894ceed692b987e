//! Outbound generative-AI providers
//!
//! Engines talk to a [`GenerativeProvider`] and never see the wire format. The
//! production implementation is [`gemini::GeminiProvider`]; tests plug in
//! scripted fakes.

pub mod gemini;

use async_trait::async_trait;

use crate::error::AppError;

/// One input part of a generation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPart {
    /// Base64-encoded file contents
    Inline { mime_type: String, data: String },
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub parts: Vec<InputPart>,
    /// Requested output aspect ratio for image models, e.g. "16:9"
    pub aspect_ratio: Option<String>,
}

/// One output part of a provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPart {
    Image { mime_type: String, data: String },
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationOutput {
    pub parts: Vec<OutputPart>,
}

impl GenerationOutput {
    /// First image part, as `(mime_type, base64 data)`
    pub fn first_image(&self) -> Option<(&str, &str)> {
        self.parts.iter().find_map(|part| match part {
            OutputPart::Image { mime_type, data } => Some((mime_type.as_str(), data.as_str())),
            OutputPart::Text(_) => None,
        })
    }

    /// All text parts joined together, or `None` when there is no non-empty text
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .parts
            .iter()
            .filter_map(|part| match part {
                OutputPart::Text(text) => Some(text.as_str()),
                OutputPart::Image { .. } => None,
            })
            .collect();

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, AppError>;
}
