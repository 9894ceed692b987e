use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::{
    config::GeminiConfig,
    error::AppError,
    models::gemini::{
        Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageConfig,
        Part,
    },
    providers::{GenerationOutput, GenerationRequest, GenerativeProvider, InputPart, OutputPart},
};

/// Google Gemini `generateContent` client
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(client: Client, config: GeminiConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, AppError> {
        let model = request.model.clone();
        let body = build_request(request);

        let response = generate_content(&self.client, &self.config, &model, &body).await?;
        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            tracing::debug!(
                model = %model,
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }

        Ok(convert_response(parsed))
    }
}

/// Call Gemini Generate Content API
/// Note: Model name is part of the URL path
pub async fn generate_content(
    client: &Client,
    config: &GeminiConfig,
    model: &str,
    request: &GenerateContentRequest,
) -> Result<reqwest::Response, AppError> {
    // Gemini API format: /v1beta/models/{model}:generateContent
    let url = format!("{}/models/{}:generateContent", config.base_url, model);

    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        // Kept out of the URL so transport errors never carry the key
        .header("x-goog-api-key", &config.api_key)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .json(request)
        .send()
        .await?;

    // Check for HTTP errors
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AppError::UpstreamError {
            status,
            message: error_text,
        });
    }

    Ok(response)
}

fn build_request(request: GenerationRequest) -> GenerateContentRequest {
    let parts = request
        .parts
        .into_iter()
        .map(|part| match part {
            InputPart::Inline { mime_type, data } => Part::inline(mime_type, data),
            InputPart::Text(text) => Part::text(text),
        })
        .collect();

    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        generation_config: request.aspect_ratio.map(|aspect_ratio| GenerationConfig {
            image_config: Some(ImageConfig { aspect_ratio }),
        }),
    }
}

/// Only the first candidate is used
fn convert_response(response: GenerateContentResponse) -> GenerationOutput {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| match (part.inline_data, part.text) {
            (Some(inline), _) => Some(OutputPart::Image {
                mime_type: inline.mime_type,
                data: inline.data,
            }),
            (None, Some(text)) => Some(OutputPart::Text(text)),
            (None, None) => None,
        })
        .collect();

    GenerationOutput { parts }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gemini::{Candidate, InlineData};

    #[test]
    fn test_build_request_keeps_part_order() {
        let request = GenerationRequest {
            model: "gemini-2.5-flash-image".to_string(),
            parts: vec![
                InputPart::Inline {
                    mime_type: "image/png".to_string(),
                    data: "AAAA".to_string(),
                },
                InputPart::Text("Edit image 1".to_string()),
            ],
            aspect_ratio: None,
        };

        let body = build_request(request);
        assert_eq!(body.contents.len(), 1);
        let parts = &body.contents[0].parts;
        assert_eq!(parts[0].inline_data.as_ref().unwrap().data, "AAAA");
        assert_eq!(parts[1].text.as_deref(), Some("Edit image 1"));
        assert!(body.generation_config.is_none());
    }

    #[test]
    fn test_build_request_sets_aspect_ratio() {
        let request = GenerationRequest {
            model: "gemini-2.5-flash-image".to_string(),
            parts: vec![InputPart::Text("mockup".to_string())],
            aspect_ratio: Some("9:16".to_string()),
        };

        let json = serde_json::to_value(build_request(request)).unwrap();
        assert_eq!(json["generationConfig"]["imageConfig"]["aspectRatio"], "9:16");
    }

    #[test]
    fn test_convert_response_reads_first_candidate_only() {
        let candidate = |parts: Vec<Part>| Candidate {
            content: Some(Content { role: None, parts }),
            finish_reason: Some("STOP".to_string()),
        };
        let response = GenerateContentResponse {
            candidates: vec![
                candidate(vec![
                    Part::text("caption"),
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: "image/png".to_string(),
                            data: "FIRST".to_string(),
                        }),
                    },
                    Part::default(),
                ]),
                candidate(vec![Part::inline("image/png", "SECOND")]),
            ],
            usage_metadata: None,
            model_version: None,
        };

        let output = convert_response(response);
        assert_eq!(output.parts.len(), 2);
        assert_eq!(output.first_image(), Some(("image/png", "FIRST")));
    }

    #[test]
    fn test_convert_response_without_candidates() {
        let response = GenerateContentResponse {
            candidates: vec![],
            usage_metadata: None,
            model_version: None,
        };
        assert!(convert_response(response).parts.is_empty());
    }
}
