use serde_json::json;

use super::Studio;
use crate::{
    error::AppError,
    image_utils::parse_inline_payload,
    observability::Engine,
    providers::{GenerationRequest, InputPart},
};

const ANALYSIS_PROMPT: &str = "Analyze this media carefully. Provide a highly detailed prompt that could be used to recreate it using generative AI.
If it's a video or image: Describe the scenes, environment, lighting, camera angles, subjects, colors, and mood in extreme detail.
If it's audio or a video with sound: Describe the lyrics, background sound type, voice pitch, instruments, tempo, and audio atmosphere.
Format the output clearly with bullet points so the user can easily copy-paste it as a prompt.";

const NO_ANALYSIS: &str = "No analysis generated.";

impl Studio {
    /// Describe an image, video or audio file as a recreation prompt
    pub async fn analyze_media(&self, file: &str, mime_type: &str) -> Result<String, AppError> {
        let payload = parse_inline_payload(file, mime_type)?;

        let generation = GenerationRequest {
            model: self.settings.text_model.clone(),
            parts: vec![
                InputPart::Inline {
                    mime_type: mime_type.to_string(),
                    data: payload.data,
                },
                InputPart::Text(ANALYSIS_PROMPT.to_string()),
            ],
            aspect_ratio: None,
        };

        self.dispatch(
            Engine::MediaAnalysis,
            json!({ "mimeType": mime_type, "dataSize": file.len() }),
            "Analysis Completed",
            generation,
            |output| Ok(output.text().unwrap_or_else(|| NO_ANALYSIS.to_string())),
        )
        .await
    }
}
