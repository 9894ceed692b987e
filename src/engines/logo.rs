use serde_json::json;

use super::{image_data_url, Studio};
use crate::{
    error::AppError,
    observability::Engine,
    providers::{GenerationRequest, InputPart},
};

fn build_prompt(description: &str) -> String {
    format!(
        "A professional, highly designed, and meaningful business logo. Description: {}. \
         Clean background, vector art style, modern, scalable, premium corporate identity.",
        description
    )
}

impl Studio {
    /// Generate a logo from a free-text description; returns a data URL
    pub async fn generate_logo(&self, prompt: &str) -> Result<String, AppError> {
        let generation = GenerationRequest {
            model: self.settings.image_model.clone(),
            parts: vec![InputPart::Text(build_prompt(prompt))],
            aspect_ratio: None,
        };

        self.dispatch(
            Engine::Logo,
            json!({ "prompt": prompt }),
            "Logo Generated Successfully",
            generation,
            |output| image_data_url(output, "Failed to generate logo."),
        )
        .await
    }
}
