use serde_json::json;

use super::{image_data_url, Studio};
use crate::{
    error::AppError,
    observability::Engine,
    providers::{GenerationRequest, InputPart},
};

#[derive(Debug, Clone)]
pub struct UiMockupRequest {
    pub prompt: String,
    /// What is being designed, e.g. "Website", "Mobile App", "Dashboard"
    pub kind: String,
    /// "Desktop", "Mobile", ...
    pub device: String,
}

impl UiMockupRequest {
    /// Missing kind defaults to "Website", missing device to "Desktop"
    pub fn new(prompt: impl Into<String>, kind: Option<String>, device: Option<String>) -> Self {
        Self {
            prompt: prompt.into(),
            kind: kind.unwrap_or_else(|| "Website".to_string()),
            device: device.unwrap_or_else(|| "Desktop".to_string()),
        }
    }
}

/// Portrait for phones, landscape for everything else
fn aspect_ratio_for(device: &str) -> &'static str {
    if device == "Mobile" {
        "9:16"
    } else {
        "16:9"
    }
}

fn build_prompt(request: &UiMockupRequest) -> String {
    format!(
        "A high-quality, modern UI/UX design mockup for a {}. Device format: {}. \
         Project description: {}. Clean, beautiful, dribbble style, professional UI design, \
         vibrant colors, modern typography.",
        request.kind, request.device, request.prompt
    )
}

impl Studio {
    /// Render a UI mockup; returns a data URL
    pub async fn generate_ui_design(&self, request: UiMockupRequest) -> Result<String, AppError> {
        let generation = GenerationRequest {
            model: self.settings.image_model.clone(),
            parts: vec![InputPart::Text(build_prompt(&request))],
            aspect_ratio: Some(aspect_ratio_for(&request.device).to_string()),
        };

        let request_data = json!({
            "prompt": request.prompt,
            "type": request.kind,
            "device": request.device,
        });

        self.dispatch(
            Engine::UiMockup,
            request_data,
            "UI Mockup Generated Successfully",
            generation,
            |output| image_data_url(output, "Failed to generate UI design."),
        )
        .await
    }
}
