use serde_json::json;

use super::{image_data_url, Studio};
use crate::{
    error::AppError,
    image_utils::parse_inline_payload,
    observability::Engine,
    providers::{GenerationRequest, InputPart},
};

const TRY_ON_INSTRUCTIONS: &str = "Virtual Try-On (VTO) request.
Image 1: The target person (character).
Image 2: The product (clothing/accessory). NOTE: This image might be a standalone product OR a model wearing the product. If it's a model, identify the primary clothing item they are wearing.

Task: Edit Image 1 so the person is realistically wearing the exact product shown in Image 2.

CRITICAL INSTRUCTIONS:
1. MAINTAIN FRAMING: You MUST keep the exact same camera distance, crop, and framing as Image 1. Do NOT zoom in, crop the head, or let the person go out of frame. The person must remain fully visible exactly as they are in Image 1.
2. PRESERVE IDENTITY: Keep the person's face, body shape, pose, and background exactly the same as Image 1.
3. REALISM: Ensure the lighting, shadows, and fabric folds of the new clothing match the environment of Image 1 perfectly.";

#[derive(Debug, Clone)]
pub struct TryOnRequest {
    /// Person photo, data URL or bare base64
    pub person_image: String,
    /// Product photo, data URL or bare base64
    pub product_image: String,
    /// Extra user instructions appended to the try-on prompt
    pub prompt: Option<String>,
}

fn build_prompt(user_prompt: Option<&str>) -> String {
    match user_prompt.map(str::trim).filter(|p| !p.is_empty()) {
        Some(extra) => format!("{}\nUser instructions: {}", TRY_ON_INSTRUCTIONS, extra),
        None => TRY_ON_INSTRUCTIONS.to_string(),
    }
}

impl Studio {
    /// Dress the person in the product; returns the edited image as a data URL
    pub async fn process_try_on(&self, request: TryOnRequest) -> Result<String, AppError> {
        let person = parse_inline_payload(&request.person_image, "image/png")?;
        let product = parse_inline_payload(&request.product_image, "image/png")?;

        let request_data = json!({
            "prompt": request.prompt,
            "hasPerson": !request.person_image.is_empty(),
            "hasProduct": !request.product_image.is_empty(),
        });

        let generation = GenerationRequest {
            model: self.settings.image_model.clone(),
            parts: vec![
                InputPart::Inline {
                    mime_type: person.mime_type,
                    data: person.data,
                },
                InputPart::Inline {
                    mime_type: product.mime_type,
                    data: product.data,
                },
                InputPart::Text(build_prompt(request.prompt.as_deref())),
            ],
            aspect_ratio: None,
        };

        self.dispatch(
            Engine::TryOn,
            request_data,
            "Image Generated Successfully",
            generation,
            |output| image_data_url(output, "Failed to generate VTO image."),
        )
        .await
    }
}
