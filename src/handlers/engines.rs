//! Studio endpoints
//!
//! Every handler validates its body, calls one engine and answers with
//! `{"success": true, ...}`. Failures go through [`AppError`]'s response mapping.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::{
    engines::{TryOnRequest, UiMockupRequest},
    error::AppError,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnBody {
    pub person_image: Option<String>,
    pub product_image: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PromptBody {
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UiBody {
    pub prompt: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub device: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeBody {
    pub file: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ImageResponse {
    pub success: bool,
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct TextResponse {
    pub success: bool,
    pub text: String,
}

/// Empty strings count as missing
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// POST /api/vto
pub async fn handle_vto(
    State(state): State<AppState>,
    Json(body): Json<TryOnBody>,
) -> Result<Json<ImageResponse>, AppError> {
    let (Some(person_image), Some(product_image)) =
        (present(body.person_image), present(body.product_image))
    else {
        return Err(AppError::BadRequest(
            "personImage and productImage are required (base64)".to_string(),
        ));
    };

    let image = state
        .studio
        .process_try_on(TryOnRequest {
            person_image,
            product_image,
            prompt: present(body.prompt),
        })
        .await?;

    Ok(Json(ImageResponse {
        success: true,
        image,
    }))
}

/// POST /api/logo
pub async fn handle_logo(
    State(state): State<AppState>,
    Json(body): Json<PromptBody>,
) -> Result<Json<ImageResponse>, AppError> {
    let prompt =
        present(body.prompt).ok_or_else(|| AppError::BadRequest("prompt is required".to_string()))?;

    let image = state.studio.generate_logo(&prompt).await?;

    Ok(Json(ImageResponse {
        success: true,
        image,
    }))
}

/// POST /api/ui
pub async fn handle_ui(
    State(state): State<AppState>,
    Json(body): Json<UiBody>,
) -> Result<Json<ImageResponse>, AppError> {
    let prompt =
        present(body.prompt).ok_or_else(|| AppError::BadRequest("prompt is required".to_string()))?;

    let request = UiMockupRequest::new(prompt, present(body.kind), present(body.device));
    let image = state.studio.generate_ui_design(request).await?;

    Ok(Json(ImageResponse {
        success: true,
        image,
    }))
}

/// POST /api/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeBody>,
) -> Result<Json<TextResponse>, AppError> {
    let (Some(file), Some(mime_type)) = (present(body.file), present(body.mime_type)) else {
        return Err(AppError::BadRequest(
            "file (base64) and mimeType are required".to_string(),
        ));
    };

    let text = state.studio.analyze_media(&file, &mime_type).await?;

    Ok(Json(TextResponse {
        success: true,
        text,
    }))
}
