use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::Instrument;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::error::GenerationError;
use crate::models::generation::{GenerationRequest, GenerationResponse};
use crate::services::staging::StagedImage;

/// Fields read from the multipart form.
#[derive(Default)]
struct UploadForm {
    image: Option<Vec<u8>>,
    scene: Option<String>,
}

fn form_error(e: MultipartError) -> GenerationError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        GenerationError::PayloadTooLarge(e.body_text())
    } else {
        GenerationError::InvalidForm(e.body_text())
    }
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, GenerationError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("image") => {
                let data = field.bytes().await.map_err(form_error)?;
                form.image = Some(data.to_vec());
            }
            Some("scene") => {
                let scene = field.text().await.map_err(form_error)?;
                let scene = scene.trim();
                form.scene = (!scene.is_empty()).then(|| scene.to_string());
            }
            _ => {}
        }
    }

    Ok(form)
}

/// POST /generate-image (and /upload): restyle an uploaded image.
///
/// A body that is not multipart at all carries no image, so it gets the
/// same 400 as a form without one.
pub async fn generate_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<GenerationResponse>, GenerationError> {
    let multipart = multipart.map_err(|e| {
        tracing::info!(reason = %e.body_text(), "Request is not multipart, no image uploaded");
        GenerationError::MissingInput
    })?;
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("generate_image", request_id = %request_id);
    handle_upload(state, multipart).instrument(span).await
}

async fn handle_upload(
    state: AppState,
    multipart: Multipart,
) -> Result<Json<GenerationResponse>, GenerationError> {
    let form = read_form(multipart).await?;

    let image = match form.image {
        Some(data) if !data.is_empty() => data,
        _ => {
            tracing::info!("No image uploaded");
            return Err(GenerationError::MissingInput);
        }
    };

    let format = image::guess_format(&image).map_err(|_| GenerationError::UnsupportedMedia)?;
    let extension = format.extensions_str().first().copied().unwrap_or("bin");

    let size = image.len();
    let staged = StagedImage::stage(
        state.upload_dir.to_path_buf(),
        image,
        format.to_mime_type(),
        extension,
    )
    .await?;
    tracing::info!(
        file = staged.file_name(),
        bytes = size,
        format = ?format,
        "Image staged"
    );

    let scene = form.scene;
    if let Some(key) = scene.as_deref() {
        if !state.prompts.contains(key) {
            tracing::info!(scene = key, "Unknown scene, using default prompt");
        }
    }
    let prompt = state.prompts.resolve(scene.as_deref());

    let generated = state
        .orchestrator
        .generate(GenerationRequest::new(staged, scene), prompt)
        .await?;

    Ok(Json(GenerationResponse {
        success: true,
        image_url: generated.image_url,
    }))
}
