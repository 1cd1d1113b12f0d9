use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::auth::SessionContext;
use super::error::PageError;
use super::upload::{read_upload_form, GALLERY_IMAGE_FIELD};
use super::validation::{required_text, IMAGE_SAVE_ERROR};
use crate::db::Image;
use crate::ui::{render_template, GalleryTemplate, ImageView};
use crate::AppState;

async fn render_gallery(
    state: &AppState,
    creator_id: &str,
    error: Option<&str>,
) -> Result<Response, PageError> {
    let images = Image::list_by_creator(&state.db, creator_id).await?;

    Ok(render_template(GalleryTemplate {
        images: images.iter().map(ImageView::from).collect(),
        error: error.map(str::to_string),
    }))
}

/// GET /mygallery
pub async fn my_gallery(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Result<Response, PageError> {
    render_gallery(&state, &session.user.id, None).await
}

/// POST /mygallery - upload a captioned image
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    multipart: Multipart,
) -> Result<Response, PageError> {
    let form = match read_upload_form(&state.blobs, multipart, GALLERY_IMAGE_FIELD).await {
        Ok(form) => form,
        Err(e) => {
            warn!("Failed to read gallery upload: {}", e);
            return render_gallery(&state, &session.user.id, Some(IMAGE_SAVE_ERROR)).await;
        }
    };

    let caption = required_text(form.fields.text("caption").as_deref());
    let (caption, file) = match (caption, form.file.clone()) {
        (Some(caption), Some(file)) => (caption, file),
        _ => {
            form.discard(&state.blobs).await;
            return render_gallery(&state, &session.user.id, Some(IMAGE_SAVE_ERROR)).await;
        }
    };

    match Image::create(&state.db, &session.user.id, &caption, &file).await {
        Ok(image) => {
            info!(image_id = %image.id, username = %session.user.username, "Uploaded gallery image");
            Ok(Redirect::to("/mygallery").into_response())
        }
        Err(e) => {
            error!("Failed to create image: {}", e);
            form.discard(&state.blobs).await;
            render_gallery(&state, &session.user.id, Some(IMAGE_SAVE_ERROR)).await
        }
    }
}
