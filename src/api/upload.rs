//! Form input collection, including multipart forms carrying one file.
//!
//! Every text field is sanitized on the way in. A file under the expected
//! field name is streamed straight into the blob store as its bytes arrive.

use axum::extract::multipart::{Multipart, MultipartError};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use super::sanitize::{sanitize_json, sanitize_text};
use crate::db::{BlobRef, BlobStore, IMAGES_BUCKET};

/// Multipart field carrying a cookbook icon
pub const COOKBOOK_ICON_FIELD: &str = "cookbookicon";
/// Multipart field carrying a recipe icon
pub const RECIPE_ICON_FIELD: &str = "recipeicon";
/// Multipart field carrying a gallery image
pub const GALLERY_IMAGE_FIELD: &str = "galleryimages";

/// Sanitized text fields of a submitted form
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    values: Map<String, Value>,
}

impl FormFields {
    /// Collect name/value pairs. Operator-like names are dropped and values
    /// are stripped of control characters. The first value of a name wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut values = Map::new();
        for (name, value) in pairs {
            values
                .entry(name)
                .or_insert_with(|| Value::String(sanitize_text(&value)));
        }

        match sanitize_json(Value::Object(values)) {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    pub fn text(&self, name: &str) -> Option<String> {
        self.values
            .get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// First present field among `names`
    pub fn text_any(&self, names: &[&str]) -> Option<String> {
        names.iter().find_map(|name| self.text(name))
    }
}

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("blob store error: {0}")]
    Store(#[from] sqlx::Error),
}

/// A parsed multipart form: its text fields plus the stored file, if any
#[derive(Debug, Default)]
pub struct UploadForm {
    pub fields: FormFields,
    pub file: Option<BlobRef>,
}

impl UploadForm {
    /// Delete the stored file when the form it came with is rejected
    pub async fn discard(self, blobs: &BlobStore) {
        if let Some(file) = self.file {
            match blobs.delete(&file.id).await {
                Ok(_) => debug!(blob_id = %file.id, "Discarded upload of rejected form"),
                Err(e) => warn!(blob_id = %file.id, error = %e, "Failed to discard upload"),
            }
        }
    }
}

/// Read a multipart form, storing the first non-empty file sent under
/// `file_field` in the images bucket. Files under other names are ignored.
pub async fn read_upload_form(
    blobs: &BlobStore,
    mut multipart: Multipart,
    file_field: &str,
) -> Result<UploadForm, UploadError> {
    let mut pairs = Vec::new();
    let mut file: Option<BlobRef> = None;

    let result: Result<(), UploadError> = async {
        while let Some(mut field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(sanitize_text);

            match filename {
                None => {
                    let value = field.text().await?;
                    pairs.push((name, value));
                }
                Some(filename) if name == file_field && file.is_none() && !filename.is_empty() => {
                    let content_type = field.content_type().map(str::to_string);
                    let mut writer = blobs
                        .begin(IMAGES_BUCKET, &filename, content_type.as_deref())
                        .await?;

                    let streamed: Result<(), UploadError> = async {
                        while let Some(chunk) = field.chunk().await? {
                            writer.write(&chunk).await?;
                        }
                        Ok(())
                    }
                    .await;

                    if let Err(e) = streamed {
                        if let Err(abort_err) = writer.abort().await {
                            warn!(error = %abort_err, "Failed to remove partial upload");
                        }
                        return Err(e);
                    }

                    file = Some(writer.finish().await?);
                }
                Some(_) => {
                    // Unexpected or empty file part, drain it
                    while field.chunk().await?.is_some() {}
                }
            }
        }
        Ok(())
    }
    .await;

    let form = UploadForm {
        fields: FormFields::from_pairs(pairs),
        file,
    };

    match result {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard(blobs).await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields_drop_operator_names() {
        let fields = FormFields::from_pairs(vec![
            ("title".to_string(), "Pies".to_string()),
            ("$where".to_string(), "1".to_string()),
            ("tags.0".to_string(), "x".to_string()),
        ]);

        assert_eq!(fields.text("title"), Some("Pies".to_string()));
        assert_eq!(fields.text("$where"), None);
        assert_eq!(fields.text("tags.0"), None);
    }

    #[test]
    fn test_form_fields_first_value_wins_and_is_cleaned() {
        let fields = FormFields::from_pairs(vec![
            ("caption".to_string(), "first\0".to_string()),
            ("caption".to_string(), "second".to_string()),
        ]);

        assert_eq!(fields.text("caption"), Some("first".to_string()));
    }

    #[test]
    fn test_text_any() {
        let fields = FormFields::from_pairs(vec![("servingSize".to_string(), "2".to_string())]);

        assert_eq!(
            fields.text_any(&["servingsize", "servingSize"]),
            Some("2".to_string())
        );
        assert_eq!(fields.text_any(&["preptime", "prepTime"]), None);
    }
}
