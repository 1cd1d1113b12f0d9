//! Common types and helpers shared across models.

use serde::{Deserialize, Serialize};

/// Descriptor of an uploaded file held in the blob store.
///
/// Embedded as the `icon` field of cookbooks, recipes and gallery images.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlobRef {
    pub id: String,
    pub filename: String,
    pub bucket: String,
}

impl BlobRef {
    /// Path the image is served from
    pub fn url(&self) -> String {
        format!("/image/{}", self.id)
    }
}

/// Current time as stored in `created_at` columns
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Encode a list-valued field for a JSON text column
pub(crate) fn encode_list(values: &[String]) -> Result<String, serde_json::Error> {
    serde_json::to_string(values)
}

/// Encode an optional blob descriptor for a nullable JSON text column
pub(crate) fn encode_icon(icon: Option<&BlobRef>) -> Result<Option<String>, serde_json::Error> {
    icon.map(serde_json::to_string).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_ref_url() {
        let icon = BlobRef {
            id: "abc".to_string(),
            filename: "pie.png".to_string(),
            bucket: "images".to_string(),
        };
        assert_eq!(icon.url(), "/image/abc");
    }

    #[test]
    fn test_encode_icon() {
        assert_eq!(encode_icon(None).unwrap(), None);

        let icon = BlobRef {
            id: "abc".to_string(),
            filename: "pie.png".to_string(),
            bucket: "images".to_string(),
        };
        let encoded = encode_icon(Some(&icon)).unwrap().unwrap();
        let decoded: BlobRef = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, icon);
    }
}
