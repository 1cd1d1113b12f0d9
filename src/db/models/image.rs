//! Gallery images. Unlike cookbooks and recipes, the uploaded file is required.

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, SqlitePool};

use super::common::{timestamp_now, BlobRef};
use crate::db::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub creator_id: String,
    pub caption: String,
    pub icon: BlobRef,
    pub created_at: String,
}

#[derive(FromRow)]
struct ImageRow {
    id: String,
    creator_id: String,
    caption: String,
    icon: Json<BlobRef>,
    created_at: String,
}

impl From<ImageRow> for Image {
    fn from(row: ImageRow) -> Self {
        Self {
            id: row.id,
            creator_id: row.creator_id,
            caption: row.caption,
            icon: row.icon.0,
            created_at: row.created_at,
        }
    }
}

impl Image {
    pub async fn create(
        db: &SqlitePool,
        creator_id: &str,
        caption: &str,
        icon: &BlobRef,
    ) -> Result<Image, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();

        sqlx::query(
            "INSERT INTO images (id, creator_id, caption, icon, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(creator_id)
        .bind(caption)
        .bind(serde_json::to_string(icon)?)
        .bind(&now)
        .execute(db)
        .await?;

        Ok(Image {
            id,
            creator_id: creator_id.to_string(),
            caption: caption.to_string(),
            icon: icon.clone(),
            created_at: now,
        })
    }

    pub async fn list_by_creator(
        db: &SqlitePool,
        creator_id: &str,
    ) -> Result<Vec<Image>, sqlx::Error> {
        let rows: Vec<ImageRow> = sqlx::query_as(
            r#"
            SELECT id, creator_id, caption, icon, created_at
            FROM images
            WHERE creator_id = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(creator_id)
        .fetch_all(db)
        .await?;

        Ok(rows.into_iter().map(Image::from).collect())
    }
}
