//! Cookbook documents: a user-owned, tagged collection of recipes.

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, SqlitePool};

use super::common::{encode_icon, encode_list, timestamp_now, BlobRef};
use crate::db::{insert_with_unique_slug, slugify, SlugTable, StoreError};

const COOKBOOK_COLUMNS: &str = "id, creator_id, title, tags, icon, slug, created_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookbook {
    pub id: String,
    pub creator_id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub icon: Option<BlobRef>,
    pub slug: String,
    pub created_at: String,
}

#[derive(FromRow)]
struct CookbookRow {
    id: String,
    creator_id: String,
    title: String,
    tags: Json<Vec<String>>,
    icon: Option<Json<BlobRef>>,
    slug: String,
    created_at: String,
}

impl From<CookbookRow> for Cookbook {
    fn from(row: CookbookRow) -> Self {
        Self {
            id: row.id,
            creator_id: row.creator_id,
            title: row.title,
            tags: row.tags.0,
            icon: row.icon.map(|icon| icon.0),
            slug: row.slug,
            created_at: row.created_at,
        }
    }
}

/// Fields collected from the cookbook form
#[derive(Debug, Clone)]
pub struct NewCookbook {
    pub creator_id: String,
    pub creator_name: String,
    pub title: String,
    pub tags: Vec<String>,
    pub icon: Option<BlobRef>,
}

impl Cookbook {
    /// Insert a cookbook, deriving a unique slug from the creator and title
    pub async fn create(db: &SqlitePool, new: &NewCookbook) -> Result<Cookbook, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();
        let tags = encode_list(&new.tags)?;
        let icon = encode_icon(new.icon.as_ref())?;
        let row = (&id, &now, &tags, &icon);

        let base = slugify(&new.creator_name, &new.title);
        let slug = insert_with_unique_slug(db, SlugTable::Cookbooks, &base, move |slug| async move {
            let (id, now, tags, icon) = row;
            sqlx::query(
                r#"
                INSERT INTO cookbooks (id, creator_id, title, tags, icon, slug, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(&new.creator_id)
            .bind(&new.title)
            .bind(tags)
            .bind(icon)
            .bind(&slug)
            .bind(now)
            .execute(db)
            .await?;
            Ok::<_, StoreError>(slug)
        })
        .await?;

        Ok(Cookbook {
            id,
            creator_id: new.creator_id.clone(),
            title: new.title.clone(),
            tags: new.tags.clone(),
            icon: new.icon.clone(),
            slug,
            created_at: now,
        })
    }

    pub async fn list_by_creator(
        db: &SqlitePool,
        creator_id: &str,
    ) -> Result<Vec<Cookbook>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM cookbooks WHERE creator_id = ? ORDER BY created_at, rowid",
            COOKBOOK_COLUMNS
        );
        let rows: Vec<CookbookRow> = sqlx::query_as(&query)
            .bind(creator_id)
            .fetch_all(db)
            .await?;

        Ok(rows.into_iter().map(Cookbook::from).collect())
    }

    pub async fn find_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Cookbook>, sqlx::Error> {
        let query = format!("SELECT {} FROM cookbooks WHERE slug = ?", COOKBOOK_COLUMNS);
        let row: Option<CookbookRow> = sqlx::query_as(&query)
            .bind(slug)
            .fetch_optional(db)
            .await?;

        Ok(row.map(Cookbook::from))
    }

    /// All cookbooks, from any creator, whose tags contain `tag` exactly
    pub async fn find_by_tag(db: &SqlitePool, tag: &str) -> Result<Vec<Cookbook>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {} FROM cookbooks
            WHERE EXISTS (SELECT 1 FROM json_each(cookbooks.tags) WHERE json_each.value = ?)
            ORDER BY created_at, rowid
            "#,
            COOKBOOK_COLUMNS
        );
        let rows: Vec<CookbookRow> = sqlx::query_as(&query).bind(tag).fetch_all(db).await?;

        Ok(rows.into_iter().map(Cookbook::from).collect())
    }
}
