//! Recipe documents. A recipe may be linked into any number of cookbooks
//! through its `cookbooks` list of cookbook ids.

use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, SqlitePool};

use super::common::{encode_icon, encode_list, timestamp_now, BlobRef};
use crate::db::{insert_with_unique_slug, slugify, SlugTable, StoreError};

const RECIPE_COLUMNS: &str = "id, creator_id, name, slug, tags, prep_time, serving_size, \
     ingredients, supplies, steps, icon, cookbooks, created_at";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub creator_id: String,
    pub name: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub prep_time: String,
    pub serving_size: i64,
    pub ingredients: Vec<String>,
    pub supplies: Vec<String>,
    pub steps: Vec<String>,
    pub icon: Option<BlobRef>,
    pub cookbooks: Vec<String>,
    pub created_at: String,
}

#[derive(FromRow)]
struct RecipeRow {
    id: String,
    creator_id: String,
    name: String,
    slug: String,
    tags: Json<Vec<String>>,
    prep_time: String,
    serving_size: i64,
    ingredients: Json<Vec<String>>,
    supplies: Json<Vec<String>>,
    steps: Json<Vec<String>>,
    icon: Option<Json<BlobRef>>,
    cookbooks: Json<Vec<String>>,
    created_at: String,
}

impl From<RecipeRow> for Recipe {
    fn from(row: RecipeRow) -> Self {
        Self {
            id: row.id,
            creator_id: row.creator_id,
            name: row.name,
            slug: row.slug,
            tags: row.tags.0,
            prep_time: row.prep_time,
            serving_size: row.serving_size,
            ingredients: row.ingredients.0,
            supplies: row.supplies.0,
            steps: row.steps.0,
            icon: row.icon.map(|icon| icon.0),
            cookbooks: row.cookbooks.0,
            created_at: row.created_at,
        }
    }
}

/// Validated fields from the recipe form
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub creator_id: String,
    pub creator_name: String,
    pub name: String,
    pub tags: Vec<String>,
    pub prep_time: String,
    pub serving_size: i64,
    pub ingredients: Vec<String>,
    pub supplies: Vec<String>,
    pub steps: Vec<String>,
    pub icon: Option<BlobRef>,
}

impl Recipe {
    /// Insert a recipe that belongs to no cookbook yet
    pub async fn create(db: &SqlitePool, new: &NewRecipe) -> Result<Recipe, StoreError> {
        let id = uuid::Uuid::new_v4().to_string();
        let now = timestamp_now();
        let lists = (
            encode_list(&new.tags)?,
            encode_list(&new.ingredients)?,
            encode_list(&new.supplies)?,
            encode_list(&new.steps)?,
        );
        let icon = encode_icon(new.icon.as_ref())?;
        let row = (&id, &now, &lists, &icon);

        let base = slugify(&new.creator_name, &new.name);
        let slug = insert_with_unique_slug(db, SlugTable::Recipes, &base, move |slug| async move {
            let (id, now, (tags, ingredients, supplies, steps), icon) = row;
            sqlx::query(
                r#"
                INSERT INTO recipes (id, creator_id, name, slug, tags, prep_time, serving_size,
                                     ingredients, supplies, steps, icon, cookbooks, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', ?)
                "#,
            )
            .bind(id)
            .bind(&new.creator_id)
            .bind(&new.name)
            .bind(&slug)
            .bind(tags)
            .bind(&new.prep_time)
            .bind(new.serving_size)
            .bind(ingredients)
            .bind(supplies)
            .bind(steps)
            .bind(icon)
            .bind(now)
            .execute(db)
            .await?;
            Ok::<_, StoreError>(slug)
        })
        .await?;

        Ok(Recipe {
            id,
            creator_id: new.creator_id.clone(),
            name: new.name.clone(),
            slug,
            tags: new.tags.clone(),
            prep_time: new.prep_time.clone(),
            serving_size: new.serving_size,
            ingredients: new.ingredients.clone(),
            supplies: new.supplies.clone(),
            steps: new.steps.clone(),
            icon: new.icon.clone(),
            cookbooks: Vec::new(),
            created_at: now,
        })
    }

    pub async fn list_by_creator(
        db: &SqlitePool,
        creator_id: &str,
    ) -> Result<Vec<Recipe>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM recipes WHERE creator_id = ? ORDER BY created_at, rowid",
            RECIPE_COLUMNS
        );
        let rows: Vec<RecipeRow> = sqlx::query_as(&query)
            .bind(creator_id)
            .fetch_all(db)
            .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    /// Recipes linked into the given cookbook
    pub async fn list_in_cookbook(
        db: &SqlitePool,
        cookbook_id: &str,
    ) -> Result<Vec<Recipe>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {} FROM recipes
            WHERE EXISTS (SELECT 1 FROM json_each(recipes.cookbooks) WHERE json_each.value = ?)
            ORDER BY created_at, rowid
            "#,
            RECIPE_COLUMNS
        );
        let rows: Vec<RecipeRow> = sqlx::query_as(&query)
            .bind(cookbook_id)
            .fetch_all(db)
            .await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    pub async fn list_all(db: &SqlitePool) -> Result<Vec<Recipe>, sqlx::Error> {
        let query = format!(
            "SELECT {} FROM recipes ORDER BY created_at, rowid",
            RECIPE_COLUMNS
        );
        let rows: Vec<RecipeRow> = sqlx::query_as(&query).fetch_all(db).await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    pub async fn find_by_slug(db: &SqlitePool, slug: &str) -> Result<Option<Recipe>, sqlx::Error> {
        let query = format!("SELECT {} FROM recipes WHERE slug = ?", RECIPE_COLUMNS);
        let row: Option<RecipeRow> = sqlx::query_as(&query)
            .bind(slug)
            .fetch_optional(db)
            .await?;

        Ok(row.map(Recipe::from))
    }

    /// All recipes, from any creator, whose tags contain `tag` exactly
    pub async fn find_by_tag(db: &SqlitePool, tag: &str) -> Result<Vec<Recipe>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {} FROM recipes
            WHERE EXISTS (SELECT 1 FROM json_each(recipes.tags) WHERE json_each.value = ?)
            ORDER BY created_at, rowid
            "#,
            RECIPE_COLUMNS
        );
        let rows: Vec<RecipeRow> = sqlx::query_as(&query).bind(tag).fetch_all(db).await?;

        Ok(rows.into_iter().map(Recipe::from).collect())
    }

    /// Append `cookbook_id` to the recipe's cookbooks unless already linked.
    ///
    /// The membership check and the append run as one statement, so two
    /// concurrent attaches cannot both append. Returns whether a link was added;
    /// an unknown recipe slug is a no-op.
    pub async fn attach_to_cookbook(
        db: &SqlitePool,
        recipe_slug: &str,
        cookbook_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE recipes
            SET cookbooks = json_insert(cookbooks, '$[#]', ?)
            WHERE slug = ?
              AND NOT EXISTS (
                  SELECT 1 FROM json_each(recipes.cookbooks) WHERE json_each.value = ?
              )
            "#,
        )
        .bind(cookbook_id)
        .bind(recipe_slug)
        .bind(cookbook_id)
        .execute(db)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_memory, Cookbook, NewCookbook, User};

    fn tea(creator: &User) -> NewRecipe {
        NewRecipe {
            creator_id: creator.id.clone(),
            creator_name: creator.username.clone(),
            name: "Tea".to_string(),
            tags: vec!["drink".to_string()],
            prep_time: "5 min".to_string(),
            serving_size: 2,
            ingredients: vec!["water".to_string(), "leaves".to_string()],
            supplies: vec!["None".to_string()],
            steps: vec!["boil".to_string(), "steep".to_string()],
            icon: None,
        }
    }

    async fn cookbook(db: &SqlitePool, creator: &User) -> Cookbook {
        Cookbook::create(
            db,
            &NewCookbook {
                creator_id: creator.id.clone(),
                creator_name: creator.username.clone(),
                title: "Drinks".to_string(),
                tags: vec![],
                icon: None,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_read_back_lists() {
        let db = init_memory().await.unwrap();
        let alice = User::create(&db, "alice", "hash").await.unwrap();

        let created = Recipe::create(&db, &tea(&alice)).await.unwrap();
        assert_eq!(created.slug, "alice-tea");

        let stored = Recipe::find_by_slug(&db, "alice-tea").await.unwrap().unwrap();
        assert_eq!(stored.ingredients, vec!["water", "leaves"]);
        assert_eq!(stored.steps, vec!["boil", "steep"]);
        assert_eq!(stored.serving_size, 2);
        assert!(stored.cookbooks.is_empty());
    }

    #[tokio::test]
    async fn test_serving_size_below_one_is_rejected_by_store() {
        let db = init_memory().await.unwrap();
        let alice = User::create(&db, "alice", "hash").await.unwrap();

        let mut recipe = tea(&alice);
        recipe.serving_size = 0;
        assert!(Recipe::create(&db, &recipe).await.is_err());
        assert!(Recipe::list_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attach_is_idempotent() {
        let db = init_memory().await.unwrap();
        let alice = User::create(&db, "alice", "hash").await.unwrap();
        let recipe = Recipe::create(&db, &tea(&alice)).await.unwrap();
        let book = cookbook(&db, &alice).await;

        assert!(Recipe::attach_to_cookbook(&db, &recipe.slug, &book.id)
            .await
            .unwrap());
        assert!(!Recipe::attach_to_cookbook(&db, &recipe.slug, &book.id)
            .await
            .unwrap());

        let stored = Recipe::find_by_slug(&db, &recipe.slug).await.unwrap().unwrap();
        assert_eq!(stored.cookbooks, vec![book.id.clone()]);

        let in_book = Recipe::list_in_cookbook(&db, &book.id).await.unwrap();
        assert_eq!(in_book.len(), 1);
    }

    #[tokio::test]
    async fn test_attach_unknown_recipe_is_noop() {
        let db = init_memory().await.unwrap();
        let alice = User::create(&db, "alice", "hash").await.unwrap();
        let book = cookbook(&db, &alice).await;

        assert!(!Recipe::attach_to_cookbook(&db, "nobody-nothing", &book.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_find_by_tag() {
        let db = init_memory().await.unwrap();
        let alice = User::create(&db, "alice", "hash").await.unwrap();
        Recipe::create(&db, &tea(&alice)).await.unwrap();

        assert_eq!(Recipe::find_by_tag(&db, "drink").await.unwrap().len(), 1);
        assert!(Recipe::find_by_tag(&db, "dessert").await.unwrap().is_empty());
    }
}
