//! URL slugs for cookbooks and recipes.
//!
//! A slug is derived from the creator's username and the document title,
//! then made unique per collection by appending `-2`, `-3`, ...

use lazy_static::lazy_static;
use regex::Regex;
use sqlx::SqlitePool;
use std::future::Future;
use tracing::debug;

use super::StoreError;

/// Attempts at claiming a slug before a concurrent insert wins for good
const SLUG_ATTEMPTS: usize = 3;

lazy_static! {
    /// Runs of characters that are not allowed in a slug
    static ref NON_SLUG_CHARS: Regex = Regex::new(r"[^a-z0-9_-]+").unwrap();

    /// Repeated separators left behind after replacement
    static ref REPEATED_DASHES: Regex = Regex::new(r"-{2,}").unwrap();
}

/// Collections that carry a unique `slug` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugTable {
    Cookbooks,
    Recipes,
}

impl SlugTable {
    fn as_str(&self) -> &'static str {
        match self {
            SlugTable::Cookbooks => "cookbooks",
            SlugTable::Recipes => "recipes",
        }
    }

    /// Base slug used when the creator and title leave nothing URL-safe
    fn fallback(&self) -> &'static str {
        match self {
            SlugTable::Cookbooks => "cookbook",
            SlugTable::Recipes => "recipe",
        }
    }
}

/// Build the base slug for a document created by `creator_name` with `title`.
pub fn slugify(creator_name: &str, title: &str) -> String {
    let source = format!("{} {}", creator_name, title).to_lowercase();
    let replaced = NON_SLUG_CHARS.replace_all(&source, "-");
    let collapsed = REPEATED_DASHES.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

/// Pick the first free slug for `base` in `table`.
///
/// Returns `base` itself when unused, otherwise `base-N` where N is one past
/// the highest numeric suffix already taken. An empty base is replaced by the
/// collection's kind name.
pub async fn unique_slug(
    db: &SqlitePool,
    table: SlugTable,
    base: &str,
) -> Result<String, sqlx::Error> {
    let base = if base.is_empty() { table.fallback() } else { base };
    let query = format!(
        "SELECT slug FROM {} WHERE slug = ? OR slug LIKE ?",
        table.as_str()
    );
    let taken: Vec<String> = sqlx::query_scalar(&query)
        .bind(base)
        .bind(format!("{}-%", base))
        .fetch_all(db)
        .await?;

    Ok(next_free_slug(base, &taken))
}

/// Run `insert` with a free slug, picking a fresh one when a concurrent
/// insert claimed it between the lookup and the write.
pub async fn insert_with_unique_slug<T, F, Fut>(
    db: &SqlitePool,
    table: SlugTable,
    base: &str,
    mut insert: F,
) -> Result<T, StoreError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 1;
    loop {
        let slug = unique_slug(db, table, base).await?;
        match insert(slug.clone()).await {
            Err(e) if e.is_unique_violation() && attempt < SLUG_ATTEMPTS => {
                debug!(slug = %slug, attempt, "Slug claimed concurrently, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

fn next_free_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_string();
    }

    let prefix = format!("{}-", base);
    let highest = taken
        .iter()
        .filter_map(|s| s.strip_prefix(&prefix))
        .filter_map(|suffix| suffix.parse::<u64>().ok())
        .max()
        .unwrap_or(1);

    format!("{}-{}", base, highest + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_joins_creator_and_title() {
        assert_eq!(slugify("alice", "Summer Desserts"), "alice-summer-desserts");
        assert_eq!(slugify("Bob", "Tea"), "bob-tea");
    }

    #[test]
    fn test_slugify_collapses_punctuation() {
        assert_eq!(slugify("alice", "  Mom's  Best!! Pies "), "alice-mom-s-best-pies");
        assert_eq!(slugify("alice", "--weird--"), "alice-weird");
        assert_eq!(slugify("carol_1", "Soup"), "carol_1-soup");
    }

    #[test]
    fn test_slugify_drops_non_ascii() {
        assert_eq!(slugify("alice", "Crème brûlée"), "alice-cr-me-br-l-e");
    }

    #[test]
    fn test_slugify_without_ascii_is_empty() {
        assert_eq!(slugify("李", "菜谱"), "");
    }

    #[tokio::test]
    async fn test_unique_slug_falls_back_to_kind_name() {
        let db = crate::db::init_memory().await.unwrap();

        assert_eq!(
            unique_slug(&db, SlugTable::Cookbooks, "").await.unwrap(),
            "cookbook"
        );
        assert_eq!(
            unique_slug(&db, SlugTable::Recipes, "").await.unwrap(),
            "recipe"
        );
    }

    #[test]
    fn test_next_free_slug() {
        assert_eq!(next_free_slug("alice-tea", &[]), "alice-tea");
        assert_eq!(
            next_free_slug("alice-tea", &["alice-tea".to_string()]),
            "alice-tea-2"
        );
        assert_eq!(
            next_free_slug(
                "alice-tea",
                &[
                    "alice-tea".to_string(),
                    "alice-tea-2".to_string(),
                    "alice-tea-7".to_string(),
                    "alice-tea-party".to_string(),
                ]
            ),
            "alice-tea-8"
        );
        // Only suffixed variants exist, the bare slug is still free
        assert_eq!(
            next_free_slug("alice-tea", &["alice-tea-2".to_string()]),
            "alice-tea"
        );
    }
}
