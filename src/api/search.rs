use axum::{
    extract::{Query, State},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::auth::SessionContext;
use super::error::PageError;
use super::sanitize::sanitize_text;
use crate::db::{Cookbook, DbPool, Recipe};
use crate::ui::{render_template, SearchItem, SearchTemplate};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Cookbooks then recipes, from every creator, tagged exactly with `tag`
pub async fn search_by_tag(db: &DbPool, tag: &str) -> Result<Vec<SearchItem>, sqlx::Error> {
    let cookbooks = Cookbook::find_by_tag(db, tag).await?;
    let recipes = Recipe::find_by_tag(db, tag).await?;

    Ok(cookbooks
        .iter()
        .map(SearchItem::from)
        .chain(recipes.iter().map(SearchItem::from))
        .collect())
}

/// GET /search?search=<tag>
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
    _session: SessionContext,
) -> Result<Response, PageError> {
    let tag = query
        .search
        .as_deref()
        .map(|s| sanitize_text(s).trim().to_string())
        .unwrap_or_default();

    let items = if tag.is_empty() {
        Vec::new()
    } else {
        search_by_tag(&state.db, &tag).await?
    };

    Ok(render_template(SearchTemplate { query: tag, items }))
}
