// Askama template definitions

use askama::Template;

use crate::db::{BlobRef, Cookbook, Image, Recipe};

/// Custom filters for Askama templates
mod filters {
    pub fn joined(items: &[String]) -> ::askama::Result<String> {
        Ok(items.join(", "))
    }
}

// Cookbook card as shown on lists (icon flattened to a URL for templates)
pub struct CookbookView {
    pub title: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub icon_url: Option<String>,
}

impl From<&Cookbook> for CookbookView {
    fn from(cookbook: &Cookbook) -> Self {
        Self {
            title: cookbook.title.clone(),
            slug: cookbook.slug.clone(),
            tags: cookbook.tags.clone(),
            icon_url: cookbook.icon.as_ref().map(BlobRef::url),
        }
    }
}

pub struct RecipeView {
    pub name: String,
    pub slug: String,
    pub tags: Vec<String>,
    pub prep_time: String,
    pub serving_size: i64,
    pub ingredients: Vec<String>,
    pub supplies: Vec<String>,
    pub steps: Vec<String>,
    pub icon_url: Option<String>,
}

impl From<&Recipe> for RecipeView {
    fn from(recipe: &Recipe) -> Self {
        Self {
            name: recipe.name.clone(),
            slug: recipe.slug.clone(),
            tags: recipe.tags.clone(),
            prep_time: recipe.prep_time.clone(),
            serving_size: recipe.serving_size,
            ingredients: recipe.ingredients.clone(),
            supplies: recipe.supplies.clone(),
            steps: recipe.steps.clone(),
            icon_url: recipe.icon.as_ref().map(BlobRef::url),
        }
    }
}

pub struct ImageView {
    pub caption: String,
    pub url: String,
}

impl From<&Image> for ImageView {
    fn from(image: &Image) -> Self {
        Self {
            caption: image.caption.clone(),
            url: image.icon.url(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Cookbook,
    Recipe,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Cookbook => "cookbook",
            ItemKind::Recipe => "recipe",
        }
    }

    /// Detail page of the item. Recipes have none outside their owner's list.
    pub fn link(&self, slug: &str) -> Option<String> {
        match self {
            ItemKind::Cookbook => Some(format!("/cookbook/{}", slug)),
            ItemKind::Recipe => None,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One search hit, tagged with the kind of document it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SearchItem {
    pub kind: ItemKind,
    pub title: String,
    pub tags: Vec<String>,
    pub icon_url: Option<String>,
    pub slug: String,
}

impl From<&Cookbook> for SearchItem {
    fn from(cookbook: &Cookbook) -> Self {
        Self {
            kind: ItemKind::Cookbook,
            title: cookbook.title.clone(),
            tags: cookbook.tags.clone(),
            icon_url: cookbook.icon.as_ref().map(BlobRef::url),
            slug: cookbook.slug.clone(),
        }
    }
}

impl From<&Recipe> for SearchItem {
    fn from(recipe: &Recipe) -> Self {
        Self {
            kind: ItemKind::Recipe,
            title: recipe.name.clone(),
            tags: recipe.tags.clone(),
            icon_url: recipe.icon.as_ref().map(BlobRef::url),
            slug: recipe.slug.clone(),
        }
    }
}

impl SearchItem {
    pub fn link(&self) -> Option<String> {
        self.kind.link(&self.slug)
    }
}

// Landing page (login / register)
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub username: String,
    pub cookbooks: Vec<CookbookView>,
}

#[derive(Template)]
#[template(path = "cookbook.html")]
pub struct CookbookFormTemplate {
    pub error: Option<String>,
}

// Cookbook detail: its recipes plus every recipe available to attach
#[derive(Template)]
#[template(path = "cookbook_detail.html")]
pub struct CookbookDetailTemplate {
    pub cookbook: CookbookView,
    pub recipes: Vec<RecipeView>,
    pub all_recipes: Vec<RecipeView>,
}

#[derive(Template)]
#[template(path = "recipe.html")]
pub struct RecipeFormTemplate {
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "myrecipes.html")]
pub struct MyRecipesTemplate {
    pub recipes: Vec<RecipeView>,
}

#[derive(Template)]
#[template(path = "mygallery.html")]
pub struct GalleryTemplate {
    pub images: Vec<ImageView>,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "search.html")]
pub struct SearchTemplate {
    pub query: String,
    pub items: Vec<SearchItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pies() -> Cookbook {
        Cookbook {
            id: "cb-1".to_string(),
            creator_id: "u-1".to_string(),
            title: "Pies".to_string(),
            tags: vec!["dessert".to_string()],
            icon: Some(BlobRef {
                id: "blob-1".to_string(),
                filename: "pie.png".to_string(),
                bucket: "images".to_string(),
            }),
            slug: "alice-pies".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_search_item_from_cookbook() {
        let item = SearchItem::from(&pies());
        assert_eq!(item.kind, ItemKind::Cookbook);
        assert_eq!(item.title, "Pies");
        assert_eq!(item.icon_url.as_deref(), Some("/image/blob-1"));
        assert_eq!(item.link().as_deref(), Some("/cookbook/alice-pies"));
    }

    #[test]
    fn test_search_item_from_recipe_has_no_link() {
        let recipe = Recipe {
            id: "r-1".to_string(),
            creator_id: "u-2".to_string(),
            name: "Tea".to_string(),
            tags: vec!["drink".to_string()],
            ingredients: vec!["water".to_string()],
            prep_time: "5 min".to_string(),
            serving_size: 2,
            supplies: vec![],
            steps: vec!["boil".to_string()],
            icon: None,
            cookbooks: vec![],
            slug: "bob-tea".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        };
        let item = SearchItem::from(&recipe);
        assert_eq!(item.kind, ItemKind::Recipe);
        assert_eq!(item.icon_url, None);
        assert_eq!(item.link(), None);
    }

    #[test]
    fn test_item_kind_display() {
        assert_eq!(ItemKind::Cookbook.to_string(), "cookbook");
        assert_eq!(ItemKind::Recipe.to_string(), "recipe");
    }

    #[test]
    fn test_index_renders_error_message() {
        let html = IndexTemplate {
            error: Some("Failed login :( !".to_string()),
        }
        .render()
        .unwrap();
        assert!(html.contains("Failed login :( !"));
    }

    #[test]
    fn test_search_renders_kinds() {
        let html = SearchTemplate {
            query: "dessert".to_string(),
            items: vec![SearchItem::from(&pies())],
        }
        .render()
        .unwrap();
        assert!(html.contains("cookbook"));
        assert!(html.contains("/cookbook/alice-pies"));
    }

    #[test]
    fn test_filters_joined() {
        let items = vec!["water".to_string(), "leaves".to_string()];
        assert_eq!(filters::joined(&items).unwrap(), "water, leaves");
    }
}
