use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::auth::SessionContext;
use super::error::PageError;
use super::upload::{read_upload_form, FormFields, COOKBOOK_ICON_FIELD};
use super::validation::{required_text, split_list, COOKBOOK_SAVE_ERROR};
use crate::db::{Cookbook, NewCookbook, Recipe};
use crate::ui::{
    render_template, CookbookDetailTemplate, CookbookFormTemplate, CookbookView, HomeTemplate,
    RecipeView,
};
use crate::AppState;

/// GET /home - the caller's cookbooks
pub async fn home(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Result<Response, PageError> {
    let cookbooks = Cookbook::list_by_creator(&state.db, &session.user.id).await?;

    Ok(render_template(HomeTemplate {
        username: session.user.username,
        cookbooks: cookbooks.iter().map(CookbookView::from).collect(),
    }))
}

/// GET /cookbook/create
pub async fn new_cookbook_form() -> Response {
    render_template(CookbookFormTemplate { error: None })
}

fn cookbook_form_error() -> Response {
    render_template(CookbookFormTemplate {
        error: Some(COOKBOOK_SAVE_ERROR.to_string()),
    })
}

/// POST /cookbook/create
pub async fn create_cookbook(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    multipart: Multipart,
) -> Response {
    let form = match read_upload_form(&state.blobs, multipart, COOKBOOK_ICON_FIELD).await {
        Ok(form) => form,
        Err(e) => {
            warn!("Failed to read cookbook form: {}", e);
            return cookbook_form_error();
        }
    };

    let title = match required_text(form.fields.text("title").as_deref()) {
        Some(title) => title,
        None => {
            form.discard(&state.blobs).await;
            return cookbook_form_error();
        }
    };

    let new = NewCookbook {
        creator_id: session.user.id.clone(),
        creator_name: session.user.username.clone(),
        title,
        tags: split_list(form.fields.text("tags").as_deref()),
        icon: form.file.clone(),
    };

    match Cookbook::create(&state.db, &new).await {
        Ok(cookbook) => {
            info!(slug = %cookbook.slug, username = %session.user.username, "Created cookbook");
            Redirect::to("/home").into_response()
        }
        Err(e) => {
            error!("Failed to create cookbook: {}", e);
            form.discard(&state.blobs).await;
            cookbook_form_error()
        }
    }
}

/// GET /cookbook/:slug - the cookbook, its recipes and every recipe that
/// could be attached to it
pub async fn cookbook_detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    _session: SessionContext,
) -> Result<Response, PageError> {
    let cookbook = Cookbook::find_by_slug(&state.db, &slug)
        .await?
        .ok_or(PageError::NotFound)?;

    let recipes = Recipe::list_in_cookbook(&state.db, &cookbook.id).await?;
    let all_recipes = Recipe::list_all(&state.db).await?;

    Ok(render_template(CookbookDetailTemplate {
        cookbook: CookbookView::from(&cookbook),
        recipes: recipes.iter().map(RecipeView::from).collect(),
        all_recipes: all_recipes.iter().map(RecipeView::from).collect(),
    }))
}

/// POST /cookbook/:slug - attach an existing recipe
pub async fn attach_recipe(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    _session: SessionContext,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Result<Response, PageError> {
    let fields = FormFields::from_pairs(pairs);
    let back = Redirect::to(&format!("/cookbook/{}", slug));

    let cookbook = Cookbook::find_by_slug(&state.db, &slug)
        .await?
        .ok_or(PageError::NotFound)?;

    let recipe_slug = match fields.text("recipeSlug").filter(|s| !s.is_empty()) {
        Some(recipe_slug) => recipe_slug,
        None => return Ok(back.into_response()),
    };

    match Recipe::attach_to_cookbook(&state.db, &recipe_slug, &cookbook.id).await {
        Ok(true) => info!(cookbook = %slug, recipe = %recipe_slug, "Attached recipe"),
        Ok(false) => info!(cookbook = %slug, recipe = %recipe_slug, "Recipe already attached or unknown"),
        Err(e) => error!("Failed to attach recipe: {}", e),
    }

    Ok(back.into_response())
}
