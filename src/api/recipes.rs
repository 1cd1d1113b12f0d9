use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::auth::SessionContext;
use super::error::PageError;
use super::upload::{read_upload_form, FormFields, RECIPE_ICON_FIELD};
use super::validation::{RecipeInput, RECIPE_SAVE_ERROR};
use crate::db::{NewRecipe, Recipe};
use crate::ui::{render_template, MyRecipesTemplate, RecipeFormTemplate, RecipeView};
use crate::AppState;

fn recipe_form(error: Option<&str>) -> Response {
    render_template(RecipeFormTemplate {
        error: error.map(str::to_string),
    })
}

/// Recipe fields, accepting both the lowercase and camelCase spellings
fn recipe_input(fields: &FormFields) -> RecipeInput {
    RecipeInput {
        name: fields.text("name"),
        tags: fields.text("tags"),
        prep_time: fields.text_any(&["preptime", "prepTime"]),
        serving_size: fields.text_any(&["servingsize", "servingSize"]),
        ingredients: fields.text("ingredients"),
        supplies: fields.text("supplies"),
        steps: fields.text("steps"),
    }
}

/// GET /recipe/create
pub async fn new_recipe_form() -> Response {
    recipe_form(None)
}

/// POST /recipe/create
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    multipart: Multipart,
) -> Response {
    let form = match read_upload_form(&state.blobs, multipart, RECIPE_ICON_FIELD).await {
        Ok(form) => form,
        Err(e) => {
            warn!("Failed to read recipe form: {}", e);
            return recipe_form(Some(RECIPE_SAVE_ERROR));
        }
    };

    let recipe = match recipe_input(&form.fields).validate() {
        Ok(recipe) => recipe,
        Err(rejection) => {
            form.discard(&state.blobs).await;
            return recipe_form(Some(rejection.message()));
        }
    };

    let new = NewRecipe {
        creator_id: session.user.id.clone(),
        creator_name: session.user.username.clone(),
        name: recipe.name,
        tags: recipe.tags,
        prep_time: recipe.prep_time,
        serving_size: recipe.serving_size,
        ingredients: recipe.ingredients,
        supplies: recipe.supplies,
        steps: recipe.steps,
        icon: form.file.clone(),
    };

    match Recipe::create(&state.db, &new).await {
        Ok(recipe) => {
            info!(slug = %recipe.slug, username = %session.user.username, "Created recipe");
            Redirect::to("/myrecipes").into_response()
        }
        Err(e) => {
            error!("Failed to create recipe: {}", e);
            form.discard(&state.blobs).await;
            recipe_form(Some(RECIPE_SAVE_ERROR))
        }
    }
}

/// GET /myrecipes
pub async fn my_recipes(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> Result<Response, PageError> {
    let recipes = Recipe::list_by_creator(&state.db, &session.user.id).await?;

    Ok(render_template(MyRecipesTemplate {
        recipes: recipes.iter().map(RecipeView::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipe_input_accepts_both_spellings() {
        let fields = FormFields::from_pairs(vec![
            ("name".to_string(), "Tea".to_string()),
            ("prepTime".to_string(), "5 min".to_string()),
            ("servingsize".to_string(), "2".to_string()),
        ]);

        let input = recipe_input(&fields);
        assert_eq!(input.name.as_deref(), Some("Tea"));
        assert_eq!(input.prep_time.as_deref(), Some("5 min"));
        assert_eq!(input.serving_size.as_deref(), Some("2"));
        assert_eq!(input.steps, None);
    }
}
