pub mod auth;
mod cookbooks;
pub mod error;
mod gallery;
mod images;
mod recipes;
pub mod sanitize;
mod search;
pub mod upload;
pub mod validation;


use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub use search::search_by_tag;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Landing and auth routes (public)
    let public_routes = Router::new()
        .route("/", get(auth::index))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/registerFailed", get(auth::register_failed))
        .route("/loginFailed", get(auth::login_failed));

    // Everything else requires a logged-in user
    let protected_routes = Router::new()
        .route("/home", get(cookbooks::home))
        // Cookbooks
        .route(
            "/cookbook/create",
            get(cookbooks::new_cookbook_form).post(cookbooks::create_cookbook),
        )
        .route(
            "/cookbook/:slug",
            get(cookbooks::cookbook_detail).post(cookbooks::attach_recipe),
        )
        // Recipes
        .route(
            "/recipe/create",
            get(recipes::new_recipe_form).post(recipes::create_recipe),
        )
        .route("/myrecipes", get(recipes::my_recipes))
        // Gallery and images
        .route(
            "/mygallery",
            get(gallery::my_gallery).post(gallery::upload_image),
        )
        .route("/image/:id", get(images::get_image))
        .route("/search", get(search::search))
        .route("/logout", get(auth::logout))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
