//! Document models for the cookbook store, one module per collection.

pub mod common;
pub mod cookbook;
pub mod image;
pub mod recipe;
pub mod user;

pub use common::*;
pub use cookbook::*;
pub use image::*;
pub use recipe::*;
pub use user::*;
