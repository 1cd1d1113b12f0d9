pub mod api;
pub mod config;
pub mod db;
pub mod ui;

pub use db::DbPool;

use config::Config;

use crate::db::BlobStore;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
    pub blobs: BlobStore,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        let blobs = BlobStore::new(db.clone());
        Self { config, db, blobs }
    }
}
