pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod storage;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

use sea_orm::DatabaseConnection;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use storage::FileStore;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
    pub storage: FileStore,
}
