use sea_orm::{DatabaseConnection, DbBackend, MockDatabase};
use uuid::Uuid;

use crate::config::Config;
use crate::entities::user::UserRole;
use crate::storage::FileStore;
use crate::utils::jwt::Claims;
use crate::AppState;

/// State over `db` with uploads going to a fresh temp dir.
pub fn state_with(db: DatabaseConnection) -> AppState {
    state_with_env(db, &[])
}

/// Like `state_with`, with extra environment values.
pub fn state_with_env(db: DatabaseConnection, env: &[(&str, &str)]) -> AppState {
    let upload_dir = std::env::temp_dir().join(format!("marketplace-test-{}", Uuid::new_v4()));
    let config = Config::from_lookup(|key| match key {
        "UPLOAD_DIR" => Some(upload_dir.to_string_lossy().into_owned()),
        _ => env
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string()),
    })
    .unwrap();
    let storage = FileStore::new(&config.upload_dir, &config.public_base_url);

    AppState {
        db,
        config,
        storage,
    }
}

/// State over an empty Postgres mock.
pub fn mock_state() -> AppState {
    state_with(MockDatabase::new(DbBackend::Postgres).into_connection())
}

pub fn claims(sub: Uuid, role: UserRole) -> Claims {
    Claims {
        sub,
        email: "someone@example.com".to_string(),
        role,
        exp: i64::MAX,
        iat: 0,
    }
}

/// Every statement the mock saw, rendered with its parameters inlined.
pub fn statements(state: AppState) -> Vec<String> {
    state
        .db
        .into_transaction_log()
        .iter()
        .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.to_string()))
        .collect()
}

/// Whether any logged statement contains `needle`.
pub fn ran(log: &[String], needle: &str) -> bool {
    log.iter().any(|stmt| stmt.contains(needle))
}
