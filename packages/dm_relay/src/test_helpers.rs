use crate::AppState;
use crate::config::ServerConfig;
use crate::repository::ChatRepository;

/// Build a fully-wired `AppState` backed by an in-memory SQLite database.
/// Suitable for handler tests that exercise real SQL queries without I/O.
pub async fn test_app_state() -> AppState {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");

    crate::db::run_migrations(&pool).await.expect("migrations");

    AppState::new(ServerConfig::default(), ChatRepository::new(pool))
}
