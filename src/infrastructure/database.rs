use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::info;

pub async fn setup_database(database_url: &str) -> anyhow::Result<SqlitePool> {
    info!("📂 Database: {}", database_url);

    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(opts)
        .await?;

    info!("✅ Database connected successfully");

    run_migrations(&pool).await?;

    Ok(pool)
}

pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    info!("🔄 Running auto-migrations...");

    // Order matters for foreign keys: users before files before shares.
    let stmts = vec![
        (
            "users",
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            )",
        ),
        (
            "files",
            "CREATE TABLE IF NOT EXISTS files (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL REFERENCES users(id),
                original_filename TEXT NOT NULL,
                storage_key TEXT NOT NULL,
                mime_type TEXT NOT NULL,
                size_bytes INTEGER NOT NULL,
                is_public BOOLEAN NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL
            )",
        ),
        (
            "shares",
            "CREATE TABLE IF NOT EXISTS shares (
                file_id TEXT NOT NULL REFERENCES files(id) ON DELETE CASCADE,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                access_level TEXT NOT NULL,
                PRIMARY KEY (file_id, user_id)
            )",
        ),
        (
            "idx_files_owner_id",
            "CREATE INDEX IF NOT EXISTS idx_files_owner_id ON files(owner_id)",
        ),
        (
            "idx_files_created_at",
            "CREATE INDEX IF NOT EXISTS idx_files_created_at ON files(created_at)",
        ),
        (
            "idx_shares_user_id",
            "CREATE INDEX IF NOT EXISTS idx_shares_user_id ON shares(user_id)",
        ),
    ];

    for (name, stmt) in stmts {
        sqlx::query(stmt).execute(pool).await?;
        info!("   - '{}' checked/created", name);
    }

    Ok(())
}
