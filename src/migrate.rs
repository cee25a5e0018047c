use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create materials table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS materials (
            id TEXT PRIMARY KEY,
            level TEXT NOT NULL,
            week TEXT NOT NULL,
            content TEXT NOT NULL,
            source_path TEXT,
            content_hash TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(level, week)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create indexes
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_materials_level ON materials(level)")
        .execute(&pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_materials_updated_at ON materials(updated_at DESC)")
        .execute(&pool)
        .await?;

    pool.close().await;
    Ok(())
}
