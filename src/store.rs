//! Materials store.
//!
//! Retrieval sits behind the [`MaterialStore`] trait so the storage backend
//! can be swapped without touching the question pipeline; [`SqliteStore`] is
//! the backend that ships. Lookup is by `(level, week)` — the key a student
//! request carries.

use anyhow::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::models::{Material, MaterialSummary, NewMaterial};

#[async_trait]
pub trait MaterialStore: Send + Sync {
    /// Fetch the material for a proficiency level and week, if present.
    async fn fetch(&self, level: &str, week: &str) -> Result<Option<Material>>;

    /// Insert or update the material for `(level, week)`. Returns the
    /// material id (stable across updates of the same level+week).
    async fn upsert(&self, material: NewMaterial) -> Result<String>;

    /// Summaries of every stored material, ordered by level then week.
    async fn list(&self) -> Result<Vec<MaterialSummary>>;
}

/// SQLite-backed store over a connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect using the configured database path.
    pub async fn open(config: &Config) -> Result<Self> {
        Ok(Self::new(db::connect(config).await?))
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl MaterialStore for SqliteStore {
    async fn fetch(&self, level: &str, week: &str) -> Result<Option<Material>> {
        let row = sqlx::query(
            "SELECT id, level, week, content, source_path, content_hash, updated_at \
             FROM materials WHERE level = ? AND week = ?",
        )
        .bind(level)
        .bind(week)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Material {
            id: row.get("id"),
            level: row.get("level"),
            week: row.get("week"),
            content: row.get("content"),
            source_path: row.get("source_path"),
            content_hash: row.get("content_hash"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn upsert(&self, material: NewMaterial) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(material.content.as_bytes());
        let content_hash = format!("{:x}", hasher.finalize());

        // Keep the existing id when the level+week is already stored
        let existing_id: Option<String> =
            sqlx::query_scalar("SELECT id FROM materials WHERE level = ? AND week = ?")
                .bind(&material.level)
                .bind(&material.week)
                .fetch_optional(&self.pool)
                .await?;

        let id = existing_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let now = chrono::Utc::now().timestamp();

        sqlx::query(
            r#"
            INSERT INTO materials (id, level, week, content, source_path, content_hash, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(level, week) DO UPDATE SET
                content = excluded.content,
                source_path = excluded.source_path,
                content_hash = excluded.content_hash,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(&material.level)
        .bind(&material.week)
        .bind(&material.content)
        .bind(&material.source_path)
        .bind(&content_hash)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list(&self) -> Result<Vec<MaterialSummary>> {
        let rows = sqlx::query(
            "SELECT level, week, LENGTH(content) AS content_chars, updated_at \
             FROM materials ORDER BY level ASC, week ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| MaterialSummary {
                level: row.get("level"),
                week: row.get("week"),
                content_chars: row.get("content_chars"),
                updated_at: row.get("updated_at"),
            })
            .collect())
    }
}
