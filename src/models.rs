//! Core data models.
//!
//! These types represent the teaching materials that flow through the
//! ingestion pipeline and the question-answering flow.

/// A stored teaching material: one unit of course content for a proficiency
/// level and week, retrieved as the context for student questions.
#[derive(Debug, Clone)]
pub struct Material {
    pub id: String,
    pub level: String,
    pub week: String,
    pub content: String,
    /// Path of the ingested file, when the material came from disk rather
    /// than a seed document.
    pub source_path: Option<String>,
    pub content_hash: String,
    pub updated_at: i64,
}

/// Material content about to be written to the store. The store assigns the
/// id, hash, and timestamp.
#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub level: String,
    pub week: String,
    pub content: String,
    pub source_path: Option<String>,
}

/// One row of `madrasa materials` output.
#[derive(Debug, Clone)]
pub struct MaterialSummary {
    pub level: String,
    pub week: String,
    pub content_chars: i64,
    pub updated_at: i64,
}
