//! Materials ingestion.
//!
//! Two paths into the store: `madrasa ingest` scans the materials directory
//! for PDF/DOCX files named `<level>_week<NN>.<ext>` and extracts their
//! text; `madrasa seed <dir>` loads pre-extracted materials from JSON
//! documents. Both upsert by `(level, week)`, so re-running is idempotent.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::extract;
use crate::models::NewMaterial;
use crate::store::{MaterialStore, SqliteStore};

/// A material file found by the scan, with its parsed placement.
#[derive(Debug)]
struct MaterialFile {
    path: PathBuf,
    level: String,
    week: String,
    content_type: &'static str,
}

pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    let (files, skipped_names) = scan_materials(config)?;

    if dry_run {
        println!("ingest (dry-run)");
        println!("  files found: {}", files.len());
        println!("  skipped (unrecognized name): {}", skipped_names);
        return Ok(());
    }

    let store = SqliteStore::open(config).await?;

    let mut upserted = 0u64;
    let mut failed = 0u64;

    for file in &files {
        let bytes = std::fs::read(&file.path)
            .with_context(|| format!("Failed to read {}", file.path.display()))?;

        let content = match extract::extract_text(&bytes, file.content_type) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("  skipping {}: {}", file.path.display(), e);
                failed += 1;
                continue;
            }
        };

        store
            .upsert(NewMaterial {
                level: file.level.clone(),
                week: file.week.clone(),
                content,
                source_path: Some(file.path.display().to_string()),
            })
            .await?;
        upserted += 1;
    }

    println!("ingest {}", config.materials.root.display());
    println!("  files found: {}", files.len());
    println!("  upserted materials: {}", upserted);
    println!("  extraction failures: {}", failed);
    println!("  skipped (unrecognized name): {}", skipped_names);
    println!("ok");

    store.close().await;
    Ok(())
}

/// Walk the materials root and collect files matching the include globs
/// whose names parse as `<level>_week<NN>`. Returns the files plus a count
/// of matched files whose names did not parse.
fn scan_materials(config: &Config) -> Result<(Vec<MaterialFile>, u64)> {
    let root = &config.materials.root;
    if !root.exists() {
        bail!("Materials root does not exist: {}", root.display());
    }

    let include_set = build_globset(&config.materials.include_globs)?;
    let exclude_set = build_globset(&config.materials.exclude_globs)?;

    let mut files = Vec::new();
    let mut skipped_names = 0u64;

    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        let Some(content_type) = extract::content_type_for_path(path) else {
            continue;
        };

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        match parse_material_name(&stem) {
            Some((level, week)) => files.push(MaterialFile {
                path: path.to_path_buf(),
                level,
                week,
                content_type,
            }),
            None => {
                eprintln!("  unrecognized material name: {}", rel_str);
                skipped_names += 1;
            }
        }
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok((files, skipped_names))
}

/// Parse a file stem of the form `<level>_week<NN>` into `(level, "week<NN>")`.
/// The level may itself contain underscores; the week segment is the part
/// after the last one.
fn parse_material_name(stem: &str) -> Option<(String, String)> {
    let (level, week) = stem.rsplit_once('_')?;
    let digits = week.strip_prefix("week")?;
    if level.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some((level.to_string(), week.to_string()))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Shape of a seed document: one JSON object per file.
#[derive(Debug, Deserialize)]
struct SeedMaterial {
    level: String,
    week: String,
    content: String,
}

pub async fn run_seed(config: &Config, dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!("Seed directory does not exist: {}", dir.display());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let store = SqliteStore::open(config).await?;

    let mut upserted = 0u64;
    let mut failed = 0u64;

    for path in &paths {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let seed: SeedMaterial = match serde_json::from_str(&content) {
            Ok(seed) => seed,
            Err(e) => {
                eprintln!("  skipping {}: {}", path.display(), e);
                failed += 1;
                continue;
            }
        };

        store
            .upsert(NewMaterial {
                level: seed.level,
                week: seed.week,
                content: seed.content,
                source_path: Some(path.display().to_string()),
            })
            .await?;
        upserted += 1;
    }

    println!("seed {}", dir.display());
    println!("  files found: {}", paths.len());
    println!("  upserted materials: {}", upserted);
    println!("  invalid documents: {}", failed);
    println!("ok");

    store.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_material_name() {
        assert_eq!(
            parse_material_name("beginner_week03"),
            Some(("beginner".to_string(), "week03".to_string()))
        );
        assert_eq!(
            parse_material_name("upper_intermediate_week10"),
            Some(("upper_intermediate".to_string(), "week10".to_string()))
        );
    }

    #[test]
    fn test_parse_material_name_rejects_malformed() {
        assert_eq!(parse_material_name("beginner"), None);
        assert_eq!(parse_material_name("beginner_week"), None);
        assert_eq!(parse_material_name("beginner_weekone"), None);
        assert_eq!(parse_material_name("_week01"), None);
        assert_eq!(parse_material_name("beginner_lesson01"), None);
    }
}
