//! Material inspection commands.
//!
//! `madrasa get <level> <week>` prints one stored material in full;
//! `madrasa materials` lists everything in the store.

use anyhow::Result;

use crate::config::Config;
use crate::store::{MaterialStore, SqliteStore};

/// CLI entry point for `madrasa get`.
pub async fn run_get(config: &Config, level: &str, week: &str) -> Result<()> {
    let store = SqliteStore::open(config).await?;

    let material = match store.fetch(level, week).await? {
        Some(m) => m,
        None => {
            eprintln!("Error: no material found for level '{}', week '{}'", level, week);
            std::process::exit(1);
        }
    };

    println!("--- Material ---");
    println!("id:           {}", material.id);
    println!("level:        {}", material.level);
    println!("week:         {}", material.week);
    if let Some(ref path) = material.source_path {
        println!("source_path:  {}", path);
    }
    println!("content_hash: {}", material.content_hash);
    println!("updated_at:   {}", format_ts_iso(material.updated_at));
    println!();

    println!("--- Content ---");
    println!("{}", material.content);

    store.close().await;
    Ok(())
}

/// CLI entry point for `madrasa materials`.
pub async fn run_list(config: &Config) -> Result<()> {
    let store = SqliteStore::open(config).await?;

    let summaries = store.list().await?;
    if summaries.is_empty() {
        println!("No materials stored.");
        store.close().await;
        return Ok(());
    }

    println!("{:<20} {:<10} {:>8}  updated", "level", "week", "chars");
    for summary in &summaries {
        println!(
            "{:<20} {:<10} {:>8}  {}",
            summary.level,
            summary.week,
            summary.content_chars,
            format_ts_iso(summary.updated_at)
        );
    }

    store.close().await;
    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
