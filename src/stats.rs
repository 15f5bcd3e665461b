//! Database and directory statistics.
//!
//! Gives a quick summary of what has been fetched, transformed and loaded.
//! Used by `cfx stats`.

use anyhow::Result;
use sqlx::Row;
use std::path::Path;

use crate::batch::list_source_files;
use crate::config::Config;
use crate::db;
use crate::progress::format_number;

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let row = sqlx::query(
        "SELECT COUNT(*) AS docs, COALESCE(SUM(fact_count), 0) AS facts, MAX(loaded_at) AS last_load \
         FROM company_facts",
    )
    .fetch_one(&pool)
    .await?;
    let total_docs: i64 = row.get("docs");
    let total_facts: i64 = row.get("facts");
    let last_load: Option<i64> = row.get("last_load");

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Company Facts — Stats");
    println!("=====================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Documents:   {}", format_number(total_docs as u64));
    println!("  Facts:       {}", format_number(total_facts as u64));
    println!(
        "  Last load:   {}",
        last_load
            .map(format_ts_iso)
            .unwrap_or_else(|| "never".to_string())
    );
    println!();
    println!(
        "  Raw files:         {}",
        count_json(&config.paths.company_facts)
    );
    println!(
        "  Transformed files: {}",
        count_json(&config.paths.modified_facts)
    );

    let top_rows = sqlx::query(
        "SELECT cik, entity_name, concept_count, fact_count FROM company_facts \
         ORDER BY concept_count DESC, cik ASC LIMIT 5",
    )
    .fetch_all(&pool)
    .await?;

    if !top_rows.is_empty() {
        println!();
        println!("  Most concepts:");
        println!(
            "  {:<12} {:<36} {:>8} {:>8}",
            "CIK", "ENTITY", "CONCEPTS", "FACTS"
        );
        println!("  {}", "-".repeat(68));
        for row in &top_rows {
            let name: String = row.get("entity_name");
            println!(
                "  {:<12} {:<36} {:>8} {:>8}",
                row.get::<String, _>("cik"),
                truncate(&name, 36),
                row.get::<i64, _>("concept_count"),
                row.get::<i64, _>("fact_count")
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

fn count_json(dir: &Path) -> String {
    match list_source_files(dir, None) {
        Ok(files) => format_number(files.len() as u64),
        Err(_) => "-".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{}…", cut)
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Apple Inc.", 36), "Apple Inc.");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
