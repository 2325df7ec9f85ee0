//! Database statistics.
//!
//! Summarizes what has been ingested and how the schema history looks:
//! raw record counts per source, number of schema versions, and the
//! latest version. Used by `shx stats`.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

/// Per-source breakdown of raw records.
struct SourceStats {
    source: String,
    record_count: i64,
    last_ingested_ms: Option<i64>,
}

/// Run the stats command: query the database and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM raw_records")
        .fetch_one(&pool)
        .await?;

    let version_row = sqlx::query(
        "SELECT COUNT(*) AS versions, MAX(version) AS latest, MAX(created_at) AS latest_at FROM schema_versions",
    )
    .fetch_one(&pool)
    .await?;
    let versions: i64 = version_row.get("versions");
    let latest: Option<i64> = version_row.get("latest");
    let latest_at: Option<i64> = version_row.get("latest_at");

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Schema Harness — Database Stats");
    println!("===============================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Records:     {}", total_records);
    println!("  Versions:    {}", versions);
    match (latest, latest_at) {
        (Some(v), Some(at)) => println!(
            "  Latest:      v{} ({})",
            v,
            format_ts_relative(at / 1000)
        ),
        _ => println!("  Latest:      none"),
    }

    let source_rows = sqlx::query(
        r#"
        SELECT source, COUNT(*) AS record_count, MAX(ingested_at) AS last_ingested
        FROM raw_records
        GROUP BY source
        ORDER BY record_count DESC, source ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let source_stats: Vec<SourceStats> = source_rows
        .iter()
        .map(|row| SourceStats {
            source: row.get("source"),
            record_count: row.get("record_count"),
            last_ingested_ms: row.get("last_ingested"),
        })
        .collect();

    if !source_stats.is_empty() {
        println!();
        println!("  By source:");
        println!("  {:<24} {:>8}   {}", "SOURCE", "RECORDS", "LAST INGEST");
        println!("  {}", "-".repeat(56));

        for s in &source_stats {
            let last = match s.last_ingested_ms {
                Some(ms) => format_ts_relative(ms / 1000),
                None => "never".to_string(),
            };
            println!("  {:<24} {:>8}   {}", s.source, s.record_count, last);
        }
    }

    println!();

    pool.close().await;
    Ok(())
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

/// Format a Unix timestamp (seconds) relative to now, e.g. "3 hours ago".
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
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
    fn test_format_relative() {
        let now = chrono::Utc::now().timestamp();
        assert_eq!(format_ts_relative(now), "just now");
        assert_eq!(format_ts_relative(now - 120), "2 mins ago");
        assert_eq!(format_ts_relative(now - 3600), "1 hour ago");
        assert_eq!(format_ts_relative(now - 3 * 86400), "3 days ago");
    }
}
