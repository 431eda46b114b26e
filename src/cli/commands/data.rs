//! Backup, activity log and setup commands

use std::path::Path;

use anyhow::Context;

use crate::config::Config;
use crate::models::activity::LogLevel;
use crate::services::ImportMode;
use crate::state::AppContext;

pub fn cmd_export(ctx: &AppContext, output: Option<&Path>) -> anyhow::Result<()> {
    let json = ctx.backup.export_json()?;

    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write export to {}", path.display()))?;
            ctx.log_book.record(
                LogLevel::Info,
                format!("Exported data to {}", path.display()),
            );
            println!("✓ Exported to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub fn cmd_import(ctx: &AppContext, path: &Path, merge: bool) -> anyhow::Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mode = if merge {
        ImportMode::Merge
    } else {
        ImportMode::Overwrite
    };

    let summary = match ctx.backup.import_all_data(&json, mode) {
        Ok(summary) => summary,
        Err(e) => {
            ctx.log_book
                .record(LogLevel::Error, format!("Import failed: {e}"));
            return Err(e.into());
        }
    };

    ctx.log_book.record(
        LogLevel::Info,
        format!("Imported {} ({mode:?})", path.display()),
    );

    println!("✓ Import complete ({mode:?})");
    println!("  List entries added: {}", summary.list_entries_added);
    println!("  Ratings imported:   {}", summary.ratings_imported);
    if summary.ratings_kept > 0 {
        println!("  Ratings kept:       {}", summary.ratings_kept);
    }
    println!("  Manual entries:     {}", summary.manual_imported);
    if summary.skipped > 0 {
        println!("  Skipped:            {}", summary.skipped);
    }
    Ok(())
}

pub fn cmd_logs(ctx: &AppContext, limit: usize, clear: bool) {
    if clear {
        ctx.log_book.clear();
        println!("✓ Activity log cleared");
        return;
    }

    let entries = ctx.log_book.entries();
    println!("Recent Activity ({} stored)", entries.len());
    println!("{:-<70}", "");
    for entry in entries.iter().rev().take(limit) {
        let marker = match entry.level {
            LogLevel::Info => "•",
            LogLevel::Warn => "⚠",
            LogLevel::Error => "✗",
        };
        println!(
            "{marker} {}  {}",
            entry.at.format("%Y-%m-%d %H:%M:%S"),
            entry.message
        );
    }

    let stats = ctx.log_book.api_stats();
    if stats.is_empty() {
        return;
    }

    println!();
    println!("API Calls");
    println!("{:-<70}", "");
    println!(
        "{:<12} {:>7} {:>9} {:>9}  Last",
        "Service", "Calls", "Failures", "Avg ms"
    );
    for (service, stat) in stats {
        let last = stat
            .last_called
            .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{service:<12} {:>7} {:>9} {:>9}  {last}",
            stat.calls,
            stat.failures,
            stat.average_ms()
        );
    }
}

pub fn cmd_init(path: Option<&Path>) -> anyhow::Result<()> {
    let created = match path {
        Some(path) => Config::create_default_at(path)?,
        None => Config::create_default_if_missing()?,
    };

    if created {
        println!("✓ Config file created. Edit it and run again.");
    } else {
        println!("Config file already exists, leaving it untouched.");
    }
    Ok(())
}
