//! Backup display formatting
//!
//! Formats backup listings and backup run reports.

use tabled::settings::Style;
use tabled::{Table, Tabled};

use super::{format_size, format_timestamp};
use crate::backup::{BackupReport, PruneReport, WorldBackups};

#[derive(Tabled)]
struct BackupRow {
    #[tabled(rename = "World")]
    world: String,
    #[tabled(rename = "Backup")]
    name: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Size")]
    size: String,
}

/// Format the per-world backup listing
///
/// Worlds with more backups than shown get a "... and N more" line.
pub fn format_backup_listing(worlds: &[WorldBackups]) -> String {
    if worlds.is_empty() {
        return "No backups found.\n".to_string();
    }

    let mut output = String::new();
    for world in worlds {
        output.push_str(&format!(
            "World: {} ({} backup{}, {})\n",
            world.world,
            world.backup_count,
            if world.backup_count == 1 { "" } else { "s" },
            format_size(world.total_bytes)
        ));

        if world.backup_count == 0 {
            output.push_str("  (no backups)\n");
        }
        for record in &world.recent {
            output.push_str(&format!(
                "  {}  {}  {:>10}\n",
                record.name,
                format_timestamp(&record.created_at),
                format_size(record.size_bytes)
            ));
        }

        let hidden = world.backup_count.saturating_sub(world.recent.len());
        if hidden > 0 {
            output.push_str(&format!("  ... and {} more\n", hidden));
        }
        output.push('\n');
    }

    output
}

/// Format every backup as one table
pub fn format_backup_table(worlds: &[WorldBackups]) -> String {
    let rows: Vec<BackupRow> = worlds
        .iter()
        .flat_map(|world| {
            world.recent.iter().map(move |record| BackupRow {
                world: world.world.clone(),
                name: record.name.clone(),
                created: format_timestamp(&record.created_at),
                size: format_size(record.size_bytes),
            })
        })
        .collect();

    if rows.is_empty() {
        return "No backups found.\n".to_string();
    }

    let mut table = Table::new(rows);
    table.with(Style::psql());
    format!("{}\n", table)
}

/// Format the outcome of `backup create`
pub fn format_backup_report(report: &BackupReport) -> String {
    let mut output = String::new();
    output.push_str(&format!("Backup created: {}\n", report.record.name));
    output.push_str(&format!("Location: {}\n", report.record.path.display()));
    output.push_str(&format!(
        "Size: {} ({} files)\n",
        format_size(report.record.size_bytes),
        report.stats.files
    ));

    if !report.pruned.is_empty() {
        output.push_str(&format!("Removed {} old backup(s):\n", report.pruned.len()));
        for record in &report.pruned {
            output.push_str(&format!("  {}\n", record.name));
        }
    }
    for (path, reason) in &report.prune_failures {
        output.push_str(&format!(
            "Warning: could not remove {}: {}\n",
            path.display(),
            reason
        ));
    }

    output
}

/// Format the outcome of `backup prune`
pub fn format_prune_report(world: &str, report: &PruneReport) -> String {
    if report.deleted.is_empty() && report.failed.is_empty() {
        return format!("No backups of '{}' to prune.\n", world);
    }

    let mut output = format!("Deleted {} backup(s) of '{}'.\n", report.deleted.len(), world);
    for (path, reason) in &report.failed {
        output.push_str(&format!(
            "Warning: could not remove {}: {}\n",
            path.display(),
            reason
        ));
    }
    output
}
