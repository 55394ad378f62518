//! Run-summary manifest written next to the section files.

use std::fs;
use std::path::Path;

use aerocrawl_engine::PipelineSummary;
use crawl_logging::{crawl_info, crawl_warn};
use serde_json::json;

const MANIFEST_FILENAME: &str = "manifest.json";

/// Writes `manifest.json` into the output directory. Best-effort: a failure
/// here is logged and never fails the run, the section files are already on
/// disk.
pub fn write_manifest(output_dir: &Path, summary: &PipelineSummary) {
    let harvest_stats = summary.harvest.as_ref().ok();
    let manifest = json!({
        "finished_utc": chrono::Utc::now().to_rfc3339(),
        "rows_written": summary.persist.as_ref().map(|p| p.rows_written).unwrap_or(0),
        "categories": harvest_stats.map(|s| s.categories).unwrap_or(0),
        "pages": harvest_stats.map(|s| s.pages).unwrap_or(0),
        "records_harvested": harvest_stats.map(|s| s.records).unwrap_or(0),
        "rows_skipped": harvest_stats.map(|s| s.skipped_rows).unwrap_or(0),
        "harvest_error": summary.harvest.as_ref().err().map(ToString::to_string),
        "persist_error": summary.persist.as_ref().err().map(ToString::to_string),
    });

    let path = output_dir.join(MANIFEST_FILENAME);
    match serde_json::to_string_pretty(&manifest) {
        Ok(text) => match fs::write(&path, text) {
            Ok(()) => crawl_info!("wrote run manifest to {}", path.display()),
            Err(err) => crawl_warn!("could not write {}: {err}", path.display()),
        },
        Err(err) => crawl_warn!("could not serialize run manifest: {err}"),
    }
}
