//! Install command - precache the manifest

use crate::cache::CacheSettings;
use crate::cli::HostContext;
use crate::config::Config;
use crate::error::{SiteCacheError, SiteCacheResult};
use crate::lifecycle::InstallReport;
use console::style;

/// Execute the install command
pub async fn execute(config: &Config) -> SiteCacheResult<()> {
    let mut host = HostContext::load(config).await?;

    println!(
        "Installing {} ({} entries from {})",
        style(host.settings.generation()).cyan(),
        host.settings.manifest().len(),
        host.settings.origin()
    );

    let report = run(&mut host).await?;

    println!(
        "{} installed {} entries ({}). Run {} to take control.",
        style("✓").green(),
        report.stored,
        format_bytes(report.bytes),
        style("sitecache activate").bold()
    );
    Ok(())
}

/// Dispatch install and record the outcome
pub(crate) async fn run(host: &mut HostContext) -> SiteCacheResult<InstallReport> {
    let manager = host.manager();

    match manager.install().await {
        Ok(report) => {
            host.persist(&manager, Some(report.stored)).await?;
            host.journal
                .record(
                    "install.completed",
                    &serde_json::json!({
                        "generation": report.generation,
                        "entries": report.stored,
                        "bytes": report.bytes,
                        "manifest_digest": host.settings.manifest_digest(),
                    }),
                )
                .await;
            Ok(report)
        }
        Err(e) => {
            host.persist_after_failure(&manager).await;
            host.journal
                .record("install.failed", &failure_data(&host.settings, &e))
                .await;
            Err(e)
        }
    }
}

pub(crate) fn failure_data(
    settings: &CacheSettings,
    error: &SiteCacheError,
) -> serde_json::Value {
    serde_json::json!({
        "generation": settings.generation(),
        "error": error.to_string(),
    })
}

/// Format bytes as human-readable size (e.g., "1.5 MB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
