//! Activate command - take control and sweep stale generations

use crate::cli::commands::install::failure_data;
use crate::cli::HostContext;
use crate::config::Config;
use crate::error::SiteCacheResult;
use crate::lifecycle::SweepReport;
use console::style;
use tracing::debug;

/// Execute the activate command
pub async fn execute(config: &Config) -> SiteCacheResult<()> {
    let mut host = HostContext::load(config).await?;
    let report = run(&mut host).await?;
    print_report(&report);
    Ok(())
}

/// Dispatch activate and record the outcome
pub(crate) async fn run(host: &mut HostContext) -> SiteCacheResult<SweepReport> {
    let manager = host.manager();

    match manager.activate().await {
        Ok(report) => {
            host.persist(&manager, None).await?;
            let retired = host.retire_other_generations().await?;
            debug!("Retired lifecycle records: {:?}", retired);

            host.journal
                .record(
                    "activate.completed",
                    &serde_json::json!({
                        "generation": report.kept,
                        "deleted": report.deleted,
                        "failed": report
                            .failed
                            .iter()
                            .map(|(name, reason)| serde_json::json!({"name": name, "reason": reason}))
                            .collect::<Vec<_>>(),
                    }),
                )
                .await;
            Ok(report)
        }
        Err(e) => {
            host.persist_after_failure(&manager).await;
            host.journal
                .record("activate.failed", &failure_data(&host.settings, &e))
                .await;
            Err(e)
        }
    }
}

pub(crate) fn print_report(report: &SweepReport) {
    println!("{} {} is active", style("✓").green(), style(&report.kept).cyan());

    for name in &report.deleted {
        println!("  {} removed stale cache {}", style("•").red(), name);
    }
    for (name, reason) in &report.failed {
        println!(
            "  {} could not remove {}: {}",
            style("⚠").yellow(),
            name,
            style(reason).dim()
        );
    }
    if report.deleted.is_empty() && report.failed.is_empty() {
        println!("  No stale caches.");
    }
}
