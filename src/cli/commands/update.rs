//! Update command - install and activate as needed

use crate::cli::commands::{activate, install};
use crate::cli::HostContext;
use crate::config::Config;
use crate::error::SiteCacheResult;
use crate::lifecycle::WorkerState;
use console::style;

/// Execute the update command
pub async fn execute(config: &Config) -> SiteCacheResult<()> {
    let mut host = HostContext::load(config).await?;

    if host.current_state() == WorkerState::Active {
        println!(
            "{} {} is already active",
            style("✓").green(),
            style(host.settings.generation()).cyan()
        );
        return Ok(());
    }

    if host.current_state() != WorkerState::Installed {
        let report = install::run(&mut host).await?;
        println!(
            "{} installed {} entries ({})",
            style("✓").green(),
            report.stored,
            install::format_bytes(report.bytes)
        );
    }

    let report = activate::run(&mut host).await?;
    activate::print_report(&report);
    Ok(())
}
