//! Status command - show lifecycle state

use crate::cli::HostContext;
use crate::config::{Config, ConfigManager};
use crate::error::SiteCacheResult;
use crate::lifecycle::{WorkerRecord, WorkerState};
use console::{style, Emoji};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[WARN] ");
static PENDING: Emoji<'_, '_> = Emoji("○ ", "[--] ");

/// Execute the status command
pub async fn execute(config: &Config) -> SiteCacheResult<()> {
    let host = HostContext::load(config).await?;
    let settings = &host.settings;

    println!("{}", style("sitecache status").bold().cyan());
    println!();

    println!("{}", style("Configuration:").bold());
    println!("  Generation:  {}", settings.generation());
    println!("  Origin:      {}", settings.origin());
    println!("  Precache:    {} entries", settings.manifest().len());
    println!("  Match scope: {}", settings.match_scope());
    println!("  State dir:   {}", ConfigManager::state_dir(config).display());
    println!();

    println!("{}", style("Lifecycle:").bold());
    if host.registry.is_empty() {
        println!("  {}No generation installed yet", PENDING);
    }
    for record in host.registry.records() {
        print_record(record, record.generation == settings.generation());
    }

    if let Some(record) = host.registry.get(settings.generation()) {
        let installed = matches!(record.state, WorkerState::Installed | WorkerState::Active);
        if installed && record.manifest_digest != settings.manifest_digest() {
            println!();
            println!(
                "  {}Precache list changed since {} was installed; bump cache.generation to ship it",
                WARN,
                record.generation
            );
        }
    }

    println!();
    match host.registry.active() {
        Some(active) => println!(
            "{}Fetches are served by {}",
            CHECK,
            style(&active.generation).green()
        ),
        None => println!("{}No active controller; fetches go to the network", PENDING),
    }

    Ok(())
}

fn print_record(record: &WorkerRecord, current: bool) {
    let marker = match record.state {
        WorkerState::Active => CHECK,
        WorkerState::Installed => PENDING,
        _ => WARN,
    };
    let label = if current { " (configured)" } else { "" };

    println!(
        "  {}{}{} {} - {} entries, manifest {}",
        marker,
        record.generation,
        style(label).dim(),
        style(record.state).bold(),
        record.entries,
        record.manifest_digest
    );
    if let Some(at) = record.installed_at {
        println!("      installed {}", at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(at) = record.activated_at {
        println!("      activated {}", at.format("%Y-%m-%d %H:%M"));
    }
}
