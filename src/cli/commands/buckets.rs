//! Buckets command - list cache buckets

use crate::cache::CacheStorage;
use crate::cli::args::{BucketsArgs, OutputFormat};
use crate::cli::HostContext;
use crate::config::Config;
use crate::error::SiteCacheResult;
use console::style;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct BucketSummary {
    name: String,
    entries: usize,
    current: bool,
}

/// Execute the buckets command
pub async fn execute(args: BucketsArgs, config: &Config) -> SiteCacheResult<()> {
    let host = HostContext::load(config).await?;
    let current = host.settings.generation();

    let mut summaries = vec![];
    for name in host.storage.bucket_names().await? {
        let entries = match host.storage.bucket(&name).await? {
            Some(bucket) => bucket.keys().await?.len(),
            None => 0,
        };
        summaries.push(BucketSummary {
            current: name == current,
            name,
            entries,
        });
    }

    match args.format {
        OutputFormat::Table => print_table(&summaries),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Plain => {
            for summary in &summaries {
                println!("{}", summary.name);
            }
        }
    }

    Ok(())
}

fn print_table(summaries: &[BucketSummary]) {
    if summaries.is_empty() {
        println!("No cache buckets found.");
        return;
    }

    println!("{:<40} {:<10} {:<10}", "BUCKET", "ENTRIES", "STATUS");
    println!("{}", "-".repeat(60));

    for summary in summaries {
        let status = if summary.current {
            style("current").green().to_string()
        } else {
            style("stale").yellow().to_string()
        };
        println!(
            "{:<40} {:<10} {:<10}",
            summary.name, summary.entries, status
        );
    }

    println!();
    println!("Total: {} bucket(s)", summaries.len());
}
