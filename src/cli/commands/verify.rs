//! Verify command - check precache paths against a built site

use crate::cache::deployed_path;
use crate::cli::args::VerifyArgs;
use crate::config::Config;
use crate::error::{SiteCacheError, SiteCacheResult};
use console::style;
use std::path::{Path, PathBuf};

/// Execute the verify command
pub async fn execute(args: VerifyArgs, config: &Config) -> SiteCacheResult<()> {
    let settings = config.cache_settings()?;

    if !args.site_dir.is_dir() {
        return Err(SiteCacheError::io(
            format!("reading site directory {}", args.site_dir.display()),
            std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    println!(
        "Checking {} precache entries against {}",
        settings.manifest().len(),
        args.site_dir.display()
    );

    let missing = missing_entries(&args.site_dir, settings.manifest());
    for entry in settings.manifest() {
        if missing.iter().any(|(m, _)| m == entry) {
            println!("  {} {}", style("✗").red(), entry);
        } else {
            println!("  {} {}", style("✓").green(), entry);
        }
    }

    if !missing.is_empty() {
        for (entry, path) in &missing {
            println!(
                "  {} {} expected at {}",
                style("•").red(),
                entry,
                style(path.display()).dim()
            );
        }
        return Err(SiteCacheError::ManifestMismatch {
            missing: missing.len(),
            site_dir: args.site_dir,
        });
    }

    println!("{} all precache entries present", style("✓").green());
    Ok(())
}

/// Manifest entries with no matching file, with the path that was expected
fn missing_entries(site_dir: &Path, manifest: &[String]) -> Vec<(String, PathBuf)> {
    manifest
        .iter()
        .map(|entry| (entry.clone(), deployed_path(site_dir, entry)))
        .filter(|(_, path)| !path.is_file())
        .collect()
}
