//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sitecache - offline cache-first asset manager
///
/// Precaches a static site's assets into a versioned cache bucket, serves
/// them cache-first, and sweeps stale generations on activation.
#[derive(Parser, Debug)]
#[command(name = "sitecache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SITECACHE_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Precache the manifest into the current generation's bucket
    Install,

    /// Activate the installed generation and sweep stale buckets
    Activate,

    /// Install and activate the current generation, as needed
    Update,

    /// Fetch a URL through the active cache controller
    Fetch(FetchArgs),

    /// Show lifecycle state for every known generation
    Status,

    /// List cache buckets
    Buckets(BucketsArgs),

    /// Check precache paths against a built site directory
    Verify(VerifyArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Path or absolute URL to request
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request headers (NAME:VALUE)
    #[arg(short = 'H', long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Request body
    #[arg(short, long)]
    pub data: Option<String>,

    /// Write the body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print status, headers and response source to stderr
    #[arg(short, long)]
    pub include: bool,
}

/// Parse NAME:VALUE header
fn parse_header(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid header (expected NAME:VALUE): {}", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("invalid header (empty name): {}", s));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Output format for the buckets command
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the buckets command
#[derive(Parser, Debug)]
pub struct BucketsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the verify command
#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Built site directory
    #[arg(long, default_value = "_site")]
    pub site_dir: PathBuf,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_install() {
        let cli = Cli::parse_from(["sitecache", "install"]);
        assert!(matches!(cli.command, Commands::Install));
    }

    #[test]
    fn cli_parses_fetch() {
        let cli = Cli::parse_from([
            "sitecache",
            "fetch",
            "/assets/css/main.css",
            "-H",
            "Accept: text/css",
            "-i",
        ]);
        match cli.command {
            Commands::Fetch(args) => {
                assert_eq!(args.url, "/assets/css/main.css");
                assert_eq!(args.method, "GET");
                assert_eq!(
                    args.headers,
                    vec![("Accept".to_string(), "text/css".to_string())]
                );
                assert!(args.include);
                assert!(args.output.is_none());
            }
            _ => panic!("expected Fetch command"),
        }
    }

    #[test]
    fn cli_rejects_bad_header() {
        let result = Cli::try_parse_from(["sitecache", "fetch", "/", "-H", "no-colon"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_verify_default() {
        let cli = Cli::parse_from(["sitecache", "verify"]);
        match cli.command {
            Commands::Verify(args) => assert_eq!(args.site_dir, PathBuf::from("_site")),
            _ => panic!("expected Verify command"),
        }
    }

    #[test]
    fn cli_parses_config_init_force() {
        let cli = Cli::parse_from(["sitecache", "config", "init", "--force"]);
        match cli.command {
            Commands::Config(ConfigArgs {
                action: Some(ConfigAction::Init { force }),
            }) => assert!(force),
            _ => panic!("expected Config Init command"),
        }
    }

    #[test]
    fn cli_verbose_levels() {
        let cli = Cli::parse_from(["sitecache", "status"]);
        assert_eq!(cli.verbose, 0);

        let cli = Cli::parse_from(["sitecache", "-v", "status"]);
        assert_eq!(cli.verbose, 1);

        let cli = Cli::parse_from(["sitecache", "-vv", "status"]);
        assert_eq!(cli.verbose, 2);
    }
}
