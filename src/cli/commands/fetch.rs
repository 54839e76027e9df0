//! Fetch command - request a URL through the active controller

use crate::cache::Request;
use crate::cli::args::FetchArgs;
use crate::cli::HostContext;
use crate::config::Config;
use crate::error::{SiteCacheError, SiteCacheResult};
use crate::lifecycle::FetchSource;
use crate::network::Fetcher;
use console::style;
use std::io::Write;
use tokio::fs;
use tracing::debug;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> SiteCacheResult<()> {
    let host = HostContext::load(config).await?;

    let url = host.settings.resolve(&args.url)?;
    let mut request = Request::new(&args.method, url);
    for (name, value) in args.headers {
        request = request.with_header(name, value);
    }
    if let Some(data) = args.data {
        request = request.with_body(data.into_bytes());
    }

    // Uncontrolled pages go straight to the network
    let (source, response) = match host.controller()? {
        Some(controller) => {
            debug!(
                "Intercepting through {}",
                controller.settings().generation()
            );
            let outcome = controller.handle_fetch(&request).await?;
            (outcome.source, outcome.response)
        }
        None => {
            debug!("No active controller, fetching from network");
            (FetchSource::Network, host.fetcher.fetch(&request).await?)
        }
    };

    if args.include {
        let source = match source {
            FetchSource::Cache => style("cache").green(),
            FetchSource::Network => style("network").yellow(),
        };
        eprintln!("{} {} ({})", request.method, request.url, source);
        eprintln!("status: {}", response.status);
        for (name, value) in &response.headers {
            eprintln!("{}: {}", name, value);
        }
        eprintln!();
    }

    match args.output {
        Some(path) => fs::write(&path, &response.body)
            .await
            .map_err(|e| SiteCacheError::io(format!("writing {}", path.display()), e))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&response.body)
                .and_then(|_| stdout.flush())
                .map_err(|e| SiteCacheError::io("writing response to stdout", e))?;
        }
    }

    Ok(())
}
