//! Fetch command - send one request through the active worker

use crate::cli::args::FetchArgs;
use crate::error::{ShellCacheError, ShellCacheResult};
use crate::host::WorkerHost;
use crate::http::{Origin, Request};
use console::style;
use std::io::Write;
use tokio::fs;
use tracing::debug;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, host: &WorkerHost) -> ShellCacheResult<()> {
    let origin = Origin::parse(&host.config().site.origin)?;
    let url = origin.resolve(&args.url)?;

    let mut request = Request::new(args.method, url).with_destination(args.destination());
    for (name, value) in &args.headers {
        request = request.with_header(name.as_str(), value.as_str());
    }
    if let Some(data) = args.data.clone() {
        request = request.with_body(data);
    }

    let worker = host.active_worker().await?;
    let outcome = worker.on_fetch(&request).await?;
    let source = outcome.source();

    // Bypassed requests go to the network untouched
    let response = match outcome.into_response() {
        Some(response) => response,
        None => {
            debug!("Forwarding {} {} to the network", request.method, request.url);
            host.network().fetch(&request).await?
        }
    };

    let status = if response.ok() {
        style(response.status).green()
    } else {
        style(response.status).red()
    };
    eprintln!(
        "{} {} {} ({} bytes)",
        status,
        request.url,
        style(source).cyan(),
        response.body.len()
    );

    match args.output {
        Some(path) => fs::write(&path, &response.body)
            .await
            .map_err(|e| ShellCacheError::io(format!("writing {}", path.display()), e))?,
        None => std::io::stdout()
            .write_all(&response.body)
            .map_err(|e| ShellCacheError::io("writing response body", e))?,
    }

    Ok(())
}
