mod analytics;
mod cache;
mod dates;
mod db;
mod http;
mod ipc;
mod model;
mod status;

use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "eximd")]
#[command(about = "Shipment analytics sidecar for the customs logistics dashboard")]
struct Args {
    /// Workspace directory to open at startup
    #[arg(short, long, env = "EXIMD_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Serve the REST API on this address instead of stdin/stdout
    #[arg(long, env = "EXIMD_HTTP_ADDR")]
    http: Option<String>,

    /// Lifetime of cached dashboard payloads, in seconds
    #[arg(long, env = "EXIMD_CACHE_TTL_SECS", default_value = "300")]
    cache_ttl_secs: u64,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "eximd=debug" } else { "eximd=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // stdout carries protocol frames.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut state = ipc::AppState::new(cache::AnalyticsCache::new(Duration::from_secs(
        args.cache_ttl_secs,
    )));
    if let Some(path) = &args.workspace {
        ipc::select_workspace(&mut state, path)?;
    }

    match args.http {
        Some(addr) => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(http::serve(&addr, state))
        }
        None => {
            run_stdio(&mut state);
            Ok(())
        }
    }
}

fn run_stdio(state: &mut ipc::AppState) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                tracing::warn!(error = %e, "unparseable request line");
                let _ = writeln!(
                    stdout,
                    "{}",
                    serde_json::json!({
                        "ok": false,
                        "error": { "code": "bad_json", "message": e.to_string() }
                    })
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
