//! switchyard CLI
//!
//! Dispatches requests given on the command line through the demo
//! application and prints the outcome.

mod app;
mod config;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use switchyard::{Dispatcher, Outcome, RawRequest};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::AppConfig;

/// Route requests through a switchyard application.
#[derive(Parser)]
#[command(name = "switchyard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "SWITCHYARD_CONFIG")]
    config: Option<PathBuf>,

    /// Directory served under /public (overrides the config file).
    #[arg(short, long, env = "SWITCHYARD_STATIC_DIR")]
    static_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Dispatch one request and print the response.
    Dispatch {
        /// Request method (GET, POST, ...).
        method: String,

        /// Request target, e.g. `/users/phil?format=json`.
        target: String,

        /// Request header as `Name: value`; may be repeated.
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body.
        #[arg(short, long)]
        data: Option<String>,
    },

    /// List the application's routes in match order.
    Routes,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.static_dir {
        config.static_files.root = dir;
    }
    debug!("static files served from {}", config.static_files.root.display());

    let router = app::build_router(config.static_files).context("building routes")?;

    match cli.command {
        Commands::Routes => {
            for route in router.routes() {
                let name = route.name.map(|n| format!("  ({n})")).unwrap_or_default();
                println!("{:<8} {}{}", route.method.to_string(), route.path, name);
            }
        }

        Commands::Dispatch {
            method,
            target,
            headers,
            data,
        } => {
            let mut request = RawRequest::new(method, target);
            for header in headers {
                let Some((name, value)) = header.split_once(':') else {
                    bail!("header '{header}' is not of the form 'Name: value'");
                };
                request = request.header(name.trim(), value.trim());
            }
            if let Some(data) = data {
                request = request.body(data);
            }

            let dispatcher = Dispatcher::with_config(router, config.dispatcher);
            print_outcome(dispatcher.dispatch(request).await);
        }
    }

    Ok(())
}

fn print_outcome(outcome: Outcome) {
    let label = match &outcome {
        Outcome::Sent(_) => "sent",
        Outcome::NotFound(_) => "not found",
        Outcome::Exhausted(_) => "exhausted",
        Outcome::Stalled(_) => "stalled",
        Outcome::Faulted(_) => "faulted",
        Outcome::Cancelled => "cancelled",
    };
    debug!("dispatch outcome: {}", label);

    let Some(response) = outcome.into_response() else {
        println!("(no response)");
        return;
    };

    println!("{} {}", response.status, response.status_text());
    let mut headers: Vec<_> = response.headers.iter().collect();
    headers.sort();
    for (name, value) in headers {
        println!("{name}: {value}");
    }
    println!();
    match response.body_string() {
        Some(text) => println!("{text}"),
        None => println!("<{} bytes of binary data>", response.body.len()),
    }
}
