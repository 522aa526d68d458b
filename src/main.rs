//! sls-axum
//!
//! Runs one route of an axum application as a Lambda function, or every route
//! behind a local HTTP server for development.
//!
//! ```text
//!   sls-axum --config sls.toml lambda --route list    # Lambda runtime, one route
//!   sls-axum --config sls.toml serve --bind 0.0.0.0:3000
//!   sls-axum --config sls.toml routes                 # print the route table
//! ```

use std::path::PathBuf;

use axum::BoxError;
use clap::{Parser, Subcommand};
use lambda_runtime::{service_fn, LambdaEvent};
use tokio::net::TcpListener;

use sls_axum::adapter::ProxyEvent;
use sls_axum::app::ControllerRegistry;
use sls_axum::config::{load_config, AppConfig, ObservabilityConfig};
use sls_axum::handlers::{build_handlers, InvocationError};
use sls_axum::http::LocalServer;
use sls_axum::lifecycle::Shutdown;
use sls_axum::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "sls-axum")]
#[command(about = "Per-route serverless handlers for axum applications", long_about = None)]
struct Cli {
    /// Route table and runtime settings.
    #[arg(short, long, env = "SLS_CONFIG", default_value = "sls.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve one route through the Lambda runtime API
    Lambda {
        /// Route to serve. May be omitted when the table has a single route.
        #[arg(short, long, env = "SLS_ROUTE")]
        route: Option<String>,
    },
    /// Serve every route over HTTP for local development
    Serve {
        /// Listen address. Defaults to `local.bind_address`.
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Print the validated route table as JSON
    Routes,
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init(&ObservabilityConfig::default());
            tracing::error!(path = %cli.config.display(), error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };
    logging::init(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        path = %cli.config.display(),
        routes = config.routes.len(),
        "Configuration loaded"
    );

    match cli.command {
        Commands::Lambda { route } => run_lambda(config, route).await,
        Commands::Serve { bind } => run_local(config, bind).await,
        Commands::Routes => {
            println!("{}", serde_json::to_string_pretty(&config.routes)?);
            Ok(())
        }
    }
}

async fn run_lambda(config: AppConfig, route: Option<String>) -> Result<(), BoxError> {
    let route = match route {
        Some(route) => route,
        None if config.routes.len() == 1 => config.routes[0].name.clone(),
        None => return Err("no route selected: pass --route or set SLS_ROUTE".into()),
    };

    let mut table = build_handlers(config, ControllerRegistry::builtin(), None)?;
    let handler = table
        .remove(&route)
        .ok_or_else(|| format!("unknown route '{route}'"))?;

    tracing::info!(route = %route, "Starting Lambda runtime");
    lambda_runtime::run(service_fn(move |event: LambdaEvent<ProxyEvent>| {
        let handler = handler.clone();
        async move {
            handler
                .invoke(event.payload, event.context.into())
                .await
                .map_err(InvocationError::into_inner)
        }
    }))
    .await
}

async fn run_local(config: AppConfig, bind: Option<String>) -> Result<(), BoxError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind = bind.unwrap_or_else(|| config.local.bind_address.clone());
    let table = build_handlers(config.clone(), ControllerRegistry::builtin(), None)?;
    let server = LocalServer::new(&config, &table)?;

    let listener = TcpListener::bind(&bind).await?;
    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    server.run(listener, shutdown.subscribe()).await?;
    tracing::info!("Shutdown complete");
    Ok(())
}
