use anyhow::Context;
use clap::Parser;

mod bootstrap;
mod cli;
mod error;
mod extract;
mod identity;
mod routes;
mod state;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("x2a error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    if let cli::Commands::Schema { name } = &cli.command {
        return print_schema(name.as_deref());
    }

    let mut config = bootstrap::load_config(cli.config.as_deref())?;

    match cli.command {
        cli::Commands::CheckConfig => {
            config.validate().context("invalid x2a configuration")?;
            println!("{}", bootstrap::render_redacted(&config)?);
            Ok(())
        }
        cli::Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind_address = bind;
            }
            serve(&config).await
        }
        cli::Commands::Schema { .. } => Ok(()),
    }
}

fn print_schema(name: Option<&str>) -> anyhow::Result<()> {
    use x2a_core::schema::{SCHEMA_NAMES, api_schema};

    let Some(name) = name else {
        for name in SCHEMA_NAMES {
            println!("{name}");
        }
        return Ok(());
    };
    let Some(schema) = api_schema(name)? else {
        anyhow::bail!(
            "unknown schema '{name}', expected one of: {}",
            SCHEMA_NAMES.join(", ")
        );
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

async fn serve(config: &x2a_config::X2aConfig) -> anyhow::Result<()> {
    let state = bootstrap::compose(config).await?;
    let app = routes::router(state, &config.server.api_prefix);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_address))?;
    tracing::info!(
        address = %config.server.bind_address,
        api_base_url = %config.server.api_base_url(),
        namespace = %config.kubernetes.namespace,
        "x2a listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("X2A_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
