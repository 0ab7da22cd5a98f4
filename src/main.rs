use clap::Parser;
use soroban_orchestrator::cli::{Cli, Verbosity};
use soroban_orchestrator::config::LedgerConfig;
use soroban_orchestrator::output::Formatter;
use soroban_orchestrator::LedgerOrchestrator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn initialize_tracing(verbosity: Verbosity) {
    let log_level = verbosity.to_log_level();
    let fallback_filter = format!("soroban_orchestrator={}", log_level);

    let use_json = std::env::var("SOROBAN_ORCH_JSON").is_ok();

    if use_json {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| fallback_filter.clone().into()),
            )
            .with(json_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true);

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| fallback_filter.into()),
            )
            .with(fmt_layer)
            .init();
    }
}

fn load_config(cli: &Cli) -> soroban_orchestrator::Result<LedgerConfig> {
    let mut config = LedgerConfig::load(cli.config.as_deref())?;
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    Formatter::configure_colors_from_env();

    let cli = Cli::parse();
    initialize_tracing(cli.verbosity());

    let config = load_config(&cli)?;
    tracing::debug!(?config, "Configuration loaded");
    let orchestrator = LedgerOrchestrator::new(config);

    let result = soroban_orchestrator::cli::commands::execute(cli.command, &orchestrator).await;
    if let Err(err) = &result {
        eprintln!("{}", Formatter::error(format!("Error: {err}")));
    }
    result
}
