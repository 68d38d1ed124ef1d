use anyhow::{Context, Result};
use clap::Parser;
use kpi_compare::cli::{Cli, OutputFormat, Preset};
use kpi_compare::input::ComparisonInput;
use kpi_compare::{ComparisonConfig, ComparisonEngine};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    } else if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Resolve thresholds: config file, else preset, then CLI overrides
fn load_config(cli: &Cli) -> Result<ComparisonConfig> {
    let mut config = match &cli.config {
        Some(path) => ComparisonConfig::from_file(path)?,
        None => match cli.preset {
            Preset::Default => ComparisonConfig::default(),
            Preset::Strict => ComparisonConfig::strict(),
            Preset::Permissive => ComparisonConfig::permissive(),
        },
    };

    if let Some(top_k) = cli.top_k {
        config.top_k = top_k;
    }
    if let Some(alpha) = cli.alpha {
        config.significance_alpha = alpha;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let config = load_config(&cli)?;
    let input = ComparisonInput::from_file(&cli.input)?;
    let query = cli.rank_query()?;

    tracing::debug!(
        metrics = input.metrics.len(),
        weights = input.weights.len(),
        "loaded comparison input"
    );

    let report = ComparisonEngine::new(&config)?
        .with_weights(input.weights)
        .with_query(query)
        .analyze(&input.metrics)?;

    match cli.format {
        OutputFormat::Text => print!("{}", report.to_report_string()),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize comparison report")?;
            println!("{}", json);
        }
    }

    Ok(())
}
