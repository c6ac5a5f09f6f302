use std::path::PathBuf;

use clap::Parser;
use color_eyre::Report;
use color_eyre::eyre::WrapErr;
use nestegg::report::{self, OutputFormat};
use nestegg::{default_log_path, init_logging, load_scenario, load_tax_config};
use nestegg_core::model::Strategy;
use nestegg_core::simulation::{simulate, simulate_strategies};

#[derive(Parser, Debug)]
#[command(name = "nestegg")]
#[command(about = "Year-by-year Canadian retirement income projection")]
struct Args {
    /// Scenario file (YAML, or JSON with a .json extension)
    scenario: PathBuf,

    /// Tax configuration file, overriding the scenario's and the built-in tables
    #[arg(long)]
    tax_config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Withdrawal strategy, overriding the scenario's
    #[arg(short, long)]
    strategy: Option<String>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Log file (default: ~/.nestegg/nestegg.log)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run every strategy and print one summary line each
    #[arg(long)]
    compare: bool,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let log_path = args.log_file.clone().unwrap_or_else(default_log_path);
    init_logging(&log_path, &args.log_level).wrap_err("failed to initialise logging")?;

    let scenario = load_scenario(&args.scenario).wrap_err("failed to load scenario")?;
    let config = match &args.tax_config {
        Some(path) => load_tax_config(path).wrap_err("failed to load tax configuration")?,
        None => scenario.tax_config_or_default(),
    };

    let mut household = scenario.household;
    if let Some(name) = &args.strategy {
        household.strategy = name
            .parse::<Strategy>()
            .wrap_err_with(|| format!("--strategy {name}"))?;
    }

    tracing::info!(
        scenario = %args.scenario.display(),
        strategy = %household.strategy,
        province = household.province.code(),
        compare = args.compare,
        "running projection"
    );

    if args.compare {
        let results = simulate_strategies(&household, &config, &Strategy::ALL);
        match args.format {
            OutputFormat::Table => print!("{}", report::render_comparison(&results)),
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&report::comparison_json(&results))?
            ),
        }
        return Ok(());
    }

    match simulate(&household, &config) {
        Ok(result) => {
            tracing::info!(
                years = result.summary.years_simulated,
                funded = result.summary.years_funded,
                "projection finished"
            );
            match args.format {
                OutputFormat::Table => print!("{}", report::render_table(&result)),
                OutputFormat::Json => println!("{}", report::render_json(&result)?),
            }
            Ok(())
        }
        Err(err) => {
            tracing::error!(kind = err.kind(), "{err}");
            if args.format == OutputFormat::Json {
                println!("{}", report::render_error_json(&err)?);
            }
            Err(Report::new(err).wrap_err("projection failed"))
        }
    }
}
