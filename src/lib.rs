pub mod cli;
pub mod clock;
pub mod config;
pub mod fields;
pub mod filter;
pub mod pagination;
pub mod query;
pub mod request;
pub mod sort;

use anyhow::Context;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

pub use cli::{Commands, cli_parse};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, DateFields, FilterOptions, QueryOptions, load_config};
pub use filter::{FilterDocument, compile};
pub use query::{QueryValue, RawQuery};
pub use request::{ParsedQuery, map_query, parse_query};

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());

    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(EnvFilter::new(filter))
        .try_init();
}

fn write_output_file(path: &std::path::Path, content: &str) -> anyhow::Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write output file '{}'", path.display()))
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    init_logging(cli.verbose);

    let options = load_config(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(config_path) = &cli.config {
        tracing::info!(path = %config_path.display(), "loaded options");
    }

    let clock: Box<dyn Clock> = match cli.now {
        Some(now) => Box::new(FixedClock(now)),
        None => Box::new(SystemClock),
    };
    let clock = clock.as_ref();

    let value = match &cli.command {
        Commands::Parse { query } => serde_json::to_value(parse_query(query, &options, clock))?,
        Commands::Filters { query } => {
            compile(&RawQuery::parse(query), &options.filter_options(), clock).into_value()
        }
        Commands::Fields { query } => Value::Object(fields::select_fields(
            &RawQuery::parse(query),
            &options.defaults.fields,
        )),
        Commands::Sort { query } => {
            Value::Object(sort::sort(&RawQuery::parse(query), &options.defaults.sort))
        }
        Commands::Pagination { query } => {
            serde_json::to_value(pagination::paginate(&RawQuery::parse(query), &options))?
        }
    };

    let rendered = if cli.compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };

    match &cli.output {
        Some(path) => write_output_file(path, &rendered)?,
        None => println!("{}", rendered),
    }

    Ok(())
}
