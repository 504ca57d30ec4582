use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Turn request query strings into pagination, projection, sort and filter documents
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML options file (default.*, use_page, date_fields)
    #[arg(short, long, global = true, env = "QUERY_MAPPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Freeze the clock used for `now`, `today` and periods
    /// (e.g. "2019-01-24" or "2019-01-24T10:00:00")
    #[arg(long, global = true, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,

    /// Print JSON on a single line
    #[arg(long, global = true)]
    pub compact: bool,

    /// Write the JSON to this file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Log to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pagination, fields, sort and filters together
    Parse {
        /// Query string, with or without the leading '?'
        #[arg(allow_hyphen_values = true)]
        query: String,
    },
    /// Only the filter document
    Filters {
        #[arg(allow_hyphen_values = true)]
        query: String,
    },
    /// Only the field projection
    Fields {
        #[arg(allow_hyphen_values = true)]
        query: String,
    },
    /// Only the sort ordination
    Sort {
        #[arg(allow_hyphen_values = true)]
        query: String,
    },
    /// Only limit and skip/page
    Pagination {
        #[arg(allow_hyphen_values = true)]
        query: String,
    },
}

fn parse_now(value: &str) -> Result<NaiveDateTime, String> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN))
        .map_err(|_| format!("expected YYYY-MM-DD or YYYY-MM-DDThh:mm:ss, got '{}'", value))
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
