use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use super::parsers::{
    parse_duration_arg, parse_header, parse_minutes, parse_positive_u64, parse_positive_usize,
    parse_rate,
};
use super::types::{PositiveU64, PositiveUsize};

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Async API stress tester - request suites, bounded-concurrency and rate-paced load, declarative response validation, and streaming latency statistics."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the suite COUNT times with at most CONCURRENCY suite executions in flight
    Fixed(FixedArgs),
    /// Fire requests round-robin at RATE per second for DURATION minutes
    Timed(TimedArgs),
    /// Run each request once and print per-rule validation detail
    Single(SingleArgs),
    /// Issue one request and print a suggested baseline rule set as JSON
    Suggest(SuggestArgs),
}

#[derive(Debug, Args, Clone)]
pub struct SuiteArgs {
    /// Suite file (.toml or .json); defaults to apiload.toml / apiload.json
    #[arg(long, short = 's', env = "APILOAD_SUITE")]
    pub suite: Option<String>,

    /// Override the suite base URL
    #[arg(long = "base-url", short = 'u')]
    pub base_url: Option<String>,

    /// Extra header applied to every request ('Key: Value')
    #[arg(long = "header", short = 'H', value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Per-request timeout (supports ms/s/m)
    #[arg(long = "timeout", value_parser = parse_duration_arg)]
    pub timeout: Option<Duration>,

    /// Bearer token sent as the Authorization header
    #[arg(long = "bearer-token", env = "APILOAD_BEARER_TOKEN")]
    pub bearer_token: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct FixedArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Number of suite executions
    #[arg(long, short = 'n', value_parser = parse_positive_u64)]
    pub count: Option<PositiveU64>,

    /// Maximum suite executions in flight
    #[arg(long, short = 'c', value_parser = parse_positive_usize)]
    pub concurrency: Option<PositiveUsize>,
}

#[derive(Debug, Args, Clone)]
pub struct TimedArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Run length in minutes (fractions allowed)
    #[arg(long = "duration-minutes", short = 'd', value_parser = parse_minutes)]
    pub duration_minutes: Option<f64>,

    /// Requests fired per second
    #[arg(long, short = 'r', value_parser = parse_rate)]
    pub rate: Option<f64>,
}

#[derive(Debug, Args, Clone)]
pub struct SingleArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Only run the request with this name
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SuggestArgs {
    #[command(flatten)]
    pub suite: SuiteArgs,

    /// Request to sample
    #[arg(long)]
    pub name: String,
}
