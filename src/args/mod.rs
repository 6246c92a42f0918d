//! CLI argument types and parsing helpers.
mod cli;
mod parsers;
mod types;


pub use cli::{CliArgs, Command, FixedArgs, SingleArgs, SuggestArgs, SuiteArgs, TimedArgs};
pub use types::{HttpMethod, PositiveU64, PositiveUsize};
