//! Command-line interface.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::{OutputFormat, format_error, format_summary};
pub use parser::Cli;
