//! The `prov` developer binary: parse a source file, bind it and print where
//! the value of the expression at a given line and column could come from.

pub mod args;
pub mod driver;
pub mod tracing_config;

pub use args::{CliArgs, OutputFormat, ProfileArg};
pub use driver::{Outcome, run};
