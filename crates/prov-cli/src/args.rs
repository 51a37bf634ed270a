use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use prov_binder::BinderOptions;
use prov_resolver::{RecursionProfile, ResolverOptions};

/// CLI arguments for the prov binary.
#[derive(Parser, Debug)]
#[command(
    name = "prov",
    version,
    about = "Trace where the value of an expression could have come from"
)]
pub struct CliArgs {
    /// Source file to analyze.
    pub file: PathBuf,

    /// Line of the expression (1-based).
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub line: u32,

    /// Column of the expression (1-based, in characters).
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub column: u32,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Recursion budget preset.
    #[arg(long, value_enum, default_value_t = ProfileArg::Resolve)]
    pub profile: ProfileArg,

    /// Override the maximum number of simultaneously open expansions.
    #[arg(long = "max-depth")]
    pub max_depth: Option<u32>,

    /// Override the maximum number of expansions per resolution.
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<u32>,

    /// Also index writes made from outside a member's declaring type.
    #[arg(long = "external-writes")]
    pub external_writes: bool,

    /// Disable colored text output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    Resolve,
    Shallow,
}

impl CliArgs {
    /// Resolver options from `--profile`, with any explicit limits applied on
    /// top of the preset.
    pub fn resolver_options(&self) -> ResolverOptions {
        let preset = match self.profile {
            ProfileArg::Resolve => RecursionProfile::Resolve,
            ProfileArg::Shallow => RecursionProfile::Shallow,
        };
        let profile = if self.max_depth.is_none() && self.max_iterations.is_none() {
            preset
        } else {
            RecursionProfile::Custom {
                max_depth: self.max_depth.unwrap_or(preset.max_depth()),
                max_iterations: self.max_iterations.unwrap_or(preset.max_iterations()),
            }
        };
        ResolverOptions { profile }
    }

    pub fn binder_options(&self) -> BinderOptions {
        BinderOptions {
            index_external_writes: self.external_writes,
        }
    }
}
