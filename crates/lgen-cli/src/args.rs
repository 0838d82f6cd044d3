//! Command-line argument definitions for the lgen CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the input file, the template and the
//! operation to run on it, the scope data, and logging verbosity.

use clap::Parser;

/// Command-line arguments for the lgen template tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input .lg file
    #[arg(help = "Path to the input .lg file")]
    pub input: String,

    /// Name of the template to operate on
    #[arg(short, long)]
    pub template: String,

    /// Scope bindings as a JSON object
    #[arg(short, long)]
    pub data: Option<String>,

    /// Enumerate every output the template can produce
    #[arg(long, conflicts_with = "analyze")]
    pub expand: bool,

    /// Report the free variables and template references instead of
    /// evaluating
    #[arg(long)]
    pub analyze: bool,

    /// Template call recursion limit
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}
