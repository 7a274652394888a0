//! Command-line argument definitions for the Statecraft CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand selects the pipeline stage to run; the
//! configuration file and logging verbosity apply to all of them.

use clap::{Parser, Subcommand};

use statecraft::semantic::LayoutPolicy;

/// Command-line arguments for the Statecraft state-machine tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Pipeline stage to run.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a document and report its diagnostics
    Check {
        /// Path to the input SCXML file
        input: String,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute positions for states that have none
    Layout {
        /// Path to the input SCXML file
        input: String,

        /// Leaf packing policy (grid, tiered); overrides the configuration
        #[arg(long)]
        policy: Option<LayoutPolicy>,

        /// Write the positions back into the input file instead of
        /// printing the computed geometry as JSON
        #[arg(long)]
        write: bool,
    },

    /// Write the document with canonical or stripped visual metadata
    Export {
        /// Path to the input SCXML file
        input: String,

        /// Path to the output file; standard output if omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Remove every visual attribute
        #[arg(long)]
        clean: bool,
    },
}

impl Command {
    /// The input file of the command.
    pub fn input(&self) -> &str {
        match self {
            Self::Check { input, .. } | Self::Layout { input, .. } | Self::Export { input, .. } => {
                input
            }
        }
    }
}
