//! CLI argument parsing

use crate::config::DEFAULT_CONFIG_FILE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Generate API reference pages from Python codebases
#[derive(Parser, Debug)]
#[command(name = "docsmith")]
#[command(about = "Generate API reference pages from Python codebases")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load, process and render the configured page tree
    Build {
        /// Config file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Search location (can be repeated, replaces the configured ones)
        #[arg(short = 'I', long = "search-path")]
        search_path: Vec<PathBuf>,

        /// Fail when a page selects no symbols
        #[arg(long)]
        strict: bool,

        /// Write a JSON handoff manifest to this path
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Validate the configuration and plan the build without writing
    Check {
        /// Config file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Search location (can be repeated, replaces the configured ones)
        #[arg(short = 'I', long = "search-path")]
        search_path: Vec<PathBuf>,

        /// Fail when a page selects no symbols
        #[arg(long)]
        strict: bool,
    },

    /// Print the processed symbol tree as JSON
    Dump {
        /// Config file path
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Search location (can be repeated, replaces the configured ones)
        #[arg(short = 'I', long = "search-path")]
        search_path: Vec<PathBuf>,

        /// Skip the processor chain and print the tree as loaded
        #[arg(long)]
        raw: bool,
    },

    /// Show version information
    Version,
}
