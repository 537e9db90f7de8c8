//! CLI module for Docsmith

mod args;

pub use args::{Args, Command};

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::pipeline::Pipeline;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &Path, search_path: Vec<PathBuf>, output: Option<PathBuf>, strict: bool) -> Result<Config> {
    let mut cfg = Config::load_or_default(path)?;
    cfg.merge_cli(output, search_path, strict)?;
    cfg.validate()?;
    Ok(cfg)
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!("\nWarnings ({}):", diagnostics.len());
    for diagnostic in diagnostics.iter() {
        eprintln!("  {}", diagnostic);
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Build {
            config,
            output,
            search_path,
            strict,
            manifest,
            verbose,
        } => {
            let cfg = load_config(&config, search_path, output, strict)?;

            if verbose {
                println!("Config: {}", config.display());
                for path in &cfg.loader_config().search_paths {
                    println!("Search path: {}", path.display());
                }
                println!("Output: {}", cfg.output_dir().display());
                let kinds: Vec<&str> = cfg.processors.iter().map(|p| p.kind.as_str()).collect();
                println!("Processors: {}", kinds.join(", "));
            }

            let mut pipeline = Pipeline::new(cfg)?.with_verbose(verbose);
            if let Some(manifest_path) = &manifest {
                pipeline = pipeline.with_manifest(manifest_path)?;
            }

            println!("Building documentation...");
            let report = pipeline.run()?;

            if verbose {
                for page in &report.render.pages {
                    println!("  {} ({} symbols)", page.path.display(), page.symbols);
                }
            }

            if let Some(manifest_path) = manifest {
                println!("Manifest written to: {}", manifest_path.display());
            }

            println!("{}", report.summary());
            print_diagnostics(&report.diagnostics);
            Ok(())
        }

        Command::Check {
            config,
            search_path,
            strict,
        } => {
            let cfg = load_config(&config, search_path, None, strict)?;
            let report = Pipeline::new(cfg)?.check()?;

            for page in &report.pages {
                println!("  {}", page.display());
            }
            println!(
                "Configuration OK: {} pages, {} symbols, {} warnings",
                report.pages.len(),
                report.symbols,
                report.diagnostics.len()
            );
            print_diagnostics(&report.diagnostics);
            Ok(())
        }

        Command::Dump {
            config,
            search_path,
            raw,
        } => {
            let cfg = load_config(&config, search_path, None, false)?;
            let pipeline = Pipeline::new(cfg)?;

            let mut diagnostics = Diagnostics::new();
            let mut tree = pipeline.load(&mut diagnostics)?;
            if !raw {
                pipeline.process(&mut tree, &mut diagnostics)?;
            }

            println!("{}", serde_json::to_string_pretty(&tree)?);
            print_diagnostics(&diagnostics);
            Ok(())
        }

        Command::Version => {
            println!("docsmith {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
