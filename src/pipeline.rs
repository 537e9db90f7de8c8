// Loader, processor chain and renderer wired together

use crate::config::Config;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::loader::Loader;
use crate::model::SymbolTree;
use crate::pages::PageTree;
use crate::processors::{ProcessorChain, ProcessorRegistry};
use crate::render::{RenderReport, RenderedPage, Renderer};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Outcome of a full build
#[derive(Debug)]
pub struct BuildReport {
    pub render: RenderReport,
    pub diagnostics: Diagnostics,
    /// Symbols left after processing
    pub symbols: usize,
}

impl BuildReport {
    pub fn summary(&self) -> String {
        format!("{}, {} warnings", self.render.summary(), self.diagnostics.len())
    }
}

/// Outcome of a dry run
#[derive(Debug)]
pub struct CheckReport {
    /// Output paths the build would write, relative to the output directory
    pub pages: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
    pub symbols: usize,
}

/// Handoff manifest for the site assembler
#[derive(Debug, Serialize)]
struct Manifest<'a> {
    output_directory: &'a Path,
    pages: &'a [RenderedPage],
    site: &'a toml::Table,
}

/// A fully validated documentation build
pub struct Pipeline {
    config: Config,
    loader: Loader,
    chain: ProcessorChain,
    pages: PageTree,
    renderer: Renderer,
    manifest: Option<PathBuf>,
}

impl Pipeline {
    /// Validate the whole configuration before any work begins
    pub fn new(config: Config) -> Result<Self> {
        Self::with_registry(config, &ProcessorRegistry::with_defaults())
    }

    /// Like [`Pipeline::new`], with processors looked up in `registry`
    pub fn with_registry(config: Config, registry: &ProcessorRegistry) -> Result<Self> {
        config.validate()?;

        let loader = Loader::new(&config.loader_config())?;
        let chain = ProcessorChain::from_specs(&config.processors, registry)?;
        let pages = config.page_tree()?;
        let renderer = Renderer::new(config.render_options()?, config.output_dir())?
            .with_require_nonempty(config.renderer.require_nonempty);

        Ok(Self {
            config,
            loader,
            chain,
            pages,
            renderer,
            manifest: None,
        })
    }

    /// Write a handoff manifest after each build; the path is checked now
    pub fn with_manifest(mut self, path: impl AsRef<Path>) -> Result<Self> {
        self.manifest = Some(self.manifest_target(path.as_ref())?);
        Ok(self)
    }

    /// Show progress while loading and rendering
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.loader = self.loader.with_verbose(verbose);
        self.renderer = self.renderer.with_verbose(verbose);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn chain(&self) -> &ProcessorChain {
        &self.chain
    }

    pub fn load(&self, diagnostics: &mut Diagnostics) -> Result<SymbolTree> {
        self.loader.load(diagnostics)
    }

    pub fn process(&self, tree: &mut SymbolTree, diagnostics: &mut Diagnostics) -> Result<()> {
        self.chain.run(tree, diagnostics)
    }

    /// Load and process, then plan the render without writing
    pub fn check(&self) -> Result<CheckReport> {
        let mut diagnostics = Diagnostics::new();
        let mut tree = self.load(&mut diagnostics)?;
        self.process(&mut tree, &mut diagnostics)?;

        let plan = self.renderer.plan(&self.pages, &tree, &mut diagnostics)?;
        let pages = plan.pages.iter().map(|p| p.path.clone()).collect();

        Ok(CheckReport {
            pages,
            diagnostics,
            symbols: tree.len(),
        })
    }

    /// Load, process and render
    pub fn run(&self) -> Result<BuildReport> {
        let mut diagnostics = Diagnostics::new();
        let mut tree = self.load(&mut diagnostics)?;
        self.process(&mut tree, &mut diagnostics)?;
        let render = self.renderer.render(&self.pages, &tree, &mut diagnostics)?;

        let report = BuildReport {
            render,
            diagnostics,
            symbols: tree.len(),
        };
        if let Some(path) = &self.manifest {
            self.write_manifest(&report, path)?;
        }
        Ok(report)
    }

    /// Absolute manifest path; it must live outside the output directory
    fn manifest_target(&self, path: &Path) -> Result<PathBuf> {
        let target = std::path::absolute(path)?;
        let output_dir = std::path::absolute(self.renderer.output_dir())?;
        if target.starts_with(&output_dir) {
            return Err(Error::configuration(format!(
                "manifest '{}' must not be inside the output directory",
                path.display()
            )));
        }
        Ok(target)
    }

    /// Write the JSON handoff manifest
    pub fn write_manifest(&self, report: &BuildReport, path: &Path) -> Result<()> {
        let target = self.manifest_target(path)?;
        let output_dir = std::path::absolute(self.renderer.output_dir())?;

        let manifest = Manifest {
            output_directory: &output_dir,
            pages: &report.render.pages,
            site: &self.config.site,
        };

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, serde_json::to_string_pretty(&manifest)?)?;
        Ok(())
    }
}
