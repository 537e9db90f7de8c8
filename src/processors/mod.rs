// Processor chain: ordered transformations over the symbol tree

pub mod crossref;
pub mod docstring;
pub mod filter;

pub use crossref::CrossRefProcessor;
pub use docstring::GoogleProcessor;
pub use filter::{FilterOptions, FilterProcessor};

use crate::config::ProcessorSpec;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::model::SymbolTree;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// One stage of the chain
///
/// A processor mutates the tree in place and must leave it structurally
/// valid. Non-fatal findings go into `diagnostics`.
pub trait Processor: Send + Sync {
    /// Identifier used in configuration
    fn name(&self) -> &str;

    /// Identifiers of processors that may only appear before this one
    fn must_follow(&self) -> &[&str] {
        &[]
    }

    fn process(&self, tree: &mut SymbolTree, diagnostics: &mut Diagnostics) -> Result<()>;
}

/// Builds a processor from its configuration options
pub type ProcessorFactory = fn(&toml::Table) -> Result<Box<dyn Processor>>;

/// Registry of processor identifiers
pub struct ProcessorRegistry {
    factories: HashMap<String, ProcessorFactory>,
}

impl ProcessorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a factory, replacing any previous one with the same name
    pub fn register(&mut self, name: &str, factory: ProcessorFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn has(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered identifiers, sorted
    pub fn list_processors(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }

    /// Instantiate a processor
    pub fn create(&self, name: &str, options: &toml::Table) -> Result<Box<dyn Processor>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            Error::configuration(format!(
                "unknown processor '{}' (available: {})",
                name,
                self.list_processors().join(", ")
            ))
        })?;
        factory(options)
    }

    /// Registry with the built-in processors
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(filter::NAME, |options| Ok(Box::new(FilterProcessor::from_options(options)?)));
        registry.register(docstring::NAME, |options| Ok(Box::new(GoogleProcessor::from_options(options)?)));
        registry.register(crossref::NAME, |options| Ok(Box::new(CrossRefProcessor::from_options(options)?)));
        registry
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Deserialize processor options, rejecting unknown keys
pub(crate) fn parse_options<T: DeserializeOwned>(processor: &str, options: &toml::Table) -> Result<T> {
    toml::Value::Table(options.clone())
        .try_into()
        .map_err(|e| Error::configuration(format!("invalid options for processor '{}': {}", processor, e)))
}

/// Ordered list of processors, validated at construction
pub struct ProcessorChain {
    stages: Vec<Box<dyn Processor>>,
}

impl std::fmt::Debug for ProcessorChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessorChain").field("stages", &self.names()).finish()
    }
}

impl ProcessorChain {
    /// Build and validate a chain from configuration
    pub fn from_specs(specs: &[ProcessorSpec], registry: &ProcessorRegistry) -> Result<Self> {
        let stages = specs
            .iter()
            .map(|spec| registry.create(&spec.kind, &spec.options))
            .collect::<Result<Vec<_>>>()?;
        Self::new(stages)
    }

    /// Validate stage ordering
    pub fn new(stages: Vec<Box<dyn Processor>>) -> Result<Self> {
        for (i, stage) in stages.iter().enumerate() {
            for later in &stages[i + 1..] {
                if stage.must_follow().contains(&later.name()) {
                    return Err(Error::configuration(format!(
                        "processor '{}' must run after '{}'",
                        stage.name(),
                        later.name()
                    )));
                }
            }
        }
        Ok(Self { stages })
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order, checking tree invariants after each
    pub fn run(&self, tree: &mut SymbolTree, diagnostics: &mut Diagnostics) -> Result<()> {
        for stage in &self.stages {
            stage.process(tree, diagnostics)?;
            tree.check_invariants()
                .map_err(|message| Error::processor(stage.name(), message))?;
        }
        Ok(())
    }
}
