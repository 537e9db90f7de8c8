// Module discovery and symbol tree construction

pub mod python;

pub use python::PythonInspector;

use crate::config::LoaderConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::{Error, Result};
use crate::model::{Symbol, SymbolTree};
use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names that are never descended into
const DEFAULT_EXCLUDES: &[&str] = &["__pycache__", "venv", "node_modules", "site-packages"];

/// A module found on disk, before inspection
#[derive(Debug, Clone, PartialEq)]
struct ModuleEntry {
    name: String,
    path: PathBuf,
    is_package: bool,
}

/// Builds a symbol tree from Python search locations
pub struct Loader {
    search_paths: Vec<PathBuf>,
    packages: Vec<String>,
    exclude: Vec<Pattern>,
    verbose: bool,
}

impl Loader {
    /// Create a loader; `search_paths` must already be resolved
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let exclude = config
            .exclude
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| Error::configuration(format!("invalid exclude pattern '{}': {}", p, e))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            search_paths: config.search_paths.clone(),
            packages: config.packages.clone(),
            exclude,
            verbose: false,
        })
    }

    /// Show a spinner while inspecting files
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Load every module reachable from the search locations
    pub fn load(&self, diagnostics: &mut Diagnostics) -> Result<SymbolTree> {
        let progress = self.progress();

        let per_location = self
            .search_paths
            .par_iter()
            .map(|location| self.load_location(location, progress.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        let mut modules = Vec::new();
        let mut providers: HashMap<String, PathBuf> = HashMap::new();

        for (location, found) in self.search_paths.iter().zip(per_location) {
            for module in found {
                if let Some(first) = providers.get(&module.qualified_name) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::ShadowedModule,
                            format!(
                                "'{}' in {} is shadowed by {}",
                                module.qualified_name,
                                location.display(),
                                first.display()
                            ),
                        )
                        .for_symbol(&module.qualified_name, &module.location),
                    );
                    continue;
                }
                providers.insert(module.qualified_name.clone(), location.clone());
                modules.push(module);
            }
        }

        for package in &self.packages {
            if !providers.contains_key(package) {
                return Err(Error::load(
                    package,
                    "package not found in any search location",
                ));
            }
        }

        Ok(SymbolTree::new(modules))
    }

    fn progress(&self) -> Option<ProgressBar> {
        if !self.verbose {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} loading {msg}") {
            pb.set_style(style);
        }
        Some(pb)
    }

    /// Load the top-level modules of one search location
    fn load_location(&self, location: &Path, progress: Option<&ProgressBar>) -> Result<Vec<Symbol>> {
        if !location.exists() {
            return Err(Error::LocationNotFound(location.to_path_buf()));
        }

        let mut inspector = PythonInspector::new()?;

        let entries = if location.is_file() {
            let name = module_name(location)
                .ok_or_else(|| Error::load(location, "not an importable Python module"))?;
            vec![ModuleEntry {
                name,
                path: location.to_path_buf(),
                is_package: false,
            }]
        } else {
            self.discover(location, location)?
        };

        entries
            .into_iter()
            .filter(|entry| self.packages.is_empty() || self.packages.contains(&entry.name))
            .map(|entry| self.load_entry(&mut inspector, location, &entry, &entry.name, progress))
            .collect()
    }

    /// Inspect a module or package, recursing into subpackages
    fn load_entry(
        &self,
        inspector: &mut PythonInspector,
        root: &Path,
        entry: &ModuleEntry,
        qualified_name: &str,
        progress: Option<&ProgressBar>,
    ) -> Result<Symbol> {
        let file = if entry.is_package {
            entry.path.join("__init__.py")
        } else {
            entry.path.clone()
        };

        if let Some(pb) = progress {
            pb.set_message(qualified_name.to_string());
            pb.tick();
        }

        let mut module = inspector.inspect_file(&file, qualified_name)?;

        if entry.is_package {
            for sub in self.discover(&entry.path, root)? {
                let sub_name = format!("{}.{}", qualified_name, sub.name);
                let child = self.load_entry(inspector, root, &sub, &sub_name, progress)?;
                python::push_member(&mut module.children, child);
            }
        }

        Ok(module)
    }

    /// List the modules and packages directly inside `dir`, sorted by file name
    fn discover(&self, dir: &Path, root: &Path) -> Result<Vec<ModuleEntry>> {
        let mut entries = Vec::new();

        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();

            if self.should_exclude(path, root, entry.file_type().is_dir()) {
                continue;
            }

            if entry.file_type().is_dir() {
                if !path.join("__init__.py").is_file() {
                    continue;
                }
                if let Some(name) = path.file_name().and_then(|n| n.to_str()).filter(|n| is_identifier(n)) {
                    entries.push(ModuleEntry {
                        name: name.to_string(),
                        path: path.to_path_buf(),
                        is_package: true,
                    });
                }
            } else if let Some(name) = module_name(path) {
                if name != "__init__" {
                    entries.push(ModuleEntry {
                        name,
                        path: path.to_path_buf(),
                        is_package: false,
                    });
                }
            }
        }

        Ok(entries)
    }

    /// Check if a path should be skipped
    fn should_exclude(&self, path: &Path, root: &Path, is_dir: bool) -> bool {
        let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        if is_dir && (file_name.starts_with('.') || DEFAULT_EXCLUDES.contains(&file_name.as_ref())) {
            return true;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative_str = relative.to_string_lossy().replace('\\', "/");

        self.exclude.iter().any(|pattern| {
            // `tests/**` should also exclude the `tests` directory itself
            pattern.matches(&relative_str) || (is_dir && pattern.matches(&format!("{}/__init__.py", relative_str)))
        })
    }
}

/// Module name of a `.py` file, if it is importable
fn module_name(path: &Path) -> Option<String> {
    if path.extension().map_or(true, |ext| ext != "py") {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    is_identifier(stem).then(|| stem.to_string())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => chars.all(|c| c.is_alphanumeric() || c == '_'),
        _ => false,
    }
}
