use crate::error::{Error, Result};
use crate::pages::{PageSpec, PageTree};
use crate::render::RenderOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration file looked up when none is given
pub const DEFAULT_CONFIG_FILE: &str = "docsmith.toml";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub loader: LoaderConfig,
    pub processors: Vec<ProcessorSpec>,
    pub renderer: RendererConfig,
    /// Opaque settings for the site assembler, passed through untouched
    pub site: toml::Table,
    /// Directory relative paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Where and what to load
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    pub search_paths: Vec<PathBuf>,
    /// Restrict loading to these top-level modules
    pub packages: Vec<String>,
    /// Globs relative to each search location
    pub exclude: Vec<String>,
}

/// One `[[processors]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub options: toml::Table,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub output_directory: PathBuf,
    /// Fail instead of warning when a page selects nothing
    pub require_nonempty: bool,
    /// Checked against the recognized formatting options
    pub options: toml::Table,
    pub pages: Vec<PageSpec>,
}

impl ProcessorSpec {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            options: toml::Table::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loader: LoaderConfig::default(),
            processors: vec![
                ProcessorSpec::new("filter"),
                ProcessorSpec::new("google"),
                ProcessorSpec::new("crossref"),
            ],
            renderer: RendererConfig::default(),
            site: toml::Table::new(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from(".")],
            packages: vec![],
            exclude: vec![
                "tests/**".to_string(),
                "test/**".to_string(),
                "setup.py".to_string(),
                "conftest.py".to_string(),
            ],
        }
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("build/docs"),
            require_nonempty: false,
            options: toml::Table::new(),
            pages: vec![],
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load config from file, or defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    ///
    /// Paths given on the command line are relative to the working directory.
    pub fn merge_cli(
        &mut self,
        output: Option<PathBuf>,
        search_paths: Vec<PathBuf>,
        require_nonempty: bool,
    ) -> Result<()> {
        if let Some(out) = output {
            self.renderer.output_directory = std::path::absolute(out)?;
        }

        if !search_paths.is_empty() {
            self.loader.search_paths = search_paths
                .into_iter()
                .map(std::path::absolute)
                .collect::<std::io::Result<Vec<_>>>()?;
        }

        if require_nonempty {
            self.renderer.require_nonempty = true;
        }

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.loader.search_paths.is_empty() {
            return Err(Error::configuration("at least one search path required"));
        }

        if self.processors.iter().any(|p| p.kind.is_empty()) {
            return Err(Error::configuration("processor entries need a non-empty type"));
        }

        if self.renderer.output_directory.as_os_str().is_empty() {
            return Err(Error::configuration("output_directory must not be empty"));
        }

        self.render_options()?;
        self.page_tree()?;

        Ok(())
    }

    /// Resolve a configured path against the config file's directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Loader settings with resolved search paths
    pub fn loader_config(&self) -> LoaderConfig {
        LoaderConfig {
            search_paths: self.loader.search_paths.iter().map(|p| self.resolve_path(p)).collect(),
            ..self.loader.clone()
        }
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.renderer.output_directory)
    }

    pub fn render_options(&self) -> Result<RenderOptions> {
        RenderOptions::from_table(&self.renderer.options)
    }

    /// Validated page tree; a single page listing everything when none is configured
    pub fn page_tree(&self) -> Result<PageTree> {
        if self.renderer.pages.is_empty() {
            PageTree::from_specs(&PageTree::default_specs(), &self.base_dir)
        } else {
            PageTree::from_specs(&self.renderer.pages, &self.base_dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.loader.search_paths, vec![PathBuf::from(".")]);
        let kinds: Vec<&str> = config.processors.iter().map(|p| p.kind.as_str()).collect();
        assert_eq!(kinds, vec!["filter", "google", "crossref"]);
        assert!(!config.renderer.require_nonempty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[loader]
search_paths = ["src"]
packages = ["yfs"]

[[processors]]
type = "filter"
documented_only = true

[[processors]]
type = "google"

[renderer]
output_directory = "site/api"
require_nonempty = true

[renderer.options]
render_toc = true

[[renderer.pages]]
title = "Summary"
contents = ["yfs.summary.*"]

[site]
theme = "material"
nav = ["Home", "API"]
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        let base = file.path().parent().unwrap();
        assert_eq!(config.base_dir, base.to_path_buf());
        assert_eq!(config.loader_config().search_paths, vec![base.join("src")]);
        assert_eq!(config.loader.packages, vec!["yfs".to_string()]);
        assert_eq!(config.processors.len(), 2);
        assert_eq!(config.processors[0].options["documented_only"], toml::Value::Boolean(true));
        assert_eq!(config.output_dir(), base.join("site/api"));
        assert!(config.renderer.require_nonempty);
        assert!(config.render_options().unwrap().render_toc);
        assert_eq!(config.site["theme"].as_str(), Some("material"));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/docsmith.toml")).unwrap();
        assert_eq!(config.processors.len(), 3);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: std::result::Result<Config, _> = toml::from_str("[analysis]\nmax_depth = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_renderer_option() {
        let mut config = Config::default();
        config.renderer.options.insert("colour".to_string(), toml::Value::Boolean(true));
        assert!(config.validate().unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_invalid_pages() {
        let mut config = Config::default();
        config.renderer.pages = vec![PageSpec::selector("API", &["a.*"]), PageSpec::selector("api", &["b.*"])];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_search_paths() {
        let mut config = Config::default();
        config.loader.search_paths.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_page_tree() {
        let config = Config::default();
        let tree = config.page_tree().unwrap();
        assert_eq!(tree.leaves()[0].path, PathBuf::from("api.md"));
    }

    #[test]
    fn test_merge_cli() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config
            .merge_cli(Some(dir.path().join("out")), vec![dir.path().to_path_buf()], true)
            .unwrap();
        assert_eq!(config.output_dir(), dir.path().join("out"));
        assert_eq!(config.loader_config().search_paths, vec![dir.path().to_path_buf()]);
        assert!(config.renderer.require_nonempty);
    }

    #[test]
    fn test_merge_cli_keeps_config() {
        let mut config = Config::default();
        config.merge_cli(None, vec![], false).unwrap();
        assert_eq!(config.renderer.output_directory, PathBuf::from("build/docs"));
        assert_eq!(config.loader.search_paths, vec![PathBuf::from(".")]);
    }

    #[test]
    fn test_processor_spec_roundtrip_options() {
        let spec: ProcessorSpec = toml::from_str("type = \"filter\"\ninclude = [\"_private\"]\n").unwrap();
        assert_eq!(spec.kind, "filter");
        assert!(spec.options.contains_key("include"));
        assert!(!spec.options.contains_key("type"));
    }
}
