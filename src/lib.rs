//! Docsmith - Generate API reference pages from Python codebases
//!
//! Loads a Python source tree into a symbol model, runs it through a
//! configurable processor chain and renders a declarative page tree
//! into a directory of Markdown files.

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod loader;
pub mod model;
pub mod pages;
pub mod pipeline;
pub mod processors;
pub mod render;

// Re-export main types
pub use config::{Config, LoaderConfig, ProcessorSpec, RendererConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::{Error, Result};
pub use loader::Loader;
pub use model::{Docstring, StructuredDocstring, Symbol, SymbolKind, SymbolTree};
pub use pages::{PageSpec, PageTree, Selector};
pub use pipeline::{BuildReport, CheckReport, Pipeline};
pub use processors::{Processor, ProcessorChain, ProcessorRegistry};
pub use render::{RenderOptions, RenderReport, Renderer};
