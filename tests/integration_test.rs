// Integration tests for Docsmith

use assert_cmd::Command;
use docsmith::{Config, DiagnosticKind, Error, Pipeline, SymbolKind};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// Fixture config with output redirected into a scratch directory
fn yfs_config(out: &Path) -> Config {
    let mut config = Config::load(&fixtures_path("yfs_project/docsmith.toml")).expect("Failed to load config");
    config.merge_cli(Some(out.to_path_buf()), vec![], false).unwrap();
    config
}

fn build_yfs(out: &Path) -> docsmith::BuildReport {
    Pipeline::new(yfs_config(out))
        .expect("Failed to create pipeline")
        .run()
        .expect("Build failed")
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_yfs_package() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(yfs_config(dir.path())).unwrap();
    let mut diagnostics = docsmith::Diagnostics::new();
    let tree = pipeline.load(&mut diagnostics).unwrap();

    assert_eq!(tree.modules.len(), 1);
    let yfs = &tree.modules[0];
    assert_eq!(yfs.qualified_name, "yfs");

    // Package members first, then submodules in file-name order
    let children: Vec<&str> = yfs.children.iter().map(|c| c.qualified_name.as_str()).collect();
    assert_eq!(
        children,
        vec!["yfs.__version__", "yfs.asset_types", "yfs.quote", "yfs.summary"]
    );

    let func = tree.find("yfs.summary.get_summary_page").unwrap();
    let signature = func.signature().unwrap();
    assert_eq!(signature.parameters.len(), 4);
    assert_eq!(signature.return_annotation.as_deref(), Some("Optional[SummaryPage]"));

    let class = tree.find("yfs.asset_types.AssetTypes").unwrap();
    match &class.kind {
        SymbolKind::Class { bases } => assert_eq!(bases, &vec!["str".to_string(), "Enum".to_string()]),
        other => panic!("Expected class, got {:?}", other),
    }

    let attr = tree.find("yfs.asset_types.VALID_ASSET_TYPES").unwrap();
    assert_eq!(attr.docstring.as_ref().and_then(|d| d.raw()), Some("Every value of `AssetTypes`."));
}

#[test]
fn test_process_yfs_package() {
    let dir = TempDir::new().unwrap();
    let pipeline = Pipeline::new(yfs_config(dir.path())).unwrap();
    let mut diagnostics = docsmith::Diagnostics::new();
    let mut tree = pipeline.load(&mut diagnostics).unwrap();
    pipeline.process(&mut tree, &mut diagnostics).unwrap();

    assert!(!tree.contains("yfs.summary._download_summary_pages_without_threads"));
    assert!(!tree.contains("yfs.summary.SummaryPage.__lt__"));
    assert!(!tree.contains("yfs.__version__"));
    assert!(tree.contains("yfs.summary.SummaryPageGroup.symbols"));

    let func = tree.find("yfs.summary.get_summary_page").unwrap();
    let doc = func.docstring.as_ref().and_then(|d| d.structured()).unwrap();
    assert_eq!(doc.summary, "Get summary page data.");
    let titles: Vec<&str> = doc.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Args", "Returns", "Raises"]);
    assert_eq!(doc.sections[0].entries().len(), 4);
    assert_eq!(doc.sections[0].entries()[3].name.as_deref(), Some("**kwargs"));

    let targets: Vec<&str> = func.references.iter().filter_map(|r| r.target()).collect();
    assert!(targets.contains(&"yfs.summary.SummaryPage"));
    assert!(targets.contains(&"yfs.summary.SummaryPageNotFound"));
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_build_yfs_tree() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    let report = build_yfs(&out);

    let paths: Vec<PathBuf> = report.render.pages.iter().map(|p| p.path.clone()).collect();
    assert_eq!(
        paths,
        vec![
            PathBuf::from("index.md"),
            PathBuf::from("api/summary.md"),
            PathBuf::from("api/asset-types.md"),
            PathBuf::from("api/quote.md"),
        ]
    );
    for path in &paths {
        assert!(out.join(path).is_file(), "Missing {}", path.display());
    }

    let readme = fs::read(fixtures_path("yfs_project/README.md")).unwrap();
    assert_eq!(fs::read(out.join("index.md")).unwrap(), readme);
}

#[test]
fn test_summary_page_content() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    build_yfs(&out);

    let page = fs::read_to_string(out.join("api/summary.md")).unwrap();

    assert!(page.starts_with("* [yfs.summary](#yfs.summary)\n  * [SummaryPage Objects](#yfs.summary.SummaryPage)\n"));
    assert!(page.contains("<a id=\"yfs.summary.get_summary_page\"></a>\n\n#### get\\_summary\\_page\n"));
    assert!(page.contains(
        "```python\ndef get_summary_page(symbol: str, use_fuzzy_search: bool = True, page_not_found_ok: bool = False, **kwargs) -> Optional[SummaryPage]\n```"
    ));
    assert!(page.contains("**Arguments**:\n\n- `symbol` _str_ - Ticker symbol\n"));
    assert!(page.contains("- _[SummaryPage](#yfs.summary.SummaryPage)_ - When data is found."));
    assert!(page.contains("**Raises**:\n\n- _[SummaryPageNotFound](#yfs.summary.SummaryPageNotFound)_ - When a page"));
    assert!(page.contains("- `quote` _[Quote](quote.md#yfs.quote.Quote)_ - "));
    assert!(page.contains("#### SummaryPageGroup.append"));
    assert!(page.contains("```python\n@property\ndef symbols(self: \"SummaryPageGroup\") -> List[str]\n```"));
    assert!(!page.contains("_download_summary_pages_without_threads"));
    assert!(!page.contains("__lt__"));
    assert!(page.ends_with('\n') && !page.ends_with("\n\n"));
}

#[test]
fn test_asset_types_page_content() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    build_yfs(&out);

    let page = fs::read_to_string(out.join("api/asset-types.md")).unwrap();
    assert!(page.contains("## AssetTypes Objects"));
    assert!(page.contains("```python\nclass AssetTypes(str, Enum)\n```"));
    assert!(page.contains("#### VALID\\_ASSET\\_TYPES"));
    assert!(page.contains("Every value of [`AssetTypes`](#yfs.asset_types.AssetTypes)."));
}

#[test]
fn test_build_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let first = build_yfs(&dir.path().join("one"));
    let second = build_yfs(&dir.path().join("two"));

    assert_eq!(first.render.pages, second.render.pages);
    for page in &first.render.pages {
        assert_eq!(
            fs::read(dir.path().join("one").join(&page.path)).unwrap(),
            fs::read(dir.path().join("two").join(&page.path)).unwrap()
        );
    }
}

#[test]
fn test_documented_only_filter() {
    let dir = TempDir::new().unwrap();
    let mut config = yfs_config(dir.path());
    config.processors[0]
        .options
        .insert("documented_only".to_string(), toml::Value::Boolean(true));

    let report = Pipeline::new(config).unwrap().run().unwrap();
    let page = fs::read_to_string(dir.path().join("api/summary.md")).unwrap();
    assert!(!page.contains("yfs.summary.SummaryPage.open"));
    assert!(page.contains("yfs.summary.SummaryPage\""));
    assert!(report.diagnostics.of_kind(DiagnosticKind::EmptyFilterResult).next().is_none());
}

#[test]
fn test_empty_selector_diagnostic() {
    let dir = TempDir::new().unwrap();
    let mut config = yfs_config(dir.path());
    config.renderer.pages = vec![docsmith::PageSpec::selector("Lookup", &["yfs.lookup.*"])];

    let report = Pipeline::new(config.clone()).unwrap().run().unwrap();
    assert_eq!(report.diagnostics.of_kind(DiagnosticKind::EmptySelector).count(), 1);

    config.renderer.require_nonempty = true;
    let err = Pipeline::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, Error::Render(_)));
}

#[test]
fn test_syntax_error_is_fatal() {
    let config = Config::load(&fixtures_path("broken_project/docsmith.toml")).unwrap();
    let err = Pipeline::new(config).unwrap().run().unwrap_err();
    assert!(err.is_load_error());
    assert!(err.to_string().contains("bad.py"));
    assert!(err.to_string().contains("syntax error"));
}

// ============================================================================
// CLI Tests
// ============================================================================

#[test]
fn test_cli_build() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    let manifest = dir.path().join("manifest.json");

    Command::cargo_bin("docsmith")
        .unwrap()
        .arg("build")
        .arg("--config")
        .arg(fixtures_path("yfs_project/docsmith.toml"))
        .arg("--output")
        .arg(&out)
        .arg("--manifest")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rendered 4 pages"));

    assert!(out.join("api/summary.md").is_file());

    let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
    assert_eq!(manifest["site"]["site_name"], "yfs");
    assert_eq!(manifest["pages"].as_array().unwrap().len(), 4);
    assert_eq!(manifest["pages"][1]["titles"][0], "API Documentation");
}

#[test]
fn test_cli_manifest_inside_output_fails_before_writing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");

    Command::cargo_bin("docsmith")
        .unwrap()
        .arg("build")
        .arg("--config")
        .arg(fixtures_path("yfs_project/docsmith.toml"))
        .arg("--output")
        .arg(&out)
        .arg("--manifest")
        .arg(out.join("manifest.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be inside the output directory"));

    assert!(!out.exists());
}

#[test]
fn test_cli_check() {
    Command::cargo_bin("docsmith")
        .unwrap()
        .args(["check", "--config"])
        .arg(fixtures_path("yfs_project/docsmith.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK: 4 pages"));

    assert!(!fixtures_path("yfs_project/build").exists());
}

#[test]
fn test_cli_dump_raw() {
    Command::cargo_bin("docsmith")
        .unwrap()
        .args(["dump", "--raw", "--config"])
        .arg(fixtures_path("yfs_project/docsmith.toml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"qualified_name\": \"yfs.summary._download_summary_pages_without_threads\""));
}

#[test]
fn test_cli_syntax_error() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("docsmith")
        .unwrap()
        .args(["build", "--config"])
        .arg(fixtures_path("broken_project/docsmith.toml"))
        .arg("--output")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn test_cli_unknown_processor() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("docsmith.toml");
    fs::write(&config, "[[processors]]\ntype = \"numpydoc\"\n").unwrap();

    Command::cargo_bin("docsmith")
        .unwrap()
        .args(["check", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown processor 'numpydoc'"));
}

#[test]
fn test_cli_strict_empty_selector() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("docsmith.toml");
    fs::write(
        &config,
        "[[renderer.pages]]\ntitle = \"Nothing\"\ncontents = [\"nope.*\"]\n",
    )
    .unwrap();

    Command::cargo_bin("docsmith")
        .unwrap()
        .args(["build", "--strict", "--config"])
        .arg(&config)
        .arg("-I")
        .arg(fixtures_path("yfs_project/src"))
        .arg("--output")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("matches no symbols"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("docsmith")
        .unwrap()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("docsmith"));
}
