//! TOML render fixtures: a template, the batches to register, and the expected output.
//!
//! ```toml
//! format = "mirage-render-v1"
//! template = "<h1>[##_title_##]</h1><menu></menu>"
//! expected = "<h1>Hi</h1><ul><li>a</li></ul>"
//!
//! [[scalars]]
//! title = "Hi"
//!
//! [[lists]]
//! kind = "ul"
//! tag = "menu"
//! items = ["a"]
//! ```
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const RENDER_FIXTURE_FORMAT_V1: &str = "mirage-render-v1";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RenderFixture {
    format: String,
    #[serde(skip)]
    pub path: PathBuf,
    pub template: String,
    pub expected: String,
    #[serde(default)]
    pub expected_warnings: Vec<String>,
    #[serde(default = "default_true")]
    pub encode: bool,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub strip_whitespace: bool,
    /// Registered in file order; each table is one batch.
    #[serde(default)]
    pub scalars: Vec<toml::Table>,
    #[serde(default)]
    pub lists: Vec<FixtureListBatch>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FixtureListBatch {
    /// A list kind name or code, passed through untyped so invalid kinds can be tested.
    pub kind: toml::Value,
    pub tag: String,
    pub items: Vec<toml::Value>,
}

fn default_true() -> bool {
    true
}

impl RenderFixture {
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "<unnamed>".to_string())
    }
}

pub fn load_render_fixture(path: &Path) -> RenderFixture {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read render fixture {path:?}: {err}"));
    let mut fixture: RenderFixture = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse render fixture {path:?}: {err}"));
    assert_eq!(
        fixture.format, RENDER_FIXTURE_FORMAT_V1,
        "unsupported format in {path:?}"
    );
    fixture.path = path.to_path_buf();
    fixture
}

/// Loads every `*.toml` fixture in `dir`, sorted by file name.
pub fn load_render_fixtures(dir: &Path) -> Vec<RenderFixture> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to list render fixtures in {dir:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .map(|entry| {
            entry
                .unwrap_or_else(|err| panic!("failed to read entry in {dir:?}: {err}"))
                .path()
        })
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no render fixtures found in {dir:?}");
    paths.iter().map(|path| load_render_fixture(path)).collect()
}
