//! The TOML data file the CLI feeds into a template.
//!
//! ```toml
//! [[items]]
//! title = "Hello"
//!
//! [[lists]]
//! kind = "ul"            # or "ol", 0, 1
//! tag = "nav_links"
//! items = ["plain", { innerHTML = "<a href='/'>home</a>", class = "nav" }]
//! ```
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use template::{Diagnostics, ScalarBatch, Template, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataFile {
    /// Scalar batches, registered in file order (so the last one wins).
    #[serde(default)]
    pub items: Vec<toml::Table>,
    #[serde(default)]
    pub lists: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListEntry {
    pub kind: toml::Value,
    pub tag: String,
    pub items: Vec<toml::Value>,
}

pub fn load(path: &Path) -> Result<DataFile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read data file {}", path.display()))?;
    parse(&content).with_context(|| format!("failed to parse data file {}", path.display()))
}

pub fn parse(content: &str) -> Result<DataFile> {
    Ok(toml::from_str(content)?)
}

impl DataFile {
    /// Registers every batch; returns how many were rejected.
    pub fn register<D: Diagnostics>(self, page: &mut Template<D>) -> usize {
        let mut rejected = 0;
        for (index, table) in self.items.iter().enumerate() {
            let batch: ScalarBatch = table.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect();
            if !page.register_scalar_batch(batch) {
                log::warn!(target: "mirage", "items[{index}] is empty; skipped");
                rejected += 1;
            }
        }
        for (index, list) in self.lists.iter().enumerate() {
            let items = Value::List(list.items.iter().map(Value::from).collect());
            let kind = Value::from(&list.kind);
            if !page.register_list_value(&kind, &Value::from(list.tag.as_str()), items) {
                log::warn!(
                    target: "mirage",
                    "lists[{index}] for <{}> was rejected; skipped",
                    list.tag
                );
                rejected += 1;
            }
        }
        rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use template::{CollectingDiagnostics, TemplateConfig};

    const DATA: &str = r#"
[[items]]
title = "first"

[[items]]
title = "Hello"
year = 2024

[[lists]]
kind = "ul"
tag = "nav"
items = ["plain", { innerHTML = "home", id = "h", tabindex = 1 }]

[[lists]]
kind = 9
tag = "nav"
items = ["x"]

[[lists]]
kind = "ol"
tag = "nav"
items = []
"#;

    #[test]
    fn registers_batches_in_file_order() {
        let data = parse(DATA).expect("data parses");
        let mut page = Template::from_markup(
            "<h1>[##_title_##] [##_year_##]</h1><nav></nav>",
            TemplateConfig::default(),
        )
        .with_diagnostics(CollectingDiagnostics::new());
        assert_eq!(data.register(&mut page), 2);
        page.apply();
        assert_eq!(
            page.markup(),
            "<h1>Hello [##_year_##]</h1><ul><li>plain</li><li id=\"h\" tabindex=\"1\">home</li></ul>"
        );
        assert_eq!(
            page.diagnostics().messages(),
            &[
                "list kind value is wrong => 9".to_string(),
                "item of element 'year' is not string type. type: integer".to_string(),
            ]
        );
    }

    #[test]
    fn unknown_sections_are_errors() {
        assert!(parse("[[bogus]]\na = 1\n").is_err());
        let empty = parse("").expect("empty data parses");
        assert!(empty.items.is_empty() && empty.lists.is_empty());
    }

    #[test]
    fn load_reports_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.toml");
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing.toml"), "{err:#}");
    }
}
