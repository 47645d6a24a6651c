use crate::codec::{self, EntityCodec};
use crate::config::TemplateConfig;
use crate::diagnostics::{Diagnostic, Diagnostics, LogDiagnostics};
use crate::error::LoadError;
use crate::list::{self, ListBatches, ListItem, ListKind};
use crate::placeholder::{self, ScalarBatch};
use crate::store::MarkupStore;
use crate::value::Value;
use crate::whitespace;
use std::io;
use std::path::Path;

/// A loaded template plus the batches registered against it.
///
/// Registration never touches the markup; [`Template::apply`] runs scalar substitution,
/// then list injection (unordered targets first, then ordered), then the decode pass that
/// restores characters the tree serializer wrote as numeric references.
#[derive(Debug)]
pub struct Template<D: Diagnostics = LogDiagnostics> {
    store: MarkupStore,
    config: TemplateConfig,
    codec: EntityCodec,
    scalar_batches: Vec<ScalarBatch>,
    unordered: ListBatches,
    ordered: ListBatches,
    diagnostics: D,
}

impl Template<LogDiagnostics> {
    /// Loads a template file, enforcing the configured size limit.
    pub fn open(path: impl AsRef<Path>, config: TemplateConfig) -> Result<Self, LoadError> {
        let store = MarkupStore::load(path.as_ref(), config.max_template_kib())?;
        Ok(Self::with_store(store, config))
    }

    pub fn from_markup(markup: impl Into<String>, config: TemplateConfig) -> Self {
        Self::with_store(MarkupStore::new(markup), config)
    }

    fn with_store(store: MarkupStore, config: TemplateConfig) -> Self {
        Self {
            store,
            codec: EntityCodec::new(config.encode_on_insert()),
            config,
            scalar_batches: Vec::new(),
            unordered: ListBatches::new(),
            ordered: ListBatches::new(),
            diagnostics: LogDiagnostics,
        }
    }
}

impl<D: Diagnostics> Template<D> {
    /// Replaces the diagnostics sink.
    pub fn with_diagnostics<E: Diagnostics>(self, diagnostics: E) -> Template<E> {
        Template {
            store: self.store,
            config: self.config,
            codec: self.codec,
            scalar_batches: self.scalar_batches,
            unordered: self.unordered,
            ordered: self.ordered,
            diagnostics,
        }
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diagnostics
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Queues a scalar batch. Empty batches are rejected.
    pub fn register_scalar_batch(&mut self, batch: ScalarBatch) -> bool {
        if batch.is_empty() {
            return false;
        }
        self.scalar_batches.push(self.codec.encode_batch(batch));
        true
    }

    /// Queues a scalar batch given as a loosely typed value; only a non-empty `Map` is
    /// accepted.
    pub fn register_scalar_value(&mut self, value: Value) -> bool {
        match ScalarBatch::from_value(value) {
            Some(batch) => self.register_scalar_batch(batch),
            None => false,
        }
    }

    /// Queues list items for the first `<tag>` element. Each value is converted with
    /// [`ListItem::from_value`]; malformed values are reported and skipped.
    ///
    /// Rejects an empty sequence or a tag name that cannot occur in markup.
    pub fn register_list_batch<I, T>(&mut self, kind: ListKind, tag: &str, items: I) -> bool
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        let values: Vec<Value> = items.into_iter().map(Into::into).collect();
        if values.is_empty() || !list::is_valid_name(tag) {
            return false;
        }
        let items = values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                ListItem::from_value(value, tag, index, &mut self.diagnostics)
            })
            .collect();
        self.store_list_batch(kind, tag, items);
        true
    }

    /// Typed variant of [`Template::register_list_batch`].
    pub fn register_list_items(&mut self, kind: ListKind, tag: &str, items: Vec<ListItem>) -> bool {
        if items.is_empty() || !list::is_valid_name(tag) {
            return false;
        }
        self.store_list_batch(kind, tag, items);
        true
    }

    /// Loosely typed variant: `kind` is a code (`0` ul, `1` ol) or a name, `tag` must be a
    /// string and `items` a non-empty list.
    pub fn register_list_value(&mut self, kind: &Value, tag: &Value, items: Value) -> bool {
        let Some(kind) = ListKind::from_value(kind) else {
            self.diagnostics.report(&Diagnostic::InvalidListKind {
                kind: kind.to_string(),
            });
            return false;
        };
        let Some(tag) = tag.as_str() else {
            return false;
        };
        match items {
            Value::List(values) => self.register_list_batch(kind, tag, values),
            _ => false,
        }
    }

    fn store_list_batch(&mut self, kind: ListKind, tag: &str, items: Vec<ListItem>) {
        let items = items
            .into_iter()
            .map(|item| self.codec.encode_item(item))
            .collect();
        let batches = match kind {
            ListKind::Unordered => &mut self.unordered,
            ListKind::Ordered => &mut self.ordered,
        };
        batches.insert(tag, items);
    }

    /// Applies and drains every pending batch. Never fails; problems are reported to the
    /// diagnostics sink and the affected entries are skipped.
    pub fn apply(&mut self) {
        let replaced = placeholder::apply(
            &mut self.store,
            &mut self.scalar_batches,
            &self.config,
            &mut self.diagnostics,
        );

        let injected = list::apply(
            &mut self.store,
            [
                (ListKind::Unordered, &mut self.unordered),
                (ListKind::Ordered, &mut self.ordered),
            ],
            &mut self.diagnostics,
        );

        let decoded = codec::decode_stray_numeric_entities(self.store.get());
        self.store.set(decoded);
        log::debug!(
            target: "mirage.template",
            "applied: {replaced} placeholder(s), {injected} list(s)"
        );
    }

    /// True while any registered batch has not been applied.
    pub fn has_pending_work(&self) -> bool {
        !self.scalar_batches.is_empty() || !self.unordered.is_empty() || !self.ordered.is_empty()
    }

    pub fn markup(&self) -> &str {
        self.store.get()
    }

    pub fn into_markup(self) -> String {
        self.store.into_string()
    }

    /// Writes the current markup to `out`.
    pub fn render<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        out.write_all(self.store.get().as_bytes())
    }

    /// Compacts the current markup; see [`whitespace::normalize_whitespace`].
    pub fn normalize_whitespace(&mut self) {
        let compact = whitespace::normalize_whitespace(self.store.get());
        self.store.set(compact);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingDiagnostics;
    use indexmap::IndexMap;

    fn template(markup: &str) -> Template<CollectingDiagnostics> {
        Template::from_markup(markup, TemplateConfig::default())
            .with_diagnostics(CollectingDiagnostics::new())
    }

    fn batch<const N: usize>(pairs: [(&str, &str); N]) -> ScalarBatch {
        pairs.into_iter().collect()
    }

    #[test]
    fn registration_rejects_bad_input() {
        let mut t = template("<p></p>");
        assert!(!t.register_scalar_batch(ScalarBatch::new()));
        assert!(!t.register_scalar_value(Value::from("not a map")));
        assert!(!t.register_scalar_value(Value::Map(IndexMap::new())));
        assert!(!t.register_list_batch(ListKind::Ordered, "p", Vec::<Value>::new()));
        assert!(!t.register_list_batch(ListKind::Ordered, "", ["a"]));
        assert!(!t.register_list_value(&Value::from(0), &Value::from(3), Value::from(vec!["a"])));
        assert!(!t.register_list_value(&Value::from(0), &Value::from("p"), Value::from("a")));
        assert!(!t.has_pending_work());
        assert!(t.diagnostics().is_empty());
    }

    #[test]
    fn invalid_list_kind_is_reported() {
        let mut t = template("<p></p>");
        assert!(!t.register_list_value(&Value::from(7), &Value::from("p"), Value::from(vec!["a"])));
        assert_eq!(t.diagnostics().messages(), &["list kind value is wrong => 7".to_string()]);
    }

    #[test]
    fn scalar_values_are_encoded_by_default() {
        let mut t = template("<h1>[##_t_##]</h1><a title=\"[##_t_##]\"></a>");
        assert!(t.register_scalar_batch(batch([("t", "Tom & \"Jerry\" <3")])));
        assert!(t.has_pending_work());
        t.apply();
        assert!(!t.has_pending_work());
        assert_eq!(
            t.markup(),
            "<h1>Tom &amp; &quot;Jerry&quot; &lt;3</h1><a title=\"Tom &amp; &quot;Jerry&quot; &lt;3\"></a>"
        );
    }

    #[test]
    fn encoding_can_be_disabled() {
        let config = TemplateConfig::default().with_encode_on_insert(false);
        let mut t = Template::from_markup("<div>[##_body_##]</div>", config);
        t.register_scalar_batch(batch([("body", "<b>bold</b>")]));
        t.apply();
        assert_eq!(t.markup(), "<div><b>bold</b></div>");
    }

    #[test]
    fn later_registration_wins() {
        let mut t = template("[##_k_##]");
        t.register_scalar_batch(batch([("k", "old")]));
        t.register_scalar_batch(batch([("k", "new")]));
        t.apply();
        assert_eq!(t.markup(), "new");
    }

    #[test]
    fn custom_delimiters() {
        let config = TemplateConfig::new(true, "{{", "}}");
        let mut t = Template::from_markup("{{name}} [##_name_##]", config);
        t.register_scalar_batch(batch([("name", "x")]));
        t.apply();
        assert_eq!(t.markup(), "x [##_name_##]");
    }

    #[test]
    fn scalars_then_lists_then_decode() {
        let mut t = template(
            "<!DOCTYPE html><html><head><title>[##_title_##]</title></head>\
             <body><menu></menu><steps></steps><p>end</p></body></html>",
        );
        t.register_scalar_batch(batch([("title", "한글 café")]));
        assert!(t.register_list_batch(
            ListKind::Unordered,
            "menu",
            vec![
                Value::map([("innerHTML", "Home"), ("id", "home")]),
                Value::from("About <us>"),
            ],
        ));
        assert!(t.register_list_batch(ListKind::Ordered, "steps", ["one", "二"]));
        t.apply();
        assert_eq!(
            t.markup(),
            "<!DOCTYPE html><html><head><title>한글 café</title></head>\
             <body><ul><li id=\"home\">Home</li><li>About &lt;us&gt;</li></ul>\
             <ol><li>one</li><li>二</li></ol><p>end</p></body></html>"
        );
        assert!(!t.has_pending_work());
        assert!(t.diagnostics().is_empty());
    }

    #[test]
    fn missing_list_target_is_non_fatal() {
        let markup = "<div>[##_a_##]</div>";
        let mut t = template(markup);
        t.register_list_batch(ListKind::Ordered, "nowhere", ["x"]);
        t.apply();
        assert_eq!(t.markup(), markup);
        assert_eq!(t.diagnostics().messages(), &["can't find tag => nowhere".to_string()]);
        assert!(!t.has_pending_work());
    }

    #[test]
    fn reregistering_a_tag_replaces_its_items() {
        let mut t = template("<nav></nav>");
        t.register_list_batch(ListKind::Unordered, "nav", ["a"]);
        t.register_list_batch(ListKind::Unordered, "nav", ["b"]);
        t.apply();
        assert_eq!(t.markup(), "<ul><li>b</li></ul>");
    }

    #[test]
    fn malformed_items_are_skipped_without_dropping_later_ones() {
        let mut t = template("<nav></nav>");
        t.register_list_batch(
            ListKind::Unordered,
            "nav",
            vec![
                Value::from("a"),
                Value::from(5),
                Value::map([("id", "no-content")]),
                Value::from("b"),
            ],
        );
        t.apply();
        assert_eq!(t.markup(), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(t.diagnostics().len(), 2);
    }

    #[test]
    fn apply_is_idempotent_once_drained() {
        let mut t = template("<x></x><p>[##_v_##]</p>");
        t.register_scalar_batch(batch([("v", "é")]));
        t.register_list_batch(ListKind::Ordered, "x", ["ü"]);
        t.apply();
        let first = t.markup().to_string();
        t.apply();
        assert_eq!(t.markup(), first);
        assert_eq!(first, "<ol><li>ü</li></ol><p>é</p>");
    }

    #[test]
    fn diagnostics_can_be_cleared_between_renders() {
        let mut t = template("<p>[##_n_##]</p>");
        t.register_scalar_batch([("n", Value::from(1))].into_iter().collect());
        t.apply();
        assert_eq!(t.diagnostics().len(), 1);
        t.diagnostics_mut().clear();
        assert!(t.diagnostics().is_empty());

        t.register_list_batch(ListKind::Ordered, "nowhere", ["x"]);
        t.apply();
        assert_eq!(t.diagnostics().messages(), &["can't find tag => nowhere".to_string()]);
    }

    #[test]
    fn unclosed_paragraphs_end_before_the_generated_list() {
        let mut t = template("<p>one<p>two<menu></menu>");
        t.register_list_batch(ListKind::Unordered, "menu", ["a"]);
        t.apply();
        assert_eq!(t.markup(), "<p>one</p><p>two</p><ul><li>a</li></ul>");
    }

    #[test]
    fn render_writes_the_markup() {
        let mut t = template("<p>\n  [##_a_##]\n</p>\n<!-- note -->");
        t.register_scalar_batch(batch([("a", "hi")]));
        t.apply();
        t.normalize_whitespace();
        let mut out = Vec::new();
        t.render(&mut out).expect("write to vec");
        assert_eq!(String::from_utf8(out).expect("utf8"), "<p> hi</p>");
    }

    #[test]
    fn open_reads_files_and_enforces_the_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<b>[##_x_##]</b>").expect("write");
        let t = Template::open(&path, TemplateConfig::default()).expect("opens");
        assert_eq!(t.markup(), "<b>[##_x_##]</b>");

        let small = TemplateConfig::default().with_max_template_kib(1);
        std::fs::write(&path, "x".repeat(2048)).expect("write");
        assert!(matches!(
            Template::open(&path, small),
            Err(LoadError::TooLarge { .. })
        ));
        assert!(matches!(
            Template::open(dir.path().join("missing.html"), TemplateConfig::default()),
            Err(LoadError::NotFound { .. })
        ));
    }
}
