//! Structured list injection: swaps a target element for a freshly built `ul`/`ol`.
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::store::MarkupStore;
use crate::value::Value;
use html::Node;
use indexmap::IndexMap;
use indexmap::map::Entry;
use std::fmt;
use std::str::FromStr;

/// Mapping key that holds an attributed item's inner markup.
pub const CONTENT_KEY: &str = "innerHTML";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    /// Integer codes used by callers that pass kinds as numbers: 0 is `ul`, 1 is `ol`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(ListKind::Unordered),
            1 => Some(ListKind::Ordered),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        name.parse().ok()
    }

    /// Reads a kind from a loosely typed value (code or name).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(code) => Self::from_code(*code),
            Value::Str(name) => Self::from_name(name),
            _ => None,
        }
    }

    pub fn tag_name(self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

impl FromStr for ListKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ul" | "unordered" => Ok(ListKind::Unordered),
            "ol" | "ordered" => Ok(ListKind::Ordered),
            other => Err(format!("unknown list kind {other:?}; expected ul or ol")),
        }
    }
}

/// One entry of a list batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListItem {
    /// Rendered as `<li>text</li>`; the text never becomes markup.
    Text(String),
    /// Rendered as `<li attr="..">content</li>` with `content` parsed as inner markup.
    /// Dropped at render time when `content` is blank.
    Attributed {
        content: String,
        attributes: Vec<(String, String)>,
    },
}

impl ListItem {
    pub fn text(text: impl Into<String>) -> Self {
        ListItem::Text(text.into())
    }

    pub fn attributed<K, V>(
        content: impl Into<String>,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        ListItem::Attributed {
            content: content.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Converts caller data into an item. Strings become `Text`; a map becomes
    /// `Attributed` when it has a string [`CONTENT_KEY`], with its other scalar entries as
    /// attributes. Anything else is reported and yields `None`.
    pub fn from_value(
        value: Value,
        tag: &str,
        index: usize,
        diagnostics: &mut impl Diagnostics,
    ) -> Option<Self> {
        let malformed = |reason: String| Diagnostic::MalformedListItem {
            tag: tag.to_string(),
            index,
            reason,
        };
        match value {
            Value::Str(text) => Some(ListItem::Text(text)),
            Value::Map(entries) => {
                let mut content = None;
                let mut attributes = Vec::new();
                for (key, value) in entries {
                    if key == CONTENT_KEY {
                        match value {
                            Value::Str(s) => content = Some(s),
                            other => {
                                diagnostics.report(&malformed(format!(
                                    "{CONTENT_KEY} is {}, not string",
                                    other.type_name()
                                )));
                                return None;
                            }
                        }
                        continue;
                    }
                    match value.scalar_to_string() {
                        Some(v) => attributes.push((key, v)),
                        None => diagnostics.report(&Diagnostic::InvalidAttribute {
                            tag: tag.to_string(),
                            name: key,
                        }),
                    }
                }
                match content {
                    Some(content) => Some(ListItem::Attributed {
                        content,
                        attributes,
                    }),
                    None => {
                        diagnostics.report(&malformed(format!("missing {CONTENT_KEY}")));
                        None
                    }
                }
            }
            other => {
                diagnostics.report(&malformed(format!(
                    "expected string or map, got {}",
                    other.type_name()
                )));
                None
            }
        }
    }
}

impl From<&str> for ListItem {
    fn from(s: &str) -> Self {
        ListItem::Text(s.to_string())
    }
}

impl From<String> for ListItem {
    fn from(s: String) -> Self {
        ListItem::Text(s)
    }
}

/// Item sequences keyed by target tag name, in registration order.
///
/// Keys are folded to ASCII lowercase, matching element lookup; each entry keeps the tag
/// as first registered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListBatches {
    entries: IndexMap<String, (String, Vec<ListItem>)>,
}

impl ListBatches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `items` under `tag`. Re-registering a tag replaces its items but keeps its
    /// position.
    pub fn insert(&mut self, tag: impl Into<String>, items: Vec<ListItem>) {
        let tag = tag.into();
        match self.entries.entry(tag.to_ascii_lowercase()) {
            Entry::Occupied(mut entry) => entry.get_mut().1 = items,
            Entry::Vacant(entry) => {
                entry.insert((tag, items));
            }
        }
    }

    pub fn get(&self, tag: &str) -> Option<&[ListItem]> {
        self.entries
            .get(&tag.to_ascii_lowercase())
            .map(|(_, items)| items.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry, yielding `(tag, items)` in registration order.
    pub fn drain(&mut self) -> impl Iterator<Item = (String, Vec<ListItem>)> {
        self.entries.drain(..).map(|(_, entry)| entry)
    }
}

/// Tag and attribute names the markup tokenizer can read back: `[A-Za-z0-9:_-]+`.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':'))
}

fn build_entry(item: ListItem, tag: &str, diagnostics: &mut impl Diagnostics) -> Option<Node> {
    let mut li = Node::element("li");
    match item {
        ListItem::Text(text) => {
            if !text.is_empty()
                && let Some(children) = li.children_mut()
            {
                children.push(Node::text(&html::decode_entities(&text)));
            }
        }
        ListItem::Attributed {
            content,
            attributes,
        } => {
            let content = content.trim();
            if content.is_empty() {
                log::debug!(target: "mirage.list", "dropping blank list item for <{tag}>");
                return None;
            }
            for (name, value) in attributes {
                if !is_valid_name(&name) {
                    diagnostics.report(&Diagnostic::InvalidAttribute {
                        tag: tag.to_string(),
                        name,
                    });
                    continue;
                }
                li.set_attribute(&name, &html::decode_entities(&value));
            }
            if let Some(children) = li.children_mut() {
                children.extend(html::parse_fragment(content));
            }
        }
    }
    Some(li)
}

/// Builds the replacement container. Every item is considered; a dropped item never
/// stops the ones after it.
pub fn build_list(
    kind: ListKind,
    tag: &str,
    items: Vec<ListItem>,
    diagnostics: &mut impl Diagnostics,
) -> Node {
    let mut list = Node::element(kind.tag_name());
    let entries: Vec<Node> = items
        .into_iter()
        .filter_map(|item| build_entry(item, tag, diagnostics))
        .collect();
    log::trace!(
        target: "mirage.list",
        "built <{kind}> with {} item(s) for <{tag}>",
        entries.len()
    );
    if let Some(children) = list.children_mut() {
        *children = entries;
    }
    list
}

/// A parsed view of the store shared by every list batch of one render.
///
/// The markup is parsed on first use and written back once by [`TreeSession::finish`], and
/// only when at least one target was replaced.
#[derive(Debug, Default)]
pub struct TreeSession {
    dom: Option<Node>,
    replaced: usize,
}

impl TreeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the first `<tag>` with a list built from `items`. Returns whether a target
    /// was found.
    pub fn inject(
        &mut self,
        store: &MarkupStore,
        kind: ListKind,
        tag: &str,
        items: Vec<ListItem>,
        diagnostics: &mut impl Diagnostics,
    ) -> bool {
        let dom = self
            .dom
            .get_or_insert_with(|| html::parse_document(store.get()));
        let candidates = html::count_elements(dom, tag);
        if candidates == 0 {
            diagnostics.report(&Diagnostic::TargetNotFound {
                tag: tag.to_string(),
            });
            return false;
        }
        log::trace!(target: "mirage.list", "replacing first of {candidates} <{tag}> element(s)");
        let list = build_list(kind, tag, items, diagnostics);
        match html::replace_first_element(dom, tag, list) {
            Ok(_) => {
                self.replaced += 1;
                true
            }
            Err(_) => false,
        }
    }

    /// Writes the tree back into `store` if anything changed; returns the replacement count.
    pub fn finish(self, store: &mut MarkupStore) -> usize {
        if self.replaced > 0
            && let Some(dom) = &self.dom
        {
            store.set(html::to_html(dom));
        }
        self.replaced
    }
}

/// Renders every batch into `store`, draining each collection in the order given. All of
/// them share one [`TreeSession`]. Returns the number of replaced targets.
pub fn apply<'a>(
    store: &mut MarkupStore,
    batches: impl IntoIterator<Item = (ListKind, &'a mut ListBatches)>,
    diagnostics: &mut impl Diagnostics,
) -> usize {
    let mut session = TreeSession::new();
    for (kind, pending) in batches {
        for (tag, items) in pending.drain() {
            session.inject(store, kind, &tag, items, diagnostics);
        }
    }
    session.finish(store)
}
