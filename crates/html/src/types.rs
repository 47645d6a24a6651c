use std::collections::HashMap;
use std::sync::Arc;

/// Opaque identifier of an interned tag or attribute name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AtomId(pub u32);

/// Per-document table of canonicalized tag/attribute names.
///
/// Invariant: ASCII letters are stored lowercase. Non-ASCII is never produced by the
/// tokenizer's name scanner, so folding is ASCII-only.
#[derive(Debug, Default)]
pub struct AtomTable {
    atoms: Vec<Arc<str>>,
    map: HashMap<Arc<str>, AtomId>,
}

impl AtomTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_ascii_lowercase(&mut self, name: &str) -> AtomId {
        if !name.bytes().any(|b| b.is_ascii_uppercase()) {
            if let Some(id) = self.map.get(name) {
                return *id;
            }
            return self.insert(Arc::from(name));
        }
        let folded = name.to_ascii_lowercase();
        if let Some(id) = self.map.get(folded.as_str()) {
            return *id;
        }
        self.insert(Arc::from(folded))
    }

    fn insert(&mut self, atom: Arc<str>) -> AtomId {
        let id = AtomId(self.atoms.len() as u32);
        self.atoms.push(Arc::clone(&atom));
        self.map.insert(atom, id);
        id
    }

    /// Looks up an already interned name; `name` must be lowercase.
    pub fn get(&self, name: &str) -> Option<AtomId> {
        self.map.get(name).copied()
    }

    /// Panics on an id from a different table.
    pub fn resolve(&self, id: AtomId) -> &str {
        &self.atoms[id.0 as usize]
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

#[derive(Debug)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: AtomId,
        attributes: Vec<(AtomId, Option<String>)>,
        self_closing: bool,
    },
    EndTag(AtomId),
    Comment(String),
    Text(String),
}

/// Tokens plus the atom table their names resolve against.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    atoms: AtomTable,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>, atoms: AtomTable) -> Self {
        Self { tokens, atoms }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn atoms(&self) -> &AtomTable {
        &self.atoms
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }
}

/// Attribute values are kept in markup form: character references stay as written.
pub type Attributes = Vec<(String, Option<String>)>;

/// A markup tree node.
///
/// `Text` holds markup-form text, exactly as it appeared in the source: character
/// references are not decoded, and constructs the tree does not model (processing
/// instructions, CDATA sections, `<!...>` declarations) are stored as text verbatim.
/// Untouched parts of a document therefore serialize back byte for byte (apart from the
/// ASCII-safe output contract of [`crate::serialize`]).
///
/// Dropping a node is iterative, so arbitrarily deep trees can be released safely.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    Document {
        doctype: Option<String>,
        children: Vec<Node>,
    },
    Element {
        name: String,
        attributes: Attributes,
        children: Vec<Node>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl Node {
    pub fn element(name: impl Into<String>) -> Self {
        Node::Element {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A text node showing `literal` as-is; `&`, `<` and `>` are escaped.
    pub fn text(literal: &str) -> Self {
        let mut text = String::with_capacity(literal.len());
        for ch in literal.chars() {
            match ch {
                '&' => text.push_str("&amp;"),
                '<' => text.push_str("&lt;"),
                '>' => text.push_str("&gt;"),
                ch => text.push(ch),
            }
        }
        Node::Text { text }
    }

    /// A text node holding already escaped markup text.
    pub fn markup_text(text: impl Into<String>) -> Self {
        Node::Text { text: text.into() }
    }

    pub fn is_element_named(&self, target: &str) -> bool {
        matches!(self, Node::Element { name, .. } if name.eq_ignore_ascii_case(target))
    }

    pub fn children(&self) -> Option<&[Node]> {
        match self {
            Node::Document { children, .. } | Node::Element { children, .. } => Some(children),
            Node::Text { .. } | Node::Comment { .. } => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Document { children, .. } | Node::Element { children, .. } => Some(children),
            Node::Text { .. } | Node::Comment { .. } => None,
        }
    }

    /// Sets or overwrites an attribute to the literal `value` (`&` and `"` are escaped),
    /// keeping the position of an existing one. Returns `false` on non-element nodes.
    pub fn set_attribute(&mut self, key: &str, value: &str) -> bool {
        let Node::Element { attributes, .. } = self else {
            return false;
        };
        let value = Some(value.replace('&', "&amp;").replace('"', "&quot;"));
        match attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
        {
            Some((_, existing)) => *existing = value,
            None => attributes.push((key.to_string(), value)),
        }
        true
    }

    /// The markup-form value of `key`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        let Node::Element { attributes, .. } = self else {
            return None;
        };
        attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .and_then(|(_, v)| v.as_deref())
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        let Some(children) = self.children_mut() else {
            return;
        };
        if children.iter().all(|c| c.children().is_none_or(<[Node]>::is_empty)) {
            return;
        }
        let mut pending = std::mem::take(children);
        while let Some(mut node) = pending.pop() {
            if let Some(grandchildren) = node.children_mut() {
                pending.append(grandchildren);
            }
        }
    }
}
