use crate::tokenizer::tokenize;
use crate::types::{AtomId, AtomTable, Node, Token, TokenStream};

/// Parses a whole document. Never fails; see [`build_dom`] for recovery rules.
pub fn parse_document(markup: &str) -> Node {
    build_dom(&tokenize(markup))
}

/// Parses markup meant to live inside an element and returns its top-level nodes.
pub fn parse_fragment(markup: &str) -> Vec<Node> {
    let mut document = parse_document(markup);
    document.children_mut().map(std::mem::take).unwrap_or_default()
}

/// Builds a tree from tokens.
///
/// Recovery rules:
/// - A start tag first closes the elements whose end tag it implies: a block element
///   closes an open `p`, `li` closes `li`, `dt`/`dd` close each other, `option` and
///   `optgroup` close an open `option`, and table parts close the row, cell or section
///   before them. The search stops at scope boundaries (`table`, `td`, `button`, ...).
/// - An end tag closes the nearest open element with that name and everything opened
///   after it.
/// - An end tag with no matching open element is dropped.
/// - Elements still open at the end of input are closed implicitly.
pub fn build_dom(stream: &TokenStream) -> Node {
    let atoms = stream.atoms();
    let mut arena = NodeArena::new();
    let root_index = arena.push(ArenaNode::Document {
        doctype: None,
        children: Vec::new(),
    });

    let mut open_elements = OpenElements::new(atoms);

    for token in stream.tokens() {
        match token {
            Token::Doctype(s) => {
                arena.set_doctype(root_index, s.clone());
            }
            Token::Comment(c) => {
                let parent_index = open_elements.current().unwrap_or(root_index);
                arena.add_child(parent_index, ArenaNode::Comment { text: c.clone() });
            }
            Token::Text(txt) => {
                if !txt.is_empty() {
                    let parent_index = open_elements.current().unwrap_or(root_index);
                    arena.add_child(parent_index, ArenaNode::Text { text: txt.clone() });
                }
            }
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => {
                let tag = atoms.resolve(*name);
                for &(targets, scope) in implied_end_rules(tag) {
                    open_elements.close_implied(targets, scope);
                }
                let attributes = attributes
                    .iter()
                    .map(|(k, v)| (atoms.resolve(*k).to_string(), v.clone()))
                    .collect();
                let parent_index = open_elements.current().unwrap_or(root_index);
                let new_index = arena.add_child(
                    parent_index,
                    ArenaNode::Element {
                        name: tag.to_string(),
                        attributes,
                        children: Vec::new(),
                    },
                );
                if !*self_closing {
                    open_elements.push(new_index, *name);
                }
            }
            Token::EndTag(name) => {
                if !open_elements.close(*name) {
                    log::trace!(
                        target: "html.tree",
                        "dropping stray end tag </{}>",
                        atoms.resolve(*name)
                    );
                }
            }
        }
    }

    arena.into_dom(root_index)
}

/// Which ancestors hide an open element from an implied end tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeKind {
    InScope,
    Button,
    ListItem,
    DefinitionList,
    Table,
    /// Only the current node is considered.
    Current,
}

fn is_scope_boundary(name: &str, kind: ScopeKind) -> bool {
    let base = matches!(
        name,
        "html" | "table" | "template" | "td" | "th" | "caption" | "marquee" | "object" | "applet"
    );
    match kind {
        ScopeKind::InScope => base,
        ScopeKind::Button => base || name == "button",
        ScopeKind::ListItem => base || name == "ol" || name == "ul",
        ScopeKind::DefinitionList => base || name == "dl",
        ScopeKind::Table => matches!(name, "html" | "table" | "template"),
        ScopeKind::Current => false,
    }
}

fn closes_paragraph(name: &str) -> bool {
    matches!(
        name,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "center"
            | "details"
            | "dialog"
            | "dir"
            | "div"
            | "dl"
            | "dd"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "li"
            | "listing"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "search"
            | "section"
            | "summary"
            | "table"
            | "ul"
    )
}

type ImpliedEnd = (&'static [&'static str], ScopeKind);

const CLOSE_P: ImpliedEnd = (&["p"], ScopeKind::Button);

/// The implied end tags a start tag named `name` generates, applied in order.
fn implied_end_rules(name: &str) -> &'static [ImpliedEnd] {
    match name {
        "li" => &[(&["li"], ScopeKind::ListItem), CLOSE_P],
        "dt" | "dd" => &[(&["dt", "dd"], ScopeKind::DefinitionList), CLOSE_P],
        "option" => &[(&["option"], ScopeKind::Current)],
        "optgroup" => &[(&["option", "optgroup"], ScopeKind::Current)],
        "tr" => &[(&["tr"], ScopeKind::Table)],
        "td" | "th" => &[(&["td", "th"], ScopeKind::Table)],
        "thead" | "tbody" | "tfoot" => &[(&["thead", "tbody", "tfoot"], ScopeKind::Table)],
        name if closes_paragraph(name) => &[CLOSE_P],
        _ => &[],
    }
}

/// Stack of open elements with a per-name count, so lookups for names that are not open
/// never scan the stack.
struct OpenElements<'a> {
    atoms: &'a AtomTable,
    items: Vec<(usize, AtomId)>,
    open_counts: Vec<u32>,
}

impl<'a> OpenElements<'a> {
    fn new(atoms: &'a AtomTable) -> Self {
        Self {
            atoms,
            items: Vec::new(),
            open_counts: vec![0; atoms.len()],
        }
    }

    fn current(&self) -> Option<usize> {
        self.items.last().map(|&(index, _)| index)
    }

    fn is_open(&self, name: AtomId) -> bool {
        self.open_counts[name.0 as usize] > 0
    }

    fn push(&mut self, node_index: usize, name: AtomId) {
        self.items.push((node_index, name));
        self.open_counts[name.0 as usize] += 1;
    }

    /// Pops entries above and including position `pos`.
    fn truncate(&mut self, pos: usize) {
        for &(_, name) in &self.items[pos..] {
            self.open_counts[name.0 as usize] -= 1;
        }
        self.items.truncate(pos);
    }

    /// Closes the nearest open element named `name`; `false` if none is open.
    fn close(&mut self, name: AtomId) -> bool {
        if !self.is_open(name) {
            return false;
        }
        match self.items.iter().rposition(|&(_, open)| open == name) {
            Some(pos) => {
                self.truncate(pos);
                true
            }
            None => false,
        }
    }

    /// Closes the nearest element named in `targets` when no `scope` boundary sits
    /// between it and the current node.
    fn close_implied(&mut self, targets: &[&str], scope: ScopeKind) {
        let open_targets: Vec<AtomId> = targets
            .iter()
            .filter_map(|t| self.atoms.get(t))
            .filter(|&id| self.is_open(id))
            .collect();
        if open_targets.is_empty() {
            return;
        }
        if scope == ScopeKind::Current {
            while let Some(&(_, name)) = self.items.last() {
                if !open_targets.contains(&name) {
                    break;
                }
                self.truncate(self.items.len() - 1);
            }
            return;
        }
        for pos in (0..self.items.len()).rev() {
            let name = self.items[pos].1;
            if open_targets.contains(&name) {
                self.truncate(pos);
                return;
            }
            if is_scope_boundary(self.atoms.resolve(name), scope) {
                return;
            }
        }
    }
}

#[derive(Debug)]
enum ArenaNode {
    Document {
        doctype: Option<String>,
        children: Vec<usize>,
    },
    Element {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        children: Vec<usize>,
    },
    Text {
        text: String,
    },
    Comment {
        text: String,
    },
}

impl ArenaNode {
    fn children(&self) -> Option<&[usize]> {
        match self {
            ArenaNode::Document { children, .. } | ArenaNode::Element { children, .. } => {
                Some(children)
            }
            ArenaNode::Text { .. } | ArenaNode::Comment { .. } => None,
        }
    }
}

#[derive(Debug)]
struct NodeArena {
    nodes: Vec<ArenaNode>,
}

impl NodeArena {
    fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    fn push(&mut self, node: ArenaNode) -> usize {
        let index = self.nodes.len();
        self.nodes.push(node);
        index
    }

    fn add_child(&mut self, parent_index: usize, child: ArenaNode) -> usize {
        let child_index = self.push(child);
        match &mut self.nodes[parent_index] {
            ArenaNode::Document { children, .. } | ArenaNode::Element { children, .. } => {
                children.push(child_index);
            }
            _ => unreachable!("dom builder parent cannot have children"),
        }
        child_index
    }

    fn set_doctype(&mut self, root_index: usize, doctype: String) {
        let ArenaNode::Document { doctype: dt, .. } = &mut self.nodes[root_index] else {
            unreachable!("dom builder root is always a document node");
        };
        *dt = Some(doctype);
    }

    fn is_element_named(&self, node_index: usize, target: &str) -> bool {
        match &self.nodes[node_index] {
            ArenaNode::Element { name, .. } => name.eq_ignore_ascii_case(target),
            _ => false,
        }
    }

    /// Converts the arena into an owned tree with an iterative post-order walk, so deeply
    /// nested markup cannot overflow the stack.
    fn into_dom(self, root_index: usize) -> Node {
        let mut nodes = self.nodes;
        let mut built: Vec<Node> = Vec::with_capacity(nodes.len());

        fn take_children(n: usize, built: &mut Vec<Node>) -> Vec<Node> {
            // Direct children are the last `n` finished nodes, in document order.
            built.split_off(built.len() - n)
        }

        let mut stack: Vec<(usize, bool)> = vec![(root_index, false)];
        while let Some((node_index, visited)) = stack.pop() {
            if !visited {
                stack.push((node_index, true));
                if let Some(children) = nodes[node_index].children() {
                    for &child_index in children.iter().rev() {
                        stack.push((child_index, false));
                    }
                }
                continue;
            }

            let node = match &mut nodes[node_index] {
                ArenaNode::Document { doctype, children } => Node::Document {
                    doctype: doctype.take(),
                    children: take_children(children.len(), &mut built),
                },
                ArenaNode::Element {
                    name,
                    attributes,
                    children,
                } => Node::Element {
                    name: std::mem::take(name),
                    attributes: std::mem::take(attributes),
                    children: take_children(children.len(), &mut built),
                },
                ArenaNode::Text { text } => Node::Text {
                    text: std::mem::take(text),
                },
                ArenaNode::Comment { text } => Node::Comment {
                    text: std::mem::take(text),
                },
            };
            built.push(node);
        }

        debug_assert_eq!(built.len(), 1, "dom builder should build exactly one root");
        built.pop().unwrap_or(Node::Document {
            doctype: None,
            children: Vec::new(),
        })
    }
}
