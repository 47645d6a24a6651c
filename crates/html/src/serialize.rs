//! HTML serialization of a [`Node`] tree.
//!
//! Output contract:
//! - Text and attribute values are already in markup form and are written as stored;
//!   attribute values are always double-quoted (a literal `"` kept from a single-quoted
//!   source value becomes `&quot;`), and valueless attributes are written bare.
//! - Characters above ASCII in text and attribute values are written as decimal numeric
//!   references (`&#54620;`), so the output is pure ASCII outside comments and raw text.
//! - Comments, the doctype, and `script`/`style` bodies are written verbatim.
//! - Void elements get no end tag.
use crate::Node;
use crate::tokenizer::{is_rawtext_element, is_void_element};
use std::fmt::Write;

enum Step<'a> {
    Visit(&'a Node, bool),
    Close(&'a str),
}

/// Serializes `root` (a document, element, or leaf) to markup.
pub fn to_html(root: &Node) -> String {
    let mut out = String::new();
    write_html(&mut out, root);
    out
}

/// Appends the serialization of `root` to `out`. Iterative, so nesting depth is bounded
/// only by memory.
pub fn write_html(out: &mut String, root: &Node) {
    let mut stack = vec![Step::Visit(root, false)];
    while let Some(step) = stack.pop() {
        let (node, raw) = match step {
            Step::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
                continue;
            }
            Step::Visit(node, raw) => (node, raw),
        };
        match node {
            Node::Document { doctype, children } => {
                if let Some(doctype) = doctype {
                    out.push_str("<!");
                    out.push_str(doctype);
                    out.push('>');
                }
                stack.extend(children.iter().rev().map(|c| Step::Visit(c, false)));
            }
            Node::Element {
                name,
                attributes,
                children,
            } => {
                out.push('<');
                out.push_str(name);
                for (key, value) in attributes {
                    out.push(' ');
                    out.push_str(key);
                    if let Some(value) = value {
                        out.push_str("=\"");
                        write_attribute_value(out, value);
                        out.push('"');
                    }
                }
                out.push('>');
                if is_void_element(name) {
                    continue;
                }
                let raw_children = is_rawtext_element(name);
                stack.push(Step::Close(name.as_str()));
                stack.extend(children.iter().rev().map(|c| Step::Visit(c, raw_children)));
            }
            Node::Text { text } => {
                if raw {
                    out.push_str(text);
                } else {
                    write_text(out, text);
                }
            }
            Node::Comment { text } => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
        }
    }
}

fn push_numeric_reference(out: &mut String, ch: char) {
    let _ = write!(out, "&#{};", ch as u32);
}

fn write_text(out: &mut String, text: &str) {
    if text.is_ascii() {
        out.push_str(text);
        return;
    }
    for ch in text.chars() {
        if ch.is_ascii() {
            out.push(ch);
        } else {
            push_numeric_reference(out, ch);
        }
    }
}

fn write_attribute_value(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("&quot;"),
            ch if !ch.is_ascii() => push_numeric_reference(out, ch),
            ch => out.push(ch),
        }
    }
}
