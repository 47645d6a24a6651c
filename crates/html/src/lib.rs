//! Markup tree layer: a forgiving tokenizer and tree builder, first-match element queries
//! and replacement, and an ASCII-safe serializer.

pub mod dom_utils;
pub mod serialize;

mod dom_builder;
pub mod entities;
mod tokenizer;
mod types;

pub use crate::dom_builder::{build_dom, parse_document, parse_fragment};
pub use crate::dom_utils::{count_elements, find_first_element, replace_first_element};
pub use crate::entities::decode_entities;
pub use crate::serialize::to_html;
pub use crate::tokenizer::{is_void_element, tokenize};
pub use crate::types::{AtomId, AtomTable, Attributes, Node, Token, TokenStream};
