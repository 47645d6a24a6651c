//! Mirage: fills HTML templates with scalar placeholders and generated lists.
//!
//! ```
//! use template::{ListKind, ScalarBatch, Template, TemplateConfig};
//!
//! let mut page = Template::from_markup(
//!     "<h1>[##_title_##]</h1><menu></menu>",
//!     TemplateConfig::default(),
//! );
//! let batch: ScalarBatch = [("title", "Hello")].into_iter().collect();
//! page.register_scalar_batch(batch);
//! page.register_list_batch(ListKind::Unordered, "menu", ["one", "two"]);
//! page.apply();
//! assert_eq!(page.markup(), "<h1>Hello</h1><ul><li>one</li><li>two</li></ul>");
//! ```

pub mod codec;
pub mod config;
pub mod diagnostics;
mod error;
pub mod list;
pub mod placeholder;
pub mod store;
mod template;
mod value;
pub mod whitespace;

pub use crate::codec::EntityCodec;
pub use crate::config::{
    DEFAULT_PREFIX, DEFAULT_SUFFIX, MAX_TEMPLATE_FILESIZE_KIB, TemplateConfig,
};
pub use crate::diagnostics::{CollectingDiagnostics, Diagnostic, Diagnostics, LogDiagnostics};
pub use crate::error::LoadError;
pub use crate::list::{ListBatches, ListItem, ListKind};
pub use crate::placeholder::ScalarBatch;
pub use crate::store::MarkupStore;
pub use crate::template::Template;
pub use crate::value::Value;
pub use crate::whitespace::normalize_whitespace;
pub use indexmap::IndexMap;
