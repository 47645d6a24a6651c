//! Escaping of caller values before insertion, and the single decode pass that restores
//! characters the tree serializer wrote as numeric references.
use crate::list::ListItem;
use crate::placeholder::ScalarBatch;
use crate::value::Value;
use html::entities::numeric_reference_at;
use memchr::memchr;

/// Escapes `& < > " '` so a value cannot open tags or break out of a quoted attribute.
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            ch => out.push(ch),
        }
    }
    out
}

/// Encodes every string leaf; numbers, booleans and container shapes pass through.
pub fn encode_value(value: Value) -> Value {
    match value {
        Value::Str(s) => Value::Str(encode(&s)),
        Value::List(items) => Value::List(items.into_iter().map(encode_value).collect()),
        Value::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, encode_value(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Inverse of [`encode`] (and of any reference the tree layer understands).
pub fn decode(text: &str) -> String {
    html::decode_entities(text)
}

/// Applies [`encode`] to inserted values when enabled.
#[derive(Clone, Copy, Debug)]
pub struct EntityCodec {
    enabled: bool,
}

impl EntityCodec {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn encode_batch(&self, batch: ScalarBatch) -> ScalarBatch {
        if !self.enabled {
            return batch;
        }
        batch
            .into_iter()
            .map(|(k, v)| (k, encode_value(v)))
            .collect()
    }

    pub fn encode_item(&self, item: ListItem) -> ListItem {
        if !self.enabled {
            return item;
        }
        match item {
            ListItem::Text(s) => ListItem::Text(encode(&s)),
            ListItem::Attributed {
                content,
                attributes,
            } => ListItem::Attributed {
                content: encode(&content),
                attributes: attributes
                    .into_iter()
                    .map(|(k, v)| (k, encode(&v)))
                    .collect(),
            },
        }
    }
}

/// Restores decimal references to non-ASCII characters (`&#54620;` -> `한`).
///
/// The serializer writes every non-ASCII character this way. References to ASCII code
/// points and hex references are left alone since the serializer never produces them.
pub fn decode_stray_numeric_entities(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copy_start = 0;
    let mut i = 0;
    let mut decoded = 0usize;

    while let Some(rel) = memchr(b'&', &bytes[i..]) {
        i += rel;
        let decimal = bytes.get(i + 1) == Some(&b'#')
            && bytes.get(i + 2).is_some_and(u8::is_ascii_digit);
        let reference = if decimal {
            numeric_reference_at(text, i).filter(|(ch, _)| !ch.is_ascii())
        } else {
            None
        };
        match reference {
            Some((ch, next)) => {
                out.push_str(&text[copy_start..i]);
                out.push(ch);
                i = next;
                copy_start = i;
                decoded += 1;
            }
            None => i += 1,
        }
    }
    out.push_str(&text[copy_start..]);

    if decoded > 0 {
        log::trace!(target: "mirage.template", "decoded {decoded} numeric references");
    }
    out
}
