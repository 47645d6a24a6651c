//! Forgiving HTML tokenizer for template markup.
//!
//! Tag and attribute names are ASCII `[A-Za-z0-9:_-]`, folded to lowercase. Placeholder-style
//! custom tags such as `<site_menu>` therefore tokenize like any other element.
//!
//! Text and attribute values are emitted in markup form: character references are left
//! for the consumer to decode, so a document can be written back exactly as it was read.
//!
//! The tokenizer never fails: malformed input degrades into text or into tags with fewer
//! attributes. Limitations:
//! - Processing instructions (`<?...>`), CDATA sections and other `<!...>` declarations
//!   are passed through as opaque text.
//! - Raw text (`script`, `style`) closes only on `</name` followed by optional ASCII
//!   whitespace and `>`.
use crate::types::{AtomId, AtomTable, Token, TokenStream};
use memchr::memchr;

const COMMENT_OPEN: &str = "<!--";
const COMMENT_CLOSE: &str = "-->";
const CDATA_OPEN: &[u8] = b"<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

// Matches only start at an ASCII '<', which never occurs inside a UTF-8 continuation byte.
const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn scan_name(bytes: &[u8], start: usize) -> usize {
    let mut j = start;
    while j < bytes.len() && is_name_byte(bytes[j]) {
        j += 1;
    }
    j
}

fn skip_ascii_whitespace(bytes: &[u8], mut k: usize) -> usize {
    while k < bytes.len() && bytes[k].is_ascii_whitespace() {
        k += 1;
    }
    k
}

/// Returns `(start, end)` of the close tag relative to `haystack`.
fn find_rawtext_close_tag(haystack: &str, close_tag: &[u8]) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let n = close_tag.len();
    debug_assert!(close_tag.starts_with(b"</"));
    let mut i = 0;
    while i + n <= bytes.len() {
        i += memchr(b'<', &bytes[i..])?;
        if i + n > bytes.len() {
            return None;
        }
        if starts_with_ignore_ascii_case_at(bytes, i, close_tag) {
            let k = skip_ascii_whitespace(bytes, i + n);
            if k < bytes.len() && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

pub fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

pub fn is_rawtext_element(name: &str) -> bool {
    name == "script" || name == "style"
}

/// Parses the attribute list of a start tag beginning at `k` (just past the tag name).
/// Returns the attributes, whether the tag was written self-closing, and the index just
/// past the closing `>` (or the end of input).
fn scan_attributes(
    input: &str,
    mut k: usize,
    atoms: &mut AtomTable,
) -> (Vec<(AtomId, Option<String>)>, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes = Vec::new();
    let mut self_closing = false;

    loop {
        k = skip_ascii_whitespace(bytes, k);
        if k >= len {
            break;
        }
        match bytes[k] {
            b'>' => {
                k += 1;
                break;
            }
            b'/' if k + 1 < len && bytes[k + 1] == b'>' => {
                self_closing = true;
                k += 2;
                break;
            }
            b'/' => {
                k += 1;
                continue;
            }
            _ => {}
        }

        let name_start = k;
        k = scan_name(bytes, k);
        if name_start == k {
            // Not a name character (e.g. a stray quote); skip it.
            k += 1;
            continue;
        }
        let name = atoms.intern_ascii_lowercase(&input[name_start..k]);

        k = skip_ascii_whitespace(bytes, k);
        if k >= len || bytes[k] != b'=' {
            attributes.push((name, None));
            continue;
        }
        k = skip_ascii_whitespace(bytes, k + 1);

        let value = if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
            let quote = bytes[k];
            let vstart = k + 1;
            k = vstart;
            while k < len && bytes[k] != quote {
                k += 1;
            }
            let raw = input[vstart..k].to_string();
            if k < len {
                k += 1;
            }
            raw
        } else {
            let vstart = k;
            while k < len && !bytes[k].is_ascii_whitespace() && bytes[k] != b'>' {
                if bytes[k] == b'/' && k + 1 < len && bytes[k + 1] == b'>' {
                    break;
                }
                k += 1;
            }
            input[vstart..k].to_string()
        };
        attributes.push((name, Some(value)));
    }

    (attributes, self_closing, k)
}

/// Tokenizes markup into a stream with interned tag/attribute names.
pub fn tokenize(input: &str) -> TokenStream {
    let mut out = Vec::new();
    let mut atoms = AtomTable::new();
    let bytes = input.as_bytes();
    let mut i = 0;
    // Slices are only cut at ASCII structural bytes, so every endpoint is a char boundary.
    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            i = memchr(b'<', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
            out.push(Token::Text(input[start..i].to_string()));
            continue;
        }

        if input[i..].starts_with(COMMENT_OPEN) {
            let body_start = i + COMMENT_OPEN.len();
            match input[body_start..].find(COMMENT_CLOSE) {
                Some(end) => {
                    out.push(Token::Comment(input[body_start..body_start + end].to_string()));
                    i = body_start + end + COMMENT_CLOSE.len();
                    continue;
                }
                None => {
                    out.push(Token::Comment(input[body_start..].to_string()));
                    break;
                }
            }
        }

        if starts_with_ignore_ascii_case_at(bytes, i, b"<!doctype") {
            let rest = &input[i + 2..];
            let Some(end) = rest.find('>') else {
                break;
            };
            out.push(Token::Doctype(rest[..end].trim().to_string()));
            i += 2 + end + 1;
            continue;
        }

        let opaque_end = if starts_with_ignore_ascii_case_at(bytes, i, CDATA_OPEN) {
            Some(
                input[i..]
                    .find(CDATA_CLOSE)
                    .map_or(bytes.len(), |rel| i + rel + CDATA_CLOSE.len()),
            )
        } else if matches!(bytes.get(i + 1), Some(b'?' | b'!')) {
            Some(memchr(b'>', &bytes[i..]).map_or(bytes.len(), |rel| i + rel + 1))
        } else {
            None
        };
        if let Some(end) = opaque_end {
            out.push(Token::Text(input[i..end].to_string()));
            i = end;
            continue;
        }

        if i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            let start = i + 2;
            let j = scan_name(bytes, start);
            if j == start {
                // `</` not followed by a name: keep it as text.
                out.push(Token::Text("</".to_string()));
                i = start;
                continue;
            }
            let name = atoms.intern_ascii_lowercase(&input[start..j]);
            i = memchr(b'>', &bytes[j..]).map_or(bytes.len(), |rel| j + rel + 1);
            out.push(Token::EndTag(name));
            continue;
        }

        let start = i + 1;
        let j = scan_name(bytes, start);
        if j == start {
            // A lone '<' (e.g. "a < b") is text.
            out.push(Token::Text("<".to_string()));
            i = start;
            continue;
        }
        let name = atoms.intern_ascii_lowercase(&input[start..j]);
        let (attributes, mut self_closing, content_start) = scan_attributes(input, j, &mut atoms);
        if is_void_element(atoms.resolve(name)) {
            self_closing = true;
        }
        out.push(Token::StartTag {
            name,
            attributes,
            self_closing,
        });

        let name_str = atoms.resolve(name);
        if is_rawtext_element(name_str) && !self_closing {
            let close_tag = if name_str == "script" {
                SCRIPT_CLOSE_TAG
            } else {
                STYLE_CLOSE_TAG
            };
            let body = &input[content_start..];
            match find_rawtext_close_tag(body, close_tag) {
                Some((rel_start, rel_end)) => {
                    if rel_start > 0 {
                        out.push(Token::Text(body[..rel_start].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i = content_start + rel_end;
                    continue;
                }
                None => {
                    // Unterminated raw text runs to the end with an implied end tag.
                    if !body.is_empty() {
                        out.push(Token::Text(body.to_string()));
                    }
                    out.push(Token::EndTag(name));
                    break;
                }
            }
        }

        i = content_start;
    }
    TokenStream::new(out, atoms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(stream: &TokenStream) -> Vec<&str> {
        stream
            .iter()
            .filter_map(|t| match t {
                Token::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn tokenize_preserves_utf8_text_nodes() {
        let stream = tokenize("<p>120×32 안녕</p>");
        assert_eq!(texts(&stream), vec!["120×32 안녕"]);
    }

    #[test]
    fn tokenize_handles_uppercase_doctype() {
        let stream = tokenize("<!DOCTYPE html>");
        assert!(
            stream
                .iter()
                .any(|t| matches!(t, Token::Doctype(s) if s == "DOCTYPE html")),
            "expected case-insensitive doctype, got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_accepts_underscore_custom_tags() {
        let stream = tokenize("<mirage_test_ol>x</mirage_test_ol>");
        let atoms = stream.atoms();
        assert!(
            matches!(
                stream.tokens(),
                [Token::StartTag { name, .. }, Token::Text(body), Token::EndTag(end)]
                    if atoms.resolve(*name) == "mirage_test_ol"
                        && body == "x"
                        && atoms.resolve(*end) == "mirage_test_ol"
            ),
            "got: {stream:?}"
        );
    }

    #[test]
    fn tokenize_finds_script_end_tag_case_insensitive() {
        let stream = tokenize("<script>if (a < b) x();</ScRiPt >");
        let atoms = stream.atoms();
        assert!(
            matches!(
                stream.tokens(),
                [Token::StartTag { name, .. }, Token::Text(body), Token::EndTag(end)]
                    if atoms.resolve(*name) == "script"
                        && body == "if (a < b) x();"
                        && atoms.resolve(*end) == "script"
            ),
            "expected raw script text and matching end tag, got: {stream:?}"
        );
    }

    #[test]
    fn rawtext_close_tag_does_not_accept_near_matches() {
        let stream = tokenize("<style>a</stylex>b</style>");
        assert_eq!(texts(&stream), vec!["a</stylex>b"]);
    }

    #[test]
    fn tokenize_handles_rawtext_without_close_tag() {
        let stream = tokenize("<script>x<y>");
        let atoms = stream.atoms();
        assert!(matches!(
            stream.tokens(),
            [Token::StartTag { .. }, Token::Text(body), Token::EndTag(end)]
                if body == "x<y>" && atoms.resolve(*end) == "script"
        ));
    }

    #[test]
    fn tokenize_keeps_attribute_values_as_written() {
        let stream = tokenize("<a title=\"a &amp; b\" data-x=c&lt;d hidden>");
        let atoms = stream.atoms();
        let Some(Token::StartTag { attributes, .. }) = stream.tokens().first() else {
            panic!("expected start tag, got: {stream:?}");
        };
        let resolved: Vec<(&str, Option<&str>)> = attributes
            .iter()
            .map(|(k, v)| (atoms.resolve(*k), v.as_deref()))
            .collect();
        assert_eq!(
            resolved,
            vec![
                ("title", Some("a &amp; b")),
                ("data-x", Some("c&lt;d")),
                ("hidden", None)
            ]
        );
    }

    #[test]
    fn tokenize_single_quoted_attribute_keeps_double_quotes() {
        let stream = tokenize("<a href='say \"hi\"'>");
        let Some(Token::StartTag { attributes, .. }) = stream.tokens().first() else {
            panic!("expected start tag");
        };
        assert_eq!(attributes[0].1.as_deref(), Some("say \"hi\""));
    }

    #[test]
    fn tokenize_marks_void_elements_self_closing() {
        let stream = tokenize("<br><img src=x><div/>");
        let flags: Vec<bool> = stream
            .iter()
            .filter_map(|t| match t {
                Token::StartTag { self_closing, .. } => Some(*self_closing),
                _ => None,
            })
            .collect();
        assert_eq!(flags, vec![true, true, true]);
    }

    #[test]
    fn tokenize_keeps_lone_angle_brackets_as_text() {
        let stream = tokenize("a < b </ c");
        assert_eq!(texts(&stream).concat(), "a < b </ c");
    }

    #[test]
    fn tokenize_keeps_character_references_as_written() {
        let stream = tokenize("<p>&copy; 2024 &mdash; a &amp;copy; b &#233;</p>");
        assert_eq!(
            texts(&stream),
            vec!["&copy; 2024 &mdash; a &amp;copy; b &#233;"]
        );
    }

    #[test]
    fn tokenize_passes_processing_instructions_and_cdata_through_as_text() {
        let input = "<?xml version=\"1.0\"?><svg><![CDATA[a < b && <c>]]></svg><!ENTITY x>";
        let stream = tokenize(input);
        assert_eq!(
            texts(&stream),
            vec![
                "<?xml version=\"1.0\"?>",
                "<![CDATA[a < b && <c>]]>",
                "<!ENTITY x>"
            ]
        );
        let tags = stream
            .iter()
            .filter(|t| matches!(t, Token::StartTag { .. } | Token::EndTag(_)))
            .count();
        assert_eq!(tags, 2);
    }

    #[test]
    fn tokenize_runs_unterminated_cdata_to_the_end() {
        let stream = tokenize("<p>x</p><![CDATA[open <b>");
        assert!(matches!(stream.tokens().last(), Some(Token::Text(t)) if t == "<![CDATA[open <b>"));
    }

    #[test]
    fn tokenize_keeps_placeholder_markers_in_text_and_attributes() {
        let stream = tokenize("<a href=\"[##_url_##]\">[##_label_##]</a>");
        let Some(Token::StartTag { attributes, .. }) = stream.tokens().first() else {
            panic!("expected start tag");
        };
        assert_eq!(attributes[0].1.as_deref(), Some("[##_url_##]"));
        assert_eq!(texts(&stream), vec!["[##_label_##]"]);
    }

    #[test]
    fn tokenize_handles_unterminated_comment() {
        let stream = tokenize("<p>a</p><!-- open");
        assert!(matches!(stream.tokens().last(), Some(Token::Comment(c)) if c == " open"));
    }

    #[test]
    fn tokenize_handles_tons_of_angle_brackets() {
        let input = "<".repeat(50_000);
        let stream = tokenize(&input);
        assert!(stream.tokens().len() <= input.len());
    }
}
