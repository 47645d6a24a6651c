//! Character reference decoding.
//!
//! Contract:
//! - Named references decoded: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
//! - Numeric references decoded only when semicolon-terminated: `&#233;` and `&#xE9;`.
//! - Only valid Unicode scalar values decode; anything else passes through unchanged.
//! - Other named references (`&copy;` etc.) are left as written.
use memchr::memchr;

const NAMED: &[(&[u8], char)] = &[
    (b"&amp;", '&'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&apos;", '\''),
    (b"&nbsp;", '\u{00A0}'),
];

const MAX_HEX_DIGITS: usize = 6; // 10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Returns the index of the terminating `;` when `bytes[start..]` is a bounded run of
/// digits followed by `;`.
fn scan_numeric_reference(
    bytes: &[u8],
    start: usize,
    max_digits: usize,
    hex: bool,
) -> Option<usize> {
    let mut j = start;
    while j < bytes.len() {
        let b = bytes[j];
        if b == b';' {
            return (j > start).then_some(j);
        }
        if j - start == max_digits {
            return None;
        }
        let digit = if hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        };
        if !digit {
            return None;
        }
        j += 1;
    }
    None
}

/// Decodes the numeric reference starting at byte `i` of `s` (which must point at `&#`).
/// Returns the character and the index just past the `;`.
pub fn numeric_reference_at(s: &str, i: usize) -> Option<(char, usize)> {
    let bytes = s.as_bytes();
    let hex = matches!(bytes.get(i + 2), Some(b'x' | b'X'));
    let (digits_start, max, radix) = if hex {
        (i + 3, MAX_HEX_DIGITS, 16)
    } else {
        (i + 2, MAX_DEC_DIGITS, 10)
    };
    let end = scan_numeric_reference(bytes, digits_start, max, hex)?;
    let ch = u32::from_str_radix(&s[digits_start..end], radix)
        .ok()
        .and_then(char::from_u32)?;
    Some((ch, end + 1))
}

/// Decodes the supported character references in `s`.
pub fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    let mut i = 0;

    while let Some(rel) = memchr(b'&', &bytes[i..]) {
        i += rel;
        out.push_str(&s[copy_start..i]);

        let rest = &bytes[i..];
        if let Some((pat, ch)) = NAMED.iter().find(|(pat, _)| rest.starts_with(pat)) {
            out.push(*ch);
            i += pat.len();
        } else if rest.starts_with(b"&#") {
            match numeric_reference_at(s, i) {
                Some((ch, next)) => {
                    out.push(ch);
                    i = next;
                }
                None => {
                    out.push('&');
                    i += 1;
                }
            }
        } else {
            out.push('&');
            i += 1;
        }
        copy_start = i;
    }

    out.push_str(&s[copy_start..]);
    out
}
