//! Output compaction: collapses layout whitespace and strips comments.
use regex::Regex;
use std::sync::LazyLock;

// ASCII control whitespace only; non-breaking and other Unicode spaces are content.
static AFTER_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">[\t\n\x0B\x0C\r]+").expect("static pattern"));
static BEFORE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\t\n\x0B\x0C\r]+<").expect("static pattern"));
static RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\t\n\x0B\x0C\r ]+").expect("static pattern"));
static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static pattern"));

/// Compacts markup in four ordered passes:
///
/// 1. control whitespace right after `>` is removed;
/// 2. control whitespace right before `<` is removed;
/// 3. every remaining run of whitespace becomes one space;
/// 4. `<!-- ... -->` comments are removed (non-greedy, may span lines).
///
/// Whitespace inside `pre`, `textarea` and `script` is collapsed too.
pub fn normalize_whitespace(markup: &str) -> String {
    let out = AFTER_TAG.replace_all(markup, ">");
    let out = BEFORE_TAG.replace_all(&out, "<");
    let out = RUNS.replace_all(&out, " ");
    let out = COMMENTS.replace_all(&out, "");
    out.into_owned()
}
