//! Type-text normalization.
//!
//! API shapes and signature strings compare type annotations textually, so
//! every captured type goes through [`normalize_type_string`] first. The
//! function is idempotent: `normalize(normalize(x)) == normalize(x)`.

use once_cell::sync::Lazy;
use regex::Regex;

static WS_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SPACE_BEFORE_CLOSER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+([,;:)\]>])").unwrap());
static SPACE_AFTER_OPENER: Lazy<Regex> = Lazy::new(|| Regex::new(r"([(\[<])\s+").unwrap());
static COMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r",\s*").unwrap());
static COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r":\s*").unwrap());
static SEMI: Lazy<Regex> = Lazy::new(|| Regex::new(r";\s*").unwrap());
static UNION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\|\s*").unwrap());
static INTERSECTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*&\s*").unwrap());
static OPEN_BRACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\s*").unwrap());
static CLOSE_BRACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\}").unwrap());
static ARROW: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*=>\s*").unwrap());

/// Normalize a type annotation's source text for comparison.
///
/// Collapses all whitespace, tightens punctuation (`,` `:` `;` `(` `)` `[`
/// `]` `<` `>`), pads unions/intersections to `" | "` / `" & "`, and pads
/// braces to `{ ... }`.
pub fn normalize_type_string(raw: &str) -> String {
    let mut s = WS_RUN.replace_all(raw.trim(), " ").into_owned();
    // Arrow first so the `>` rule below cannot split `=>`.
    s = ARROW.replace_all(&s, "\u{1}").into_owned();
    s = SPACE_BEFORE_CLOSER.replace_all(&s, "$1").into_owned();
    s = SPACE_AFTER_OPENER.replace_all(&s, "$1").into_owned();
    s = COMMA.replace_all(&s, ", ").into_owned();
    s = COLON.replace_all(&s, ": ").into_owned();
    s = SEMI.replace_all(&s, "; ").into_owned();
    s = UNION.replace_all(&s, " | ").into_owned();
    s = INTERSECTION.replace_all(&s, " & ").into_owned();
    s = OPEN_BRACE.replace_all(&s, "{ ").into_owned();
    s = CLOSE_BRACE.replace_all(&s, " }").into_owned();
    s = s.replace("{ }", "{}");
    s = s.replace('\u{1}', " => ");
    s.trim().to_string()
}

/// Slice a span out of the source text, clamped to valid bounds.
pub fn span_text(source: &str, start: u32, end: u32) -> &str {
    let start = (start as usize).min(source.len());
    let end = (end as usize).min(source.len()).max(start);
    &source[start..end]
}

/// 1-based line of a byte offset.
pub fn offset_to_line(source: &str, offset: usize) -> usize {
    let capped = offset.min(source.len());
    source[..capped].bytes().filter(|b| *b == b'\n').count() + 1
}

/// 1-based column of a byte offset.
pub fn offset_to_column(source: &str, offset: usize) -> usize {
    let capped = offset.min(source.len());
    let line_start = source[..capped].rfind('\n').map(|i| i + 1).unwrap_or(0);
    capped - line_start + 1
}
