//! Markup stripping for rich-text fields.
//!
//! Order of operations: CDATA unwrap, tag removal, one entity-decoding pass,
//! whitespace collapse, trim. Entities are decoded exactly once, so
//! `&amp;lt;` becomes `&lt;` and never `<`.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CDATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("cdata pattern"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(nbsp|amp|lt|gt|quot|#39|#x27|apos|lsquo|rsquo|ldquo|rdquo);")
        .expect("entity pattern")
});
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Strip markup from `text` and return clean single-line prose.
///
/// Never fails: unterminated tags and unknown entities pass through as-is.
pub fn strip(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let unwrapped = CDATA.replace_all(text, "$1");
    let untagged = TAG.replace_all(&unwrapped, "");
    let decoded = ENTITY.replace_all(&untagged, |caps: &Captures<'_>| decode_entity(&caps[1]));
    WHITESPACE.replace_all(&decoded, " ").trim().to_string()
}

fn decode_entity(name: &str) -> &'static str {
    match name {
        "nbsp" => " ",
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" | "ldquo" | "rdquo" => "\"",
        "#39" | "#x27" | "apos" | "lsquo" | "rsquo" => "'",
        // ENTITY only captures the names above.
        _ => "",
    }
}
