//! One-line card capture: `Record intro @"To explore" !4 #audio #pilot`.
//!
//! - `@Name` or `@"Name with spaces"`: column hint
//! - `!N` or `i:N`, N in 0..=5: impact
//! - `#tag` (`[\w-]+`): tags, removed from the title
//!
//! Whatever remains is the title; when nothing remains the raw text is used.

use std::sync::OnceLock;

use regex::Regex;

use crate::search::{equals_text, starts_with_text};
use crate::types::Column;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuickAddParse {
    pub title: String,
    pub column_hint: Option<String>,
    pub impact: Option<u8>,
    pub tags: Vec<String>,
}

fn quoted_column_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"@"([^"]+)""#).expect("valid quoted column regex"))
}

fn column_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"@(\S+)").expect("valid column regex"))
}

fn impact_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:!|i:)\s*([0-5])\b").expect("valid impact regex"))
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#([\w-]+)").expect("valid tag regex"))
}

fn strip_tags_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*#[\w-]+").expect("valid tag strip regex"))
}

/// Remove the first match of `re` from `text`, returning its first group.
fn take_first(re: &Regex, text: &mut String) -> Option<String> {
    let captures = re.captures(text)?;
    let whole = captures.get(0)?;
    let group = captures.get(1)?.as_str().trim().to_string();
    let rest = format!("{}{}", &text[..whole.start()], &text[whole.end()..]);
    *text = rest.trim().to_string();
    Some(group)
}

pub fn parse_quick_add(raw: &str) -> QuickAddParse {
    let raw = raw.trim();
    let mut text = raw.to_string();

    let column_hint = take_first(quoted_column_regex(), &mut text)
        .or_else(|| take_first(column_regex(), &mut text))
        .filter(|hint| !hint.is_empty());

    let impact = take_first(impact_regex(), &mut text).and_then(|n| n.parse::<u8>().ok());

    let tags: Vec<String> = tag_regex()
        .captures_iter(&text)
        .filter_map(|c| c.get(1).map(|m| m.as_str().to_string()))
        .collect();
    if !tags.is_empty() {
        text = strip_tags_regex().replace_all(&text, "").trim().to_string();
    }

    let mut title = text.trim().trim_matches('"').trim().to_string();
    if title.is_empty() {
        title = raw.to_string();
    }

    QuickAddParse {
        title,
        column_hint,
        impact,
        tags,
    }
}

/// Resolve a column hint: exact name first, then prefix, both accent- and
/// case-insensitive. `columns` must be in board order.
pub fn match_column<'a>(columns: &'a [Column], hint: &str) -> Option<&'a Column> {
    columns
        .iter()
        .find(|c| equals_text(&c.name, hint))
        .or_else(|| columns.iter().find(|c| starts_with_text(&c.name, hint)))
}
