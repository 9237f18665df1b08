use unicode_normalization::UnicodeNormalization;

use crate::types::{Card, ColumnId};

/// Unicode-aware folding: lowercases, NFD-decomposes, and strips combining
/// marks (accents), so "Idées" matches "idees".
pub fn normalize_for_search(value: &str) -> String {
    value
        .to_lowercase()
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect()
}

pub fn equals_text(left: &str, right: &str) -> bool {
    normalize_for_search(left) == normalize_for_search(right)
}

pub fn starts_with_text(haystack: &str, prefix: &str) -> bool {
    normalize_for_search(haystack).starts_with(&normalize_for_search(prefix))
}

pub fn contains_text(haystack: &str, needle: &str) -> bool {
    normalize_for_search(haystack).contains(&normalize_for_search(needle))
}

/// Kanban view filters. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KanbanFilter {
    /// Free text matched against title and body.
    pub query: Option<String>,
    /// Exact tag name, case-insensitive.
    pub tag: Option<String>,
    /// Restrict the view to one column.
    pub column_id: Option<ColumnId>,
}

impl KanbanFilter {
    pub fn new(query: Option<&str>, tag: Option<&str>, column_id: Option<ColumnId>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        Self {
            query: clean(query),
            tag: clean(tag).map(|t| t.trim_start_matches('#').to_string()),
            column_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.tag.is_none() && self.column_id.is_none()
    }

    pub fn includes_column(&self, column_id: ColumnId) -> bool {
        self.column_id.map_or(true, |id| id == column_id)
    }

    pub fn matches(&self, card: &Card, tags: &[String]) -> bool {
        if let Some(query) = &self.query {
            if !contains_text(&card.title, query) && !contains_text(&card.body_md, query) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            let wanted = tag.to_lowercase();
            if !tags.iter().any(|t| t.to_lowercase() == wanted) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CardStatus;
    use chrono::Utc;

    fn card(title: &str, body: &str) -> Card {
        Card {
            id: 1,
            column_id: 1,
            title: title.to_string(),
            body_md: body.to_string(),
            status: CardStatus::Active,
            position: 0,
            impact: 0,
            next_action: String::new(),
            converted_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_accent_insensitive() {
        assert_eq!(normalize_for_search("Idées Validées"), "idees validees");
        assert!(equals_text("À explorer", "a EXPLORER"));
        assert!(starts_with_text("Réflexion", "refl"));
    }

    #[test]
    fn test_filter_query_and_tag() {
        let c = card("Podcast pilot", "record the **intro**");
        let tags = vec!["Audio".to_string()];

        assert!(KanbanFilter::default().matches(&c, &tags));
        assert!(KanbanFilter::new(Some("INTRO"), None, None).matches(&c, &tags));
        assert!(!KanbanFilter::new(Some("video"), None, None).matches(&c, &tags));
        assert!(KanbanFilter::new(None, Some("#audio"), None).matches(&c, &tags));
        assert!(!KanbanFilter::new(None, Some("aud"), None).matches(&c, &tags));
    }

    #[test]
    fn test_blank_values_are_ignored() {
        let filter = KanbanFilter::new(Some("  "), Some(""), None);
        assert!(filter.is_empty());
        assert!(filter.includes_column(42));
        assert!(!KanbanFilter::new(None, None, Some(3)).includes_column(4));
    }
}
