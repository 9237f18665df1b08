//! Typed requests built from loosely-shaped JSON bodies.
//!
//! Clients in the wild send several spellings for the same field
//! (`to_column_id` vs `destination_column_id`, `orderedIds` vs `ordered_ids`).
//! Each request type accepts the known synonyms, checks field rules, and
//! reports the first offending field as a `ValidationError`.

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::ordering::ColumnOrder;
use crate::types::*;

type Fields = Map<String, Value>;

fn object(body: &Value) -> Result<&Fields, ValidationError> {
    body.as_object().ok_or(ValidationError::InvalidField {
        field: "body",
        expected: "a JSON object",
    })
}

/// First synonym present with a non-null value.
fn first<'a>(fields: &'a Fields, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| fields.get(*key))
        .find(|value| !value.is_null())
}

/// Integer from a JSON number or, when `lenient`, an integer string.
fn integer(value: &Value, field: &'static str, lenient: bool) -> Result<i64, ValidationError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if lenient => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or(ValidationError::InvalidField {
        field,
        expected: "an integer",
    })
}

fn optional_integer(
    fields: &Fields,
    keys: &[&str],
    field: &'static str,
) -> Result<Option<i64>, ValidationError> {
    first(fields, keys)
        .map(|value| integer(value, field, true))
        .transpose()
}

/// String field; `null` reads as empty.
fn text(value: &Value, field: &'static str) -> Result<String, ValidationError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::String(s) => Ok(s.clone()),
        _ => Err(ValidationError::InvalidField {
            field,
            expected: "a string",
        }),
    }
}

fn optional_text(fields: &Fields, key: &str, field: &'static str) -> Result<Option<String>, ValidationError> {
    fields.get(key).map(|value| text(value, field)).transpose()
}

fn bounded(value: String, field: &'static str, max: usize) -> Result<String, ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(value)
}

/// Trimmed, non-empty, length-checked name or title.
pub fn required_name(value: &str, field: &'static str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField { field });
    }
    bounded(trimmed.to_string(), field, max)
}

fn name_field(fields: &Fields, key: &'static str, max: usize) -> Result<String, ValidationError> {
    let value = fields.get(key).unwrap_or(&Value::Null);
    required_name(&text(value, key)?, key, max)
}

/// Impact in `0..=5`; `null` and `""` reset to 0.
fn impact(value: &Value) -> Result<u8, ValidationError> {
    if value.is_null() || value.as_str().is_some_and(|s| s.trim().is_empty()) {
        return Ok(0);
    }
    let n = integer(value, "impact", true)?;
    u8::try_from(n)
        .ok()
        .filter(|n| *n <= IMPACT_MAX)
        .ok_or(ValidationError::ImpactOutOfRange)
}

fn status(value: &Value) -> Result<CardStatus, ValidationError> {
    value
        .as_str()
        .and_then(|s| CardStatus::parse(s.trim()))
        .ok_or(ValidationError::InvalidField {
            field: "status",
            expected: "one of draft, active, archived",
        })
}

fn column_kind(value: &Value) -> Result<ColumnKind, ValidationError> {
    value
        .as_str()
        .and_then(|s| ColumnKind::parse(s.trim()))
        .ok_or(ValidationError::InvalidField {
            field: "kind",
            expected: "one of normal, validated, archived",
        })
}

fn flag(value: &Value, field: &'static str) -> Result<bool, ValidationError> {
    value.as_bool().ok_or(ValidationError::InvalidField {
        field,
        expected: "a boolean",
    })
}

/// Clean a list of tag names: trim, strip leading `#`, drop empties and
/// case-insensitive repeats (first spelling wins), enforce the length limit.
pub fn normalize_tags<I, S>(names: I) -> Result<Vec<String>, ValidationError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for raw in names {
        let name = raw.as_ref().trim().trim_start_matches('#').trim();
        if name.is_empty() {
            continue;
        }
        if name.chars().count() > TAG_NAME_MAX {
            return Err(ValidationError::InvalidTag {
                name: name.to_string(),
                reason: "longer than 40 characters",
            });
        }
        let folded = name.to_lowercase();
        if out.iter().any(|t| t.to_lowercase() == folded) {
            continue;
        }
        out.push(name.to_string());
    }
    Ok(out)
}

/// Tags as a comma-separated string or a list of strings/numbers.
fn tags(value: &Value) -> Result<Vec<String>, ValidationError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => normalize_tags(s.split(',')),
        Value::Array(items) => {
            let mut names = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => names.push(s.clone()),
                    Value::Number(n) => names.push(n.to_string()),
                    _ => {
                        return Err(ValidationError::InvalidField {
                            field: "tags",
                            expected: "a comma-separated string or a list of names",
                        })
                    }
                }
            }
            normalize_tags(names)
        }
        _ => Err(ValidationError::InvalidField {
            field: "tags",
            expected: "a comma-separated string or a list of names",
        }),
    }
}

// ── ordering ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub destination_column_id: ColumnId,
    /// `None` appends to the destination.
    pub target_index: Option<i64>,
}

impl MoveRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let destination = first(
            fields,
            &["destination_column_id", "to_column_id", "column_id", "column"],
        )
        .ok_or(ValidationError::MissingField {
            field: "destination_column_id",
        })?;
        Ok(Self {
            destination_column_id: integer(destination, "destination_column_id", true)?,
            target_index: optional_integer(
                fields,
                &["target_index", "position", "order"],
                "target_index",
            )?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnReorderRequest {
    pub ordered_ids: Vec<CardId>,
}

impl ColumnReorderRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let raw = first(fields, &["ordered_ids", "orderedIds", "ids", "order"])
            .ok_or(ValidationError::MissingField {
                field: "ordered_ids",
            })?;

        // Form posts send the list JSON-encoded in a string.
        let decoded;
        let list = match raw {
            Value::String(s) => {
                decoded = serde_json::from_str::<Value>(s).map_err(|_| ValidationError::InvalidField {
                    field: "ordered_ids",
                    expected: "a list of integers",
                })?;
                &decoded
            }
            other => other,
        };
        let items = list.as_array().ok_or(ValidationError::InvalidField {
            field: "ordered_ids",
            expected: "a list of integers",
        })?;
        if items.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }

        let ordered_ids = items
            .iter()
            .map(|item| integer(item, "ordered_ids", true))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { ordered_ids })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReorderRequest {
    pub columns: Vec<ColumnOrder>,
}

impl BulkReorderRequest {
    /// Strict shape: `{ columns: [ { id: int, idea_ids: [int, ...] } ] }`.
    /// Ids must be JSON integers.
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let entries = match fields.get("columns") {
            None | Some(Value::Null) => return Ok(Self { columns: Vec::new() }),
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(ValidationError::InvalidField {
                    field: "columns",
                    expected: "a list of column objects",
                })
            }
        };

        let mut columns = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = entry.as_object().ok_or(ValidationError::InvalidField {
                field: "columns",
                expected: "a list of column objects",
            })?;
            let column_id = entry
                .get("id")
                .ok_or(ValidationError::MissingField { field: "id" })
                .and_then(|v| integer(v, "id", false))?;
            let card_ids = match entry.get("idea_ids") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Array(ids)) => ids
                    .iter()
                    .map(|id| integer(id, "idea_ids", false))
                    .collect::<Result<Vec<_>, _>>()?,
                Some(_) => {
                    return Err(ValidationError::InvalidField {
                        field: "idea_ids",
                        expected: "a list of integers",
                    })
                }
            };
            columns.push(ColumnOrder { column_id, card_ids });
        }
        Ok(Self { columns })
    }
}

// ── cards ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCardRequest {
    pub title: String,
    pub column_id: Option<ColumnId>,
    pub body_md: String,
    pub status: CardStatus,
    pub impact: u8,
    pub next_action: String,
    pub tags: Vec<String>,
    pub template_id: Option<TemplateId>,
}

impl NewCardRequest {
    pub fn titled(title: &str) -> Self {
        Self {
            title: title.to_string(),
            column_id: None,
            body_md: String::new(),
            status: CardStatus::default(),
            impact: 0,
            next_action: String::new(),
            tags: Vec::new(),
            template_id: None,
        }
    }

    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self {
            title: name_field(fields, "title", CARD_TITLE_MAX)?,
            column_id: optional_integer(fields, &["column_id", "column"], "column_id")?,
            body_md: optional_text(fields, "body_md", "body_md")?.unwrap_or_default(),
            status: fields
                .get("status")
                .filter(|v| !v.is_null())
                .map(status)
                .transpose()?
                .unwrap_or_default(),
            impact: fields.get("impact").map(impact).transpose()?.unwrap_or(0),
            next_action: bounded(
                optional_text(fields, "next_action", "next_action")?
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
                "next_action",
                NEXT_ACTION_MAX,
            )?,
            tags: fields.get("tags").map(tags).transpose()?.unwrap_or_default(),
            template_id: optional_integer(fields, &["template_id"], "template_id")?,
        })
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub body_md: Option<String>,
    pub next_action: Option<String>,
    pub impact: Option<u8>,
    pub status: Option<CardStatus>,
    pub tags: Option<Vec<String>>,
    pub column_id: Option<ColumnId>,
}

impl CardPatch {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let mut patch = CardPatch::default();

        if let Some(value) = fields.get("title") {
            patch.title = Some(required_name(&text(value, "title")?, "title", CARD_TITLE_MAX)?);
        }
        patch.body_md = optional_text(fields, "body_md", "body_md")?;
        if let Some(value) = optional_text(fields, "next_action", "next_action")? {
            patch.next_action = Some(bounded(value.trim().to_string(), "next_action", NEXT_ACTION_MAX)?);
        }
        patch.impact = fields.get("impact").map(impact).transpose()?;
        patch.status = fields.get("status").map(status).transpose()?;
        patch.tags = fields.get("tags").map(tags).transpose()?;
        if let Some(value) = fields.get("column_id") {
            patch.column_id = Some(integer(value, "column_id", true)?);
        }
        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        *self == CardPatch::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAddRequest {
    pub text: String,
    pub column_id: Option<ColumnId>,
}

impl QuickAddRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let raw = first(fields, &["text", "title"])
            .map(|v| text(v, "text"))
            .transpose()?
            .unwrap_or_default();
        let text = raw.trim();
        if text.is_empty() {
            return Err(ValidationError::MissingField { field: "text" });
        }
        Ok(Self {
            text: text.to_string(),
            column_id: optional_integer(fields, &["column_id"], "column_id")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub goals: Option<String>,
    pub scope: Option<String>,
    pub definition_of_done: Option<String>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<NaiveDate>>,
}

impl ProjectPatch {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let due_date = match fields.get("due_date") {
            None => None,
            Some(value) => {
                let raw = text(value, "due_date")?;
                let raw = raw.trim();
                if raw.is_empty() {
                    Some(None)
                } else {
                    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                        ValidationError::InvalidField {
                            field: "due_date",
                            expected: "a YYYY-MM-DD date",
                        }
                    })?;
                    Some(Some(date))
                }
            }
        };
        Ok(Self {
            goals: optional_text(fields, "goals", "goals")?,
            scope: optional_text(fields, "scope", "scope")?,
            definition_of_done: optional_text(fields, "definition_of_done", "definition_of_done")?,
            due_date,
        })
    }
}

// ── boards and templates ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBoardRequest {
    pub name: String,
    pub description: String,
    /// Create the default column set.
    pub default_columns: bool,
}

impl NewBoardRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self {
            name: name_field(fields, "name", BOARD_NAME_MAX)?,
            description: optional_text(fields, "description", "description")?.unwrap_or_default(),
            default_columns: fields
                .get("default_columns")
                .filter(|v| !v.is_null())
                .map(|v| flag(v, "default_columns"))
                .transpose()?
                .unwrap_or(true),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewColumnRequest {
    pub name: String,
    pub kind: ColumnKind,
}

impl NewColumnRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self {
            name: name_field(fields, "name", COLUMN_NAME_MAX)?,
            kind: fields
                .get("kind")
                .filter(|v| !v.is_null())
                .map(column_kind)
                .transpose()?
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTemplateRequest {
    pub name: String,
    pub description: String,
    pub body_md: String,
    pub is_active: bool,
}

impl NewTemplateRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let body_md = optional_text(fields, "body_md", "body_md")?.unwrap_or_default();
        if body_md.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "body_md" });
        }
        Ok(Self {
            name: name_field(fields, "name", TEMPLATE_NAME_MAX)?,
            description: optional_text(fields, "description", "description")?.unwrap_or_default(),
            body_md,
            is_active: fields
                .get("is_active")
                .filter(|v| !v.is_null())
                .map(|v| flag(v, "is_active"))
                .transpose()?
                .unwrap_or(true),
        })
    }
}

/// Save a card's body as a new template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveTemplateRequest {
    pub name: String,
    pub description: String,
}

impl SaveTemplateRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        Ok(Self {
            name: name_field(fields, "name", TEMPLATE_NAME_MAX)?,
            description: optional_text(fields, "description", "description")?.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyTemplateRequest {
    pub template_id: TemplateId,
}

impl ApplyTemplateRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let template_id = optional_integer(fields, &["template_id", "template"], "template_id")?
            .ok_or(ValidationError::MissingField {
                field: "template_id",
            })?;
        Ok(Self { template_id })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentBoardRequest {
    pub board_id: BoardId,
}

impl CurrentBoardRequest {
    pub fn from_value(body: &Value) -> Result<Self, ValidationError> {
        let fields = object(body)?;
        let board_id = optional_integer(fields, &["board_id", "board"], "board_id")?
            .ok_or(ValidationError::MissingField { field: "board_id" })?;
        Ok(Self { board_id })
    }
}
