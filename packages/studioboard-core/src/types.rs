use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type BoardId = i64;
pub type ColumnId = i64;
pub type CardId = i64;
pub type TagId = i64;
pub type ProjectId = i64;
pub type TemplateId = i64;

/// Field limits shared by validation and the schema.
pub const BOARD_NAME_MAX: usize = 120;
pub const COLUMN_NAME_MAX: usize = 80;
pub const CARD_TITLE_MAX: usize = 180;
pub const NEXT_ACTION_MAX: usize = 200;
pub const TAG_NAME_MAX: usize = 40;
pub const TEMPLATE_NAME_MAX: usize = 120;
pub const IMPACT_MAX: u8 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Routing tag for a column. Converted cards land in the first `Validated`
/// column of their board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    #[default]
    Normal,
    Validated,
    Archived,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Normal => "normal",
            ColumnKind::Validated => "validated",
            ColumnKind::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "normal" => Some(ColumnKind::Normal),
            "validated" => Some(ColumnKind::Validated),
            "archived" => Some(ColumnKind::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub name: String,
    pub order: u32,
    pub kind: ColumnKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Draft,
    #[default]
    Active,
    Archived,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Draft => "draft",
            CardStatus::Active => "active",
            CardStatus::Archived => "archived",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(CardStatus::Draft),
            "active" => Some(CardStatus::Active),
            "archived" => Some(CardStatus::Archived),
            _ => None,
        }
    }
}

/// A card ("idea") as stored. `position` is its zero-based rank inside
/// `column_id`; positions of a column are always `0..len`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub column_id: ColumnId,
    pub title: String,
    pub body_md: String,
    pub status: CardStatus,
    pub position: u32,
    pub impact: u8,
    pub next_action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
}

/// Project extension created when a card is converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub card_id: CardId,
    pub goals: String,
    pub scope: String,
    pub definition_of_done: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaTemplate {
    pub id: TemplateId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub body_md: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a card. Position is assigned by storage.
#[derive(Debug, Clone, PartialEq)]
pub struct CardDraft {
    pub column_id: ColumnId,
    pub title: String,
    pub body_md: String,
    pub status: CardStatus,
    pub impact: u8,
    pub next_action: String,
}

/// One `(card, column, position)` triple written by the bulk reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub card_id: CardId,
    pub column_id: ColumnId,
    pub position: u32,
}

// ── Read models returned to callers ─────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRef {
    pub id: BoardId,
    pub name: String,
}

impl From<&Board> for BoardRef {
    fn from(board: &Board) -> Self {
        Self {
            id: board.id,
            name: board.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRef {
    pub id: ColumnId,
    pub name: String,
}

/// Light card shape used in kanban listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSummary {
    pub id: CardId,
    pub title: String,
    pub status: CardStatus,
    pub impact: u8,
    pub next_action: String,
    pub position: u32,
    pub converted: bool,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

impl CardSummary {
    pub fn new(card: &Card, tags: Vec<String>) -> Self {
        Self {
            id: card.id,
            title: card.title.clone(),
            status: card.status,
            impact: card.impact,
            next_action: card.next_action.clone(),
            position: card.position,
            converted: card.converted_at.is_some(),
            updated_at: card.updated_at,
            tags,
        }
    }
}

/// Full card shape for the detail and edit views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDetail {
    pub id: CardId,
    pub title: String,
    pub body_md: String,
    pub status: CardStatus,
    pub impact: u8,
    pub next_action: String,
    pub position: u32,
    pub column: ColumnRef,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnView {
    pub id: ColumnId,
    pub name: String,
    pub order: u32,
    pub kind: ColumnKind,
    pub ideas: Vec<CardSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KanbanView {
    pub board: BoardRef,
    pub columns: Vec<ColumnView>,
}

/// Final placement of a card after a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovedCard {
    pub id: CardId,
    pub column_id: ColumnId,
    pub position: u32,
}
