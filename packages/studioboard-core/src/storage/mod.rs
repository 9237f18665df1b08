pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Abstract storage for boards.
/// Implementations: SqliteStorage (single file or in-memory database).
///
/// Every board operation runs inside exactly one call to `read` or `write`.
/// `write` must serialize against other writers from its first statement so
/// that ordered reads taken inside it stay valid until commit; `Err` from the
/// closure rolls everything back.
pub trait BoardStore: Send + Sync {
    /// Run `f` against a consistent read snapshot.
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>;

    /// Run `f` inside one all-or-nothing write transaction.
    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T>;
}

/// Row-level operations available inside a transaction.
pub trait StoreTx {
    // ── boards ──────────────────────────────────────────────────────────
    fn board(&self, id: BoardId) -> Result<Option<Board>>;
    fn board_by_name(&self, name: &str) -> Result<Option<Board>>;
    fn boards(&self) -> Result<Vec<Board>>;
    fn insert_board(&mut self, name: &str, description: &str, now: DateTime<Utc>) -> Result<Board>;

    // ── columns ─────────────────────────────────────────────────────────
    fn column(&self, id: ColumnId) -> Result<Option<Column>>;
    /// Columns of a board ordered by `(order, id)`.
    fn columns(&self, board_id: BoardId) -> Result<Vec<Column>>;
    fn insert_column(
        &mut self,
        board_id: BoardId,
        name: &str,
        order: u32,
        kind: ColumnKind,
    ) -> Result<Column>;
    fn set_column_order(&mut self, column_id: ColumnId, order: u32) -> Result<()>;

    // ── cards ───────────────────────────────────────────────────────────
    fn card(&self, id: CardId) -> Result<Option<Card>>;
    /// Board owning the card's column, if the card exists.
    fn board_of_card(&self, id: CardId) -> Result<Option<BoardId>>;
    /// Card ids of a column ordered by `(position, id)`, optionally leaving
    /// one card out.
    fn ordered_card_ids(&self, column_id: ColumnId, excluding: Option<CardId>) -> Result<Vec<CardId>>;
    fn board_card_ids(&self, board_id: BoardId) -> Result<Vec<CardId>>;
    /// Cards of a board in column display order, then `(position, id)`.
    fn board_cards(&self, board_id: BoardId) -> Result<Vec<Card>>;
    fn max_position(&self, column_id: ColumnId) -> Result<Option<u32>>;
    fn insert_card(&mut self, draft: &CardDraft, position: u32, now: DateTime<Utc>) -> Result<Card>;
    /// Persist descriptive fields. Column and position are left untouched.
    fn update_card(&mut self, card: &Card) -> Result<()>;
    /// Set a card's position only if it still lives in `column_id`.
    /// Returns whether a row was updated.
    fn set_card_position(&mut self, card_id: CardId, column_id: ColumnId, position: u32) -> Result<bool>;
    /// Set a card's column and position unconditionally.
    fn relocate_card(&mut self, card_id: CardId, column_id: ColumnId, position: u32) -> Result<()>;
    /// Batched relocation of many cards. Returns the number of rows written.
    fn place_cards(&mut self, placements: &[Placement]) -> Result<usize>;
    fn delete_card(&mut self, card_id: CardId) -> Result<bool>;

    // ── tags ────────────────────────────────────────────────────────────
    /// Get the tag named exactly `name`, creating it on first use.
    fn ensure_tag(&mut self, name: &str, now: DateTime<Utc>) -> Result<Tag>;
    fn tags(&self) -> Result<Vec<Tag>>;
    /// Tag names of a card ordered by name.
    fn card_tags(&self, card_id: CardId) -> Result<Vec<String>>;
    fn set_card_tags(&mut self, card_id: CardId, tag_ids: &[TagId]) -> Result<()>;

    // ── projects ────────────────────────────────────────────────────────
    fn project_for_card(&self, card_id: CardId) -> Result<Option<Project>>;
    fn insert_project(&mut self, card_id: CardId, now: DateTime<Utc>) -> Result<Project>;
    fn update_project(&mut self, project: &Project) -> Result<()>;

    // ── templates ───────────────────────────────────────────────────────
    fn template(&self, id: TemplateId) -> Result<Option<IdeaTemplate>>;
    fn template_by_name(&self, name: &str) -> Result<Option<IdeaTemplate>>;
    /// Templates ordered active-first, then by name.
    fn templates(&self, active_only: bool) -> Result<Vec<IdeaTemplate>>;
    fn insert_template(
        &mut self,
        name: &str,
        description: &str,
        body_md: &str,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<IdeaTemplate>;
    fn set_template_active(&mut self, id: TemplateId, is_active: bool) -> Result<()>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database is busy or locked")]
    Busy,

    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, ref message) = err {
            match failure.code {
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    return StorageError::Busy;
                }
                rusqlite::ErrorCode::ConstraintViolation => {
                    return StorageError::Constraint(
                        message.clone().unwrap_or_else(|| failure.to_string()),
                    );
                }
                _ => {}
            }
        }
        StorageError::Sqlite(err)
    }
}

impl From<rusqlite::Error> for crate::error::BoardError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::from(err).into()
    }
}
