use crate::storage::StorageError;
use crate::types::{CardId, ColumnId};

pub type Result<T> = std::result::Result<T, BoardError>;

/// Outcome classes surfaced by every board operation.
///
/// `NotFound` covers both "absent" and "belongs to another board" so callers
/// cannot probe for ids outside the board they address.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("{0} not found")]
    NotFound(Resource),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("concurrent update conflict, retry the operation")]
    Conflict,

    #[error("storage failure: {0}")]
    Storage(StorageError),
}

impl BoardError {
    pub fn not_found(resource: Resource) -> Self {
        BoardError::NotFound(resource)
    }

    /// True when re-running the whole operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, BoardError::Conflict)
    }
}

impl From<StorageError> for BoardError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Busy => BoardError::Conflict,
            other => BoardError::Storage(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Board,
    Column,
    Card,
    Project,
    Template,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Resource::Board => "board",
            Resource::Column => "column",
            Resource::Card => "idea",
            Resource::Project => "project",
            Resource::Template => "template",
        };
        f.write_str(name)
    }
}

/// One variant per rejected input condition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("{field} must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("ordered_ids must be a non-empty list")]
    EmptyOrder,

    #[error("idea {0} is listed more than once")]
    DuplicateCard(CardId),

    #[error("column {0} is listed more than once")]
    DuplicateColumn(ColumnId),

    #[error("idea {0} does not belong to this column")]
    CardNotInColumn(CardId),

    #[error("payload omits {} idea(s) of this board", .0.len())]
    MissingCards(Vec<CardId>),

    #[error("impact must be between 0 and 5")]
    ImpactOutOfRange,

    #[error("invalid tag {name:?}: {reason}")]
    InvalidTag { name: String, reason: &'static str },

    #[error("name {0:?} is already taken")]
    NameTaken(String),

    #[error("board has no columns")]
    BoardHasNoColumns,

    #[error("idea already converted")]
    AlreadyConverted,

    #[error("idea has not been converted")]
    NotConverted,

    #[error("no validated column found on this board")]
    NoValidatedColumn,

    #[error("idea has no markdown content to save")]
    EmptyBody,

    #[error("template is not active")]
    TemplateInactive,
}
