//! Boards, columns and the kanban read model.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;

use crate::error::{BoardError, Resource, Result, ValidationError};
use crate::ideas::board_exists;
use crate::requests::{required_name, NewBoardRequest, NewColumnRequest};
use crate::search::KanbanFilter;
use crate::storage::{BoardStore, StoreTx};
use crate::types::*;

/// Column set every new idea board starts with.
pub const DEFAULT_COLUMNS: [(&str, ColumnKind); 5] = [
    ("Ideas", ColumnKind::Normal),
    ("To explore", ColumnKind::Normal),
    ("Thinking", ColumnKind::Normal),
    ("Validated", ColumnKind::Validated),
    ("Archived", ColumnKind::Archived),
];

const SEED_DESCRIPTION: &str = "Kanban board for capturing and sorting ideas.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSetup {
    pub board: Board,
    pub columns: Vec<Column>,
}

pub fn list_boards<S: BoardStore>(store: &S) -> Result<Vec<Board>> {
    store.read(|tx| tx.boards())
}

pub fn list_tags<S: BoardStore>(store: &S) -> Result<Vec<Tag>> {
    store.read(|tx| tx.tags())
}

fn insert_defaults(tx: &mut dyn StoreTx, board_id: BoardId) -> Result<Vec<Column>> {
    let mut columns = Vec::with_capacity(DEFAULT_COLUMNS.len());
    for (order, (name, kind)) in DEFAULT_COLUMNS.iter().enumerate() {
        columns.push(tx.insert_column(board_id, name, order as u32, *kind)?);
    }
    Ok(columns)
}

pub fn create_board<S: BoardStore>(store: &S, req: &NewBoardRequest) -> Result<BoardSetup> {
    let name = required_name(&req.name, "name", BOARD_NAME_MAX)?;
    store.write(|tx| {
        if tx.board_by_name(&name)?.is_some() {
            return Err(ValidationError::NameTaken(name.clone()).into());
        }
        let board = tx.insert_board(&name, &req.description, Utc::now())?;
        let columns = if req.default_columns {
            insert_defaults(tx, board.id)?
        } else {
            Vec::new()
        };
        log::info!(
            "[studioboard.boards] created board {:?} ({}) with {} columns",
            board.name,
            board.id,
            columns.len()
        );
        Ok(BoardSetup { board, columns })
    })
}

pub fn add_column<S: BoardStore>(store: &S, board_id: BoardId, req: &NewColumnRequest) -> Result<Column> {
    let name = required_name(&req.name, "name", COLUMN_NAME_MAX)?;
    store.write(|tx| {
        board_exists(&*tx, board_id)?;
        let columns = tx.columns(board_id)?;
        if columns.iter().any(|c| c.name == name) {
            return Err(ValidationError::NameTaken(name.clone()).into());
        }
        let order = columns.iter().map(|c| c.order + 1).max().unwrap_or(0);
        Ok(tx.insert_column(board_id, &name, order, req.kind)?)
    })
}

/// Get or create `name` with the default columns, realigning the order of
/// existing columns to the default list. Other columns keep their relative
/// order after the defaults.
pub fn seed_board<S: BoardStore>(store: &S, name: &str) -> Result<BoardSetup> {
    let name = required_name(name, "name", BOARD_NAME_MAX)?;
    store.write(|tx| {
        let board = match tx.board_by_name(&name)? {
            Some(board) => board,
            None => {
                let board = tx.insert_board(&name, SEED_DESCRIPTION, Utc::now())?;
                let columns = insert_defaults(tx, board.id)?;
                log::info!("[studioboard.boards.seed] created board {:?}", board.name);
                return Ok(BoardSetup { board, columns });
            }
        };

        let existing = tx.columns(board.id)?;
        let mut by_name: HashMap<&str, &Column> =
            existing.iter().map(|c| (c.name.as_str(), c)).collect();

        // Orders are unique per board: park every column above both the
        // current orders and the final slots before reassigning.
        let park = existing.iter().map(|c| c.order + 1).max().unwrap_or(0)
            + (DEFAULT_COLUMNS.len() + existing.len()) as u32;
        for (offset, column) in existing.iter().enumerate() {
            tx.set_column_order(column.id, park + offset as u32)?;
        }

        let mut slot = 0u32;
        for (name, kind) in DEFAULT_COLUMNS {
            match by_name.remove(name) {
                Some(column) => tx.set_column_order(column.id, slot)?,
                None => {
                    tx.insert_column(board.id, name, slot, kind)?;
                }
            }
            slot += 1;
        }
        for column in &existing {
            if by_name.contains_key(column.name.as_str()) {
                tx.set_column_order(column.id, slot)?;
                slot += 1;
            }
        }

        let columns = tx.columns(board.id)?;
        log::info!(
            "[studioboard.boards.seed] board {:?} realigned ({} columns)",
            board.name,
            columns.len()
        );
        Ok(BoardSetup { board, columns })
    })
}

/// Board with its columns and filtered card summaries in display order.
pub fn kanban<S: BoardStore>(store: &S, board_id: BoardId, filter: &KanbanFilter) -> Result<KanbanView> {
    store.read(|tx| {
        let board = tx
            .board(board_id)?
            .ok_or(BoardError::not_found(Resource::Board))?;
        let columns = tx.columns(board_id)?;

        let mut by_column: HashMap<ColumnId, Vec<CardSummary>> = HashMap::new();
        for card in tx.board_cards(board_id)? {
            if !filter.includes_column(card.column_id) {
                continue;
            }
            let tags = tx.card_tags(card.id)?;
            if !filter.matches(&card, &tags) {
                continue;
            }
            by_column
                .entry(card.column_id)
                .or_default()
                .push(CardSummary::new(&card, tags));
        }

        let columns = columns
            .into_iter()
            .filter(|c| filter.includes_column(c.id))
            .map(|c| ColumnView {
                ideas: by_column.remove(&c.id).unwrap_or_default(),
                id: c.id,
                name: c.name,
                order: c.order,
                kind: c.kind,
            })
            .collect();

        Ok(KanbanView {
            board: BoardRef::from(&board),
            columns,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideas::create_card;
    use crate::requests::NewCardRequest;
    use crate::testing::*;

    fn new_board(name: &str, default_columns: bool) -> NewBoardRequest {
        NewBoardRequest {
            name: name.to_string(),
            description: String::new(),
            default_columns,
        }
    }

    #[test]
    fn test_create_board_with_defaults() {
        let store = storage();
        let setup = create_board(&store, &new_board("Studio", true)).unwrap();
        let names: Vec<&str> = setup.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Ideas", "To explore", "Thinking", "Validated", "Archived"]);
        assert_eq!(setup.columns[3].kind, ColumnKind::Validated);

        let err = create_board(&store, &new_board("Studio", false)).unwrap_err();
        assert!(matches!(err, BoardError::Validation(ValidationError::NameTaken(_))));
        assert_eq!(list_boards(&store).unwrap().len(), 1);
    }

    #[test]
    fn test_add_column_appends() {
        let store = storage();
        let setup = create_board(&store, &new_board("Studio", false)).unwrap();
        let req = |name: &str| NewColumnRequest {
            name: name.to_string(),
            kind: ColumnKind::Normal,
        };
        let first = add_column(&store, setup.board.id, &req("One")).unwrap();
        let second = add_column(&store, setup.board.id, &req("Two")).unwrap();
        assert_eq!((first.order, second.order), (0, 1));
        let err = add_column(&store, setup.board.id, &req("One")).unwrap_err();
        assert!(matches!(err, BoardError::Validation(ValidationError::NameTaken(_))));
        let err = add_column(&store, setup.board.id + 1, &req("Three")).unwrap_err();
        assert!(matches!(err, BoardError::NotFound(Resource::Board)));
    }

    #[test]
    fn test_seed_is_idempotent_and_realigns() {
        let store = storage();
        let (board, _) = store
            .write(|tx| {
                let board = tx.insert_board("Ideas board", "", Utc::now())?;
                let extra = tx.insert_column(board.id, "Someday", 0, ColumnKind::Normal)?;
                tx.insert_column(board.id, "Thinking", 1, ColumnKind::Normal)?;
                Ok((board.id, extra.id))
            })
            .unwrap();

        let setup = seed_board(&store, "Ideas board").unwrap();
        assert_eq!(setup.board.id, board);
        let names: Vec<&str> = setup.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Ideas", "To explore", "Thinking", "Validated", "Archived", "Someday"]
        );
        let orders: Vec<u32> = setup.columns.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4, 5]);

        let again = seed_board(&store, "Ideas board").unwrap();
        assert_eq!(again.columns, setup.columns);
    }

    #[test]
    fn test_kanban_filters() {
        let store = storage();
        let setup = create_board(&store, &new_board("Studio", true)).unwrap();
        let board = setup.board.id;
        let mut req = NewCardRequest::titled("Café podcast");
        req.tags = vec!["Audio".to_string()];
        create_card(&store, board, &req).unwrap();
        req = NewCardRequest::titled("Poster");
        req.column_id = Some(setup.columns[1].id);
        create_card(&store, board, &req).unwrap();

        let view = kanban(&store, board, &KanbanFilter::default()).unwrap();
        assert_eq!(view.columns.len(), 5);
        assert_eq!(view.columns[0].ideas.len(), 1);
        assert_eq!(view.columns[1].ideas[0].title, "Poster");

        let view = kanban(&store, board, &KanbanFilter::new(Some("cafe"), None, None)).unwrap();
        let titles: Vec<&str> = view
            .columns
            .iter()
            .flat_map(|c| c.ideas.iter().map(|i| i.title.as_str()))
            .collect();
        assert_eq!(titles, vec!["Café podcast"]);

        let view = kanban(&store, board, &KanbanFilter::new(None, Some("audio"), None)).unwrap();
        assert_eq!(view.columns[0].ideas[0].tags, vec!["Audio".to_string()]);
        assert!(view.columns[1].ideas.is_empty());

        let view = kanban(
            &store,
            board,
            &KanbanFilter::new(None, None, Some(setup.columns[1].id)),
        )
        .unwrap();
        assert_eq!(view.columns.len(), 1);

        let err = kanban(&store, board + 1, &KanbanFilter::default()).unwrap_err();
        assert!(matches!(err, BoardError::NotFound(Resource::Board)));
    }

    #[test]
    fn test_list_tags() {
        let store = storage();
        let (board, _) = board_with(&store, &["A"]);
        let mut req = NewCardRequest::titled("x");
        req.tags = vec!["b".to_string(), "a".to_string()];
        create_card(&store, board, &req).unwrap();
        let names: Vec<String> = list_tags(&store).unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
