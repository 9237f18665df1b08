//! Fixtures shared by the unit tests.
use chrono::Utc;

use crate::storage::sqlite::SqliteStorage;
use crate::storage::BoardStore;
use crate::types::*;

pub(crate) fn storage() -> SqliteStorage {
    SqliteStorage::open_in_memory().unwrap()
}

/// Board named "Test" with one normal column per name.
pub(crate) fn board_with(store: &SqliteStorage, columns: &[&str]) -> (BoardId, Vec<ColumnId>) {
    store
        .write(|tx| {
            let board = tx.insert_board("Test", "", Utc::now())?;
            let mut ids = Vec::new();
            for (order, name) in columns.iter().enumerate() {
                let col = tx.insert_column(board.id, name, order as u32, ColumnKind::Normal)?;
                ids.push(col.id);
            }
            Ok((board.id, ids))
        })
        .unwrap()
}

/// Append cards to the end of a column.
pub(crate) fn cards(store: &SqliteStorage, column_id: ColumnId, titles: &[&str]) -> Vec<CardId> {
    store
        .write(|tx| {
            let mut ids = Vec::new();
            for title in titles {
                let position = tx.max_position(column_id)?.map_or(0, |p| p + 1);
                let draft = CardDraft {
                    column_id,
                    title: title.to_string(),
                    body_md: String::new(),
                    status: CardStatus::Active,
                    impact: 0,
                    next_action: String::new(),
                };
                ids.push(tx.insert_card(&draft, position, Utc::now())?.id);
            }
            Ok(ids)
        })
        .unwrap()
}

pub(crate) fn column_order(store: &SqliteStorage, column_id: ColumnId) -> Vec<CardId> {
    store
        .read(|tx| tx.ordered_card_ids(column_id, None))
        .unwrap()
}

pub(crate) fn positions(store: &SqliteStorage, column_id: ColumnId) -> Vec<(CardId, u32)> {
    store
        .read(|tx| {
            let mut out = Vec::new();
            for id in tx.ordered_card_ids(column_id, None)? {
                if let Some(card) = tx.card(id)? {
                    out.push((id, card.position));
                }
            }
            Ok(out)
        })
        .unwrap()
}

/// Every column of the board holds positions exactly `0..len`.
pub(crate) fn assert_contiguous(store: &SqliteStorage, board_id: BoardId) {
    let (columns, cards) = store
        .read(|tx| Ok((tx.columns(board_id)?, tx.board_cards(board_id)?)))
        .unwrap();
    for column in columns {
        let mut found: Vec<u32> = cards
            .iter()
            .filter(|c| c.column_id == column.id)
            .map(|c| c.position)
            .collect();
        found.sort_unstable();
        let expected: Vec<u32> = (0..found.len() as u32).collect();
        assert_eq!(found, expected, "column {} is not contiguous", column.name);
    }
}
