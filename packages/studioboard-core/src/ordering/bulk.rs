use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::rank;
use crate::error::{BoardError, Resource, Result, ValidationError};
use crate::storage::{BoardStore, StoreTx};
use crate::types::{BoardId, CardId, ColumnId, Placement};

/// One column of a whole-board reorder payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnOrder {
    pub column_id: ColumnId,
    pub card_ids: Vec<CardId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub columns: usize,
    pub cards: usize,
    /// Cards whose column changed.
    pub moved: usize,
}

/// Replace the layout of a whole board.
///
/// The payload must name only columns of the board, each at most once, and
/// list every card of the board exactly once. Nothing is written unless all
/// checks pass; columns left out of the payload end up empty.
pub fn reconcile_board<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    layout: &[ColumnOrder],
) -> Result<ReconcileOutcome> {
    store.write(|tx| reconcile_board_tx(tx, board_id, layout))
}

pub(crate) fn reconcile_board_tx(
    tx: &mut dyn StoreTx,
    board_id: BoardId,
    layout: &[ColumnOrder],
) -> Result<ReconcileOutcome> {
    tx.board(board_id)?
        .ok_or(BoardError::not_found(Resource::Board))?;

    let board_columns: HashSet<ColumnId> = tx.columns(board_id)?.iter().map(|c| c.id).collect();
    let mut seen_columns = HashSet::new();
    for entry in layout {
        if !board_columns.contains(&entry.column_id) {
            return Err(BoardError::not_found(Resource::Column));
        }
        if !seen_columns.insert(entry.column_id) {
            return Err(ValidationError::DuplicateColumn(entry.column_id).into());
        }
    }

    let current: HashMap<CardId, ColumnId> = tx
        .board_cards(board_id)?
        .into_iter()
        .map(|card| (card.id, card.column_id))
        .collect();
    let mut seen_cards = HashSet::with_capacity(current.len());
    let mut placements = Vec::with_capacity(current.len());
    let mut moved = 0;
    for entry in layout {
        for (index, card_id) in entry.card_ids.iter().enumerate() {
            if !seen_cards.insert(*card_id) {
                return Err(ValidationError::DuplicateCard(*card_id).into());
            }
            let Some(column_id) = current.get(card_id) else {
                log::warn!(
                    "[studioboard.ordering.bulk] board {}: payload names a card outside the board",
                    board_id
                );
                return Err(BoardError::not_found(Resource::Card));
            };
            if *column_id != entry.column_id {
                moved += 1;
            }
            placements.push(Placement {
                card_id: *card_id,
                column_id: entry.column_id,
                position: rank(index),
            });
        }
    }

    let mut missing: Vec<CardId> = current
        .keys()
        .filter(|id| !seen_cards.contains(*id))
        .copied()
        .collect();
    if !missing.is_empty() {
        missing.sort_unstable();
        log::warn!(
            "[studioboard.ordering.bulk] board {}: payload omits {} card(s)",
            board_id,
            missing.len()
        );
        return Err(ValidationError::MissingCards(missing).into());
    }

    let written = tx.place_cards(&placements)?;
    log::debug!(
        "[studioboard.ordering.bulk] board {} reconciled: {} columns, {} cards, {} moved",
        board_id,
        layout.len(),
        written,
        moved
    );

    Ok(ReconcileOutcome {
        columns: layout.len(),
        cards: written,
        moved,
    })
}
