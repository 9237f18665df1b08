use serde::Serialize;

use super::{clamp_target, normalize_column, rank};
use crate::error::{BoardError, Resource, Result};
use crate::storage::{BoardStore, StoreTx};
use crate::types::{BoardId, CardId, ColumnId, MovedCard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub card: MovedCard,
    pub from_column_id: ColumnId,
}

/// Move one card to `target_index` of `destination_column_id` (append when
/// `None`) in a single write transaction.
pub fn move_card<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    card_id: CardId,
    destination_column_id: ColumnId,
    target_index: Option<i64>,
) -> Result<MoveOutcome> {
    store.write(|tx| move_card_tx(tx, board_id, card_id, destination_column_id, target_index))
}

pub(crate) fn move_card_tx(
    tx: &mut dyn StoreTx,
    board_id: BoardId,
    card_id: CardId,
    destination_column_id: ColumnId,
    target_index: Option<i64>,
) -> Result<MoveOutcome> {
    if tx.board_of_card(card_id)? != Some(board_id) {
        return Err(BoardError::not_found(Resource::Card));
    }
    let card = tx
        .card(card_id)?
        .ok_or(BoardError::not_found(Resource::Card))?;
    let destination = tx
        .column(destination_column_id)?
        .filter(|c| c.board_id == board_id)
        .ok_or(BoardError::not_found(Resource::Column))?;

    let mut dest_ids = tx.ordered_card_ids(destination.id, Some(card_id))?;
    let index = clamp_target(target_index, dest_ids.len());
    if let Some(requested) = target_index {
        if requested < 0 || requested as u64 > dest_ids.len() as u64 {
            log::warn!(
                "[studioboard.ordering.move] card {}: target {} clamped to {}",
                card_id,
                requested,
                index
            );
        }
    }

    let source_id = card.column_id;
    let final_index = if source_id == destination.id {
        let full = tx.ordered_card_ids(source_id, None)?;
        let current = full.iter().position(|id| *id == card_id).unwrap_or(full.len());
        // A later requested slot counts the card itself; omitted means append.
        let insert_at = match target_index {
            Some(requested) if requested > current as i64 => index.saturating_sub(1),
            _ => index,
        };
        dest_ids.insert(insert_at, card_id);
        normalize_column(tx, source_id, Some(&dest_ids))?;
        insert_at
    } else {
        dest_ids.insert(index, card_id);
        tx.relocate_card(card_id, destination.id, rank(index))?;
        normalize_column(tx, source_id, None)?;
        normalize_column(tx, destination.id, Some(&dest_ids))?;
        index
    };

    log::debug!(
        "[studioboard.ordering.move] card {} column {} -> {} at {}",
        card_id,
        source_id,
        destination.id,
        final_index
    );

    Ok(MoveOutcome {
        card: MovedCard {
            id: card_id,
            column_id: destination.id,
            position: rank(final_index),
        },
        from_column_id: source_id,
    })
}
