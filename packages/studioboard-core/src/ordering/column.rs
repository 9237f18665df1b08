use std::collections::HashSet;

use super::normalize_column;
use crate::error::{BoardError, Resource, Result, ValidationError};
use crate::storage::{BoardStore, StoreTx};
use crate::types::{BoardId, CardId, ColumnId};

/// Apply a client ordering to one column.
///
/// The proposal must be non-empty, duplicate-free and contain only cards of
/// the column. Cards of the column it leaves out are appended in their prior
/// relative order. Returns the completed ordering.
pub fn reorder_column<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    column_id: ColumnId,
    proposed: &[CardId],
) -> Result<Vec<CardId>> {
    store.write(|tx| reorder_column_tx(tx, board_id, column_id, proposed))
}

pub(crate) fn reorder_column_tx(
    tx: &mut dyn StoreTx,
    board_id: BoardId,
    column_id: ColumnId,
    proposed: &[CardId],
) -> Result<Vec<CardId>> {
    tx.column(column_id)?
        .filter(|c| c.board_id == board_id)
        .ok_or(BoardError::not_found(Resource::Column))?;

    if proposed.is_empty() {
        return Err(ValidationError::EmptyOrder.into());
    }

    let mut listed = HashSet::with_capacity(proposed.len());
    for id in proposed {
        if !listed.insert(*id) {
            return Err(ValidationError::DuplicateCard(*id).into());
        }
    }

    let current = tx.ordered_card_ids(column_id, None)?;
    let members: HashSet<CardId> = current.iter().copied().collect();
    for id in proposed {
        if members.contains(id) {
            continue;
        }
        // Another column of this board is a validation error; any other id
        // collapses to not-found.
        return Err(if tx.board_of_card(*id)? == Some(board_id) {
            ValidationError::CardNotInColumn(*id).into()
        } else {
            BoardError::not_found(Resource::Card)
        });
    }

    let mut completed = proposed.to_vec();
    let before = completed.len();
    completed.extend(current.iter().filter(|id| !listed.contains(*id)));
    if completed.len() > before {
        log::warn!(
            "[studioboard.ordering.column] column {}: appended {} omitted card(s)",
            column_id,
            completed.len() - before
        );
    }

    let applied = normalize_column(tx, column_id, Some(&completed))?;
    log::debug!(
        "[studioboard.ordering.column] column {} reordered ({} cards)",
        column_id,
        applied.len()
    );
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn test_full_reorder() {
        let store = storage();
        let (board, cols) = board_with(&store, &["A"]);
        let ids = cards(&store, cols[0], &["X", "Y", "Z"]);

        let order = vec![ids[2], ids[0], ids[1]];
        let applied = reorder_column(&store, board, cols[0], &order).unwrap();
        assert_eq!(applied, order);
        assert_eq!(
            positions(&store, cols[0]),
            vec![(ids[2], 0), (ids[0], 1), (ids[1], 2)]
        );
        assert_contiguous(&store, board);
    }

    #[test]
    fn test_omitted_cards_are_appended() {
        let store = storage();
        let (board, cols) = board_with(&store, &["A"]);
        let ids = cards(&store, cols[0], &["W", "X", "Y", "Z"]);

        let applied = reorder_column(&store, board, cols[0], &[ids[3], ids[1]]).unwrap();
        assert_eq!(applied, vec![ids[3], ids[1], ids[0], ids[2]]);
        assert_eq!(column_order(&store, cols[0]), applied);
        assert_contiguous(&store, board);
    }

    #[test]
    fn test_duplicate_rejected_without_writes() {
        let store = storage();
        let (board, cols) = board_with(&store, &["A"]);
        let ids = cards(&store, cols[0], &["X", "Y"]);

        let err = reorder_column(&store, board, cols[0], &[ids[1], ids[1], ids[0]]).unwrap_err();
        assert!(matches!(
            err,
            BoardError::Validation(ValidationError::DuplicateCard(id)) if id == ids[1]
        ));
        assert_eq!(column_order(&store, cols[0]), ids);
    }

    #[test]
    fn test_empty_rejected() {
        let store = storage();
        let (board, cols) = board_with(&store, &["A"]);
        let err = reorder_column(&store, board, cols[0], &[]).unwrap_err();
        assert!(matches!(err, BoardError::Validation(ValidationError::EmptyOrder)));
    }

    #[test]
    fn test_card_from_other_column_or_board() {
        let store = storage();
        let (board, cols) = board_with(&store, &["A", "B"]);
        let a = cards(&store, cols[0], &["X"]);
        let b = cards(&store, cols[1], &["M"]);

        let err = reorder_column(&store, board, cols[0], &[a[0], b[0]]).unwrap_err();
        assert!(matches!(
            err,
            BoardError::Validation(ValidationError::CardNotInColumn(id)) if id == b[0]
        ));
        let err = reorder_column(&store, board, cols[0], &[a[0], 4242]).unwrap_err();
        assert!(matches!(err, BoardError::NotFound(Resource::Card)));
        let err = reorder_column(&store, board + 1, cols[0], &[a[0]]).unwrap_err();
        assert!(matches!(err, BoardError::NotFound(Resource::Column)));
    }
}
