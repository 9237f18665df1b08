use super::rank;
use crate::error::Result;
use crate::storage::StoreTx;
use crate::types::{CardId, ColumnId};

/// Assign `position = index` to each card of `column_id`.
///
/// With `ordered = None` the current `(position, id)` order is used, which
/// repairs gaps and ties left by earlier writers. Updates are filtered by
/// column, so ids that no longer live there are skipped without leaving a
/// hole and membership is never changed. Returns the sequence that was
/// applied.
pub fn normalize_column(
    tx: &mut dyn StoreTx,
    column_id: ColumnId,
    ordered: Option<&[CardId]>,
) -> Result<Vec<CardId>> {
    let ids = match ordered {
        Some(ids) => ids.to_vec(),
        None => tx.ordered_card_ids(column_id, None)?,
    };

    let mut applied = Vec::with_capacity(ids.len());
    for card_id in &ids {
        if tx.set_card_position(*card_id, column_id, rank(applied.len()))? {
            applied.push(*card_id);
        }
    }
    let skipped = ids.len() - applied.len();
    if skipped > 0 {
        log::warn!(
            "[studioboard.ordering.normalize] column {}: {} id(s) not in column were skipped",
            column_id,
            skipped
        );
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BoardStore;
    use crate::testing::*;

    #[test]
    fn test_normalize_repairs_gaps_and_ties() {
        let store = storage();
        let (board, cols) = board_with(&store, &["Inbox"]);
        let ids = cards(&store, cols[0], &["a", "b", "c"]);
        store
            .write(|tx| {
                tx.set_card_position(ids[0], cols[0], 7)?;
                tx.set_card_position(ids[1], cols[0], 3)?;
                tx.set_card_position(ids[2], cols[0], 3)
            })
            .unwrap();

        let applied = store
            .write(|tx| normalize_column(tx, cols[0], None))
            .unwrap();
        assert_eq!(applied, vec![ids[1], ids[2], ids[0]]);
        assert_eq!(column_order(&store, cols[0]), applied);
        assert_contiguous(&store, board);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let store = storage();
        let (board, cols) = board_with(&store, &["Inbox"]);
        let ids = cards(&store, cols[0], &["a", "b", "c"]);
        let order = vec![ids[2], ids[0], ids[1]];

        store
            .write(|tx| normalize_column(tx, cols[0], Some(&order)))
            .unwrap();
        let first = positions(&store, cols[0]);
        store
            .write(|tx| normalize_column(tx, cols[0], Some(&order)))
            .unwrap();
        assert_eq!(positions(&store, cols[0]), first);
        assert_eq!(column_order(&store, cols[0]), order);
        assert_contiguous(&store, board);
    }

    #[test]
    fn test_normalize_never_changes_membership() {
        let store = storage();
        let (_, cols) = board_with(&store, &["A", "B"]);
        let a = cards(&store, cols[0], &["a"]);
        let b = cards(&store, cols[1], &["b"]);

        let applied = store
            .write(|tx| normalize_column(tx, cols[0], Some(&[b[0], a[0]])))
            .unwrap();
        assert_eq!(applied, vec![a[0]]);
        let card = store.read(|tx| tx.card(b[0])).unwrap().unwrap();
        assert_eq!(card.column_id, cols[1]);
        assert_eq!(card.position, 0);
        let card = store.read(|tx| tx.card(a[0])).unwrap().unwrap();
        assert_eq!(card.position, 0);
    }
}
