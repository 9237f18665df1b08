//! Ordered-list reconciliation.
//!
//! Every entry point keeps the column invariant: positions of the cards in
//! a column are exactly `0..len`, ranked by `(position, id)`.
//!
//! - `normalize`: re-index one column from an explicit or stored order
//! - `mover`: single card drag within or across columns
//! - `column`: full client ordering for one column
//! - `bulk`: whole-board payload, validated before anything is written

pub mod bulk;
pub mod column;
pub mod mover;
pub mod normalize;

pub use bulk::{reconcile_board, ColumnOrder, ReconcileOutcome};
pub use column::reorder_column;
pub use mover::{move_card, MoveOutcome};
pub use normalize::normalize_column;

/// Clamp a client index into `[0, len]`. `None` appends.
pub fn clamp_target(target: Option<i64>, len: usize) -> usize {
    match target {
        None => len,
        Some(t) if t <= 0 => 0,
        Some(t) => usize::try_from(t).map_or(len, |t| t.min(len)),
    }
}

pub(crate) fn rank(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_target() {
        assert_eq!(clamp_target(None, 3), 3);
        assert_eq!(clamp_target(Some(-4), 3), 0);
        assert_eq!(clamp_target(Some(1), 3), 1);
        assert_eq!(clamp_target(Some(99), 3), 3);
        assert_eq!(clamp_target(Some(0), 0), 0);
    }
}
