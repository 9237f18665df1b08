/// Change notifications emitted after a write commits.
use serde::{Deserialize, Serialize};

use crate::types::{BoardId, CardId, ColumnId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoardChangeEvent {
    CardCreated {
        board_id: BoardId,
        card_id: CardId,
        column_id: ColumnId,
    },
    CardUpdated {
        board_id: BoardId,
        card_id: CardId,
    },
    CardMoved {
        board_id: BoardId,
        card_id: CardId,
        from_column_id: ColumnId,
        to_column_id: ColumnId,
        position: u32,
    },
    CardDeleted {
        board_id: BoardId,
        card_id: CardId,
        column_id: ColumnId,
    },
    CardConverted {
        board_id: BoardId,
        card_id: CardId,
        column_id: ColumnId,
    },
    ColumnReordered {
        board_id: BoardId,
        column_id: ColumnId,
    },
    BoardReconciled {
        board_id: BoardId,
        moved: usize,
    },
    BoardChanged {
        board_id: BoardId,
    },
}

impl BoardChangeEvent {
    pub fn board_id(&self) -> BoardId {
        match self {
            BoardChangeEvent::CardCreated { board_id, .. }
            | BoardChangeEvent::CardUpdated { board_id, .. }
            | BoardChangeEvent::CardMoved { board_id, .. }
            | BoardChangeEvent::CardDeleted { board_id, .. }
            | BoardChangeEvent::CardConverted { board_id, .. }
            | BoardChangeEvent::ColumnReordered { board_id, .. }
            | BoardChangeEvent::BoardReconciled { board_id, .. }
            | BoardChangeEvent::BoardChanged { board_id } => *board_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tagged_by_type() {
        let event = BoardChangeEvent::CardMoved {
            board_id: 1,
            card_id: 7,
            from_column_id: 2,
            to_column_id: 3,
            position: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "CardMoved");
        assert_eq!(json["to_column_id"], 3);
        assert_eq!(event.board_id(), 1);
    }
}
