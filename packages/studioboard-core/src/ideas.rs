//! Card lifecycle: create, quick add, update, delete, convert, detail.
//!
//! Every operation runs in one storage transaction. Column changes go
//! through the mover so both touched columns stay contiguous.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{BoardError, Resource, Result, ValidationError};
use crate::ordering::mover::move_card_tx;
use crate::ordering::{normalize_column, MoveOutcome};
use crate::quick_add::{match_column, parse_quick_add};
use crate::requests::{
    normalize_tags, required_name, CardPatch, NewCardRequest, ProjectPatch, QuickAddRequest,
};
use crate::storage::{BoardStore, StoreTx};
use crate::types::*;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdatedCard {
    pub card: CardDetail,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moved: Option<MoveOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletedCard {
    pub id: CardId,
    pub column_id: ColumnId,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub card: CardDetail,
    pub project: Project,
    pub moved: MoveOutcome,
}

// ── helpers shared with templates ───────────────────────────────────────

pub(crate) fn board_exists(tx: &dyn StoreTx, board_id: BoardId) -> Result<Board> {
    tx.board(board_id)?
        .ok_or(BoardError::not_found(Resource::Board))
}

/// The card, provided it lives on `board_id`.
pub(crate) fn card_on_board(tx: &dyn StoreTx, board_id: BoardId, card_id: CardId) -> Result<Card> {
    if tx.board_of_card(card_id)? != Some(board_id) {
        return Err(BoardError::not_found(Resource::Card));
    }
    tx.card(card_id)?
        .ok_or(BoardError::not_found(Resource::Card))
}

pub(crate) fn column_on_board(
    tx: &dyn StoreTx,
    board_id: BoardId,
    column_id: ColumnId,
) -> Result<Column> {
    tx.column(column_id)?
        .filter(|c| c.board_id == board_id)
        .ok_or(BoardError::not_found(Resource::Column))
}

pub(crate) fn card_detail_tx(tx: &dyn StoreTx, card: Card) -> Result<CardDetail> {
    let column = tx
        .column(card.column_id)?
        .ok_or(BoardError::not_found(Resource::Column))?;
    let tags = tx.card_tags(card.id)?;
    let project = tx.project_for_card(card.id)?;
    Ok(CardDetail {
        id: card.id,
        title: card.title,
        body_md: card.body_md,
        status: card.status,
        impact: card.impact,
        next_action: card.next_action,
        position: card.position,
        column: ColumnRef {
            id: column.id,
            name: column.name,
        },
        tags,
        converted_at: card.converted_at,
        project,
        created_at: card.created_at,
        updated_at: card.updated_at,
    })
}

fn first_column(tx: &dyn StoreTx, board_id: BoardId) -> Result<Column> {
    tx.columns(board_id)?
        .into_iter()
        .next()
        .ok_or_else(|| ValidationError::BoardHasNoColumns.into())
}

fn set_tags(tx: &mut dyn StoreTx, card_id: CardId, names: &[String], now: DateTime<Utc>) -> Result<()> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        ids.push(tx.ensure_tag(name, now)?.id);
    }
    tx.set_card_tags(card_id, &ids)
}

/// Insert at the end of `column` and attach tags.
fn insert_at_end(
    tx: &mut dyn StoreTx,
    draft: &CardDraft,
    tags: &[String],
    now: DateTime<Utc>,
) -> Result<Card> {
    let position = tx.max_position(draft.column_id)?.map_or(0, |p| p + 1);
    let card = tx.insert_card(draft, position, now)?;
    if !tags.is_empty() {
        set_tags(tx, card.id, tags, now)?;
    }
    Ok(card)
}

// ── operations ──────────────────────────────────────────────────────────

pub fn create_card<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    req: &NewCardRequest,
) -> Result<CardDetail> {
    store.write(|tx| {
        board_exists(&*tx, board_id)?;
        let column = match req.column_id {
            Some(id) => column_on_board(&*tx, board_id, id)?,
            None => first_column(&*tx, board_id)?,
        };

        let mut body_md = req.body_md.clone();
        if let Some(template_id) = req.template_id {
            let template = tx
                .template(template_id)?
                .ok_or(BoardError::not_found(Resource::Template))?;
            if !template.is_active {
                return Err(ValidationError::TemplateInactive.into());
            }
            if body_md.trim().is_empty() {
                body_md = template.body_md;
            }
        }

        let draft = CardDraft {
            column_id: column.id,
            title: required_name(&req.title, "title", CARD_TITLE_MAX)?,
            body_md,
            status: req.status,
            impact: req.impact.min(IMPACT_MAX),
            next_action: req.next_action.clone(),
        };
        let card = insert_at_end(tx, &draft, &req.tags, Utc::now())?;
        log::debug!(
            "[studioboard.ideas.create] card {} in column {} at {}",
            card.id,
            card.column_id,
            card.position
        );
        card_detail_tx(&*tx, card)
    })
}

/// Create a card from one line of text (see `quick_add`).
pub fn quick_add<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    req: &QuickAddRequest,
) -> Result<CardDetail> {
    let parsed = parse_quick_add(&req.text);
    let title = required_name(&parsed.title, "title", CARD_TITLE_MAX)?;
    let tags = normalize_tags(&parsed.tags)?;

    store.write(|tx| {
        board_exists(&*tx, board_id)?;
        let column = match (req.column_id, parsed.column_hint.as_deref()) {
            (Some(id), _) => column_on_board(&*tx, board_id, id)?,
            (None, Some(hint)) => {
                let columns = tx.columns(board_id)?;
                match match_column(&columns, hint) {
                    Some(column) => column.clone(),
                    None => {
                        log::warn!(
                            "[studioboard.ideas.quick_add] board {}: no column matches {:?}",
                            board_id,
                            hint
                        );
                        first_column(&*tx, board_id)?
                    }
                }
            }
            (None, None) => first_column(&*tx, board_id)?,
        };

        let draft = CardDraft {
            column_id: column.id,
            title,
            body_md: String::new(),
            status: CardStatus::default(),
            impact: parsed.impact.unwrap_or(0),
            next_action: String::new(),
        };
        let card = insert_at_end(tx, &draft, &tags, Utc::now())?;
        log::debug!(
            "[studioboard.ideas.quick_add] card {} in column {}",
            card.id,
            card.column_id
        );
        card_detail_tx(&*tx, card)
    })
}

/// Apply a partial update. Everything is checked before the first write;
/// any failure, tags included, rolls back the whole update.
pub fn update_card<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    card_id: CardId,
    patch: &CardPatch,
) -> Result<UpdatedCard> {
    store.write(|tx| {
        let mut card = card_on_board(&*tx, board_id, card_id)?;
        let destination = match patch.column_id {
            Some(id) => Some(column_on_board(&*tx, board_id, id)?),
            None => None,
        };
        let now = Utc::now();

        if let Some(title) = &patch.title {
            card.title = required_name(title, "title", CARD_TITLE_MAX)?;
        }
        if let Some(body) = &patch.body_md {
            card.body_md = body.clone();
        }
        if let Some(next_action) = &patch.next_action {
            card.next_action = next_action.clone();
        }
        if let Some(impact) = patch.impact {
            if impact > IMPACT_MAX {
                return Err(ValidationError::ImpactOutOfRange.into());
            }
            card.impact = impact;
        }
        if let Some(status) = patch.status {
            card.status = status;
        }
        card.updated_at = now;
        tx.update_card(&card)?;

        if let Some(tags) = &patch.tags {
            set_tags(tx, card_id, tags, now)?;
        }

        let moved = match destination {
            Some(column) if column.id != card.column_id => {
                Some(move_card_tx(tx, board_id, card_id, column.id, None)?)
            }
            _ => None,
        };

        log::debug!("[studioboard.ideas.update] card {}", card_id);
        let card = card_on_board(&*tx, board_id, card_id)?;
        Ok(UpdatedCard {
            card: card_detail_tx(&*tx, card)?,
            moved,
        })
    })
}

/// Delete a card and close the gap it leaves.
pub fn delete_card<S: BoardStore>(store: &S, board_id: BoardId, card_id: CardId) -> Result<DeletedCard> {
    store.write(|tx| {
        let card = card_on_board(&*tx, board_id, card_id)?;
        tx.delete_card(card_id)?;
        normalize_column(tx, card.column_id, None)?;
        log::debug!(
            "[studioboard.ideas.delete] card {} from column {}",
            card_id,
            card.column_id
        );
        Ok(DeletedCard {
            id: card_id,
            column_id: card.column_id,
        })
    })
}

/// Turn a card into a project: one-way, once per card. The card moves to
/// the end of the board's first validated column.
pub fn convert_card<S: BoardStore>(store: &S, board_id: BoardId, card_id: CardId) -> Result<Conversion> {
    store.write(|tx| {
        let mut card = card_on_board(&*tx, board_id, card_id)?;
        if card.converted_at.is_some() {
            return Err(ValidationError::AlreadyConverted.into());
        }
        let validated = tx
            .columns(board_id)?
            .into_iter()
            .find(|c| c.kind == ColumnKind::Validated)
            .ok_or(ValidationError::NoValidatedColumn)?;

        let now = Utc::now();
        let project = match tx.project_for_card(card_id)? {
            Some(existing) => existing,
            None => tx.insert_project(card_id, now)?,
        };
        card.converted_at = Some(now);
        card.updated_at = now;
        tx.update_card(&card)?;
        let moved = move_card_tx(tx, board_id, card_id, validated.id, None)?;

        log::info!(
            "[studioboard.ideas.convert] card {} -> project {} in column {}",
            card_id,
            project.id,
            validated.id
        );
        let card = card_on_board(&*tx, board_id, card_id)?;
        Ok(Conversion {
            card: card_detail_tx(&*tx, card)?,
            project,
            moved,
        })
    })
}

pub fn update_project<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    card_id: CardId,
    patch: &ProjectPatch,
) -> Result<Project> {
    store.write(|tx| {
        card_on_board(&*tx, board_id, card_id)?;
        let mut project = tx
            .project_for_card(card_id)?
            .ok_or(ValidationError::NotConverted)?;

        if let Some(goals) = &patch.goals {
            project.goals = goals.clone();
        }
        if let Some(scope) = &patch.scope {
            project.scope = scope.clone();
        }
        if let Some(done) = &patch.definition_of_done {
            project.definition_of_done = done.clone();
        }
        if let Some(due_date) = patch.due_date {
            project.due_date = due_date;
        }
        project.updated_at = Utc::now();
        tx.update_project(&project)?;
        Ok(project)
    })
}

pub fn card_detail<S: BoardStore>(store: &S, board_id: BoardId, card_id: CardId) -> Result<CardDetail> {
    store.read(|tx| {
        let card = card_on_board(tx, board_id, card_id)?;
        card_detail_tx(tx, card)
    })
}
