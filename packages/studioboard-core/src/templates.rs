use chrono::Utc;

use crate::error::{BoardError, Resource, Result, ValidationError};
use crate::ideas::{card_detail_tx, card_on_board};
use crate::requests::{NewTemplateRequest, SaveTemplateRequest};
use crate::storage::{BoardStore, StoreTx};
use crate::types::*;

fn ensure_name_free(tx: &dyn StoreTx, name: &str) -> Result<()> {
    if tx.template_by_name(name)?.is_some() {
        return Err(ValidationError::NameTaken(name.to_string()).into());
    }
    Ok(())
}

pub fn create_template<S: BoardStore>(store: &S, req: &NewTemplateRequest) -> Result<IdeaTemplate> {
    store.write(|tx| {
        ensure_name_free(&*tx, &req.name)?;
        let template =
            tx.insert_template(&req.name, &req.description, &req.body_md, req.is_active, Utc::now())?;
        log::debug!("[studioboard.templates] created {:?} ({})", template.name, template.id);
        Ok(template)
    })
}

/// Save a card's markdown body as a new active template.
pub fn template_from_card<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    card_id: CardId,
    req: &SaveTemplateRequest,
) -> Result<IdeaTemplate> {
    store.write(|tx| {
        let card = card_on_board(&*tx, board_id, card_id)?;
        if card.body_md.trim().is_empty() {
            return Err(ValidationError::EmptyBody.into());
        }
        ensure_name_free(&*tx, &req.name)?;
        Ok(tx.insert_template(&req.name, &req.description, &card.body_md, true, Utc::now())?)
    })
}

pub fn list_templates<S: BoardStore>(store: &S, active_only: bool) -> Result<Vec<IdeaTemplate>> {
    store.read(|tx| tx.templates(active_only))
}

/// Flip the active flag; returns the updated template.
pub fn toggle_template<S: BoardStore>(store: &S, template_id: TemplateId) -> Result<IdeaTemplate> {
    store.write(|tx| {
        let mut template = tx
            .template(template_id)?
            .ok_or(BoardError::not_found(Resource::Template))?;
        template.is_active = !template.is_active;
        tx.set_template_active(template.id, template.is_active)?;
        Ok(template)
    })
}

/// Replace a card's body with an active template.
pub fn apply_template<S: BoardStore>(
    store: &S,
    board_id: BoardId,
    card_id: CardId,
    template_id: TemplateId,
) -> Result<CardDetail> {
    store.write(|tx| {
        let mut card = card_on_board(&*tx, board_id, card_id)?;
        let template = tx
            .template(template_id)?
            .ok_or(BoardError::not_found(Resource::Template))?;
        if !template.is_active {
            return Err(ValidationError::TemplateInactive.into());
        }
        card.body_md = template.body_md;
        card.updated_at = Utc::now();
        tx.update_card(&card)?;
        card_detail_tx(&*tx, card)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ideas::update_card;
    use crate::requests::CardPatch;
    use crate::testing::*;

    fn new_template(name: &str, active: bool) -> NewTemplateRequest {
        NewTemplateRequest {
            name: name.to_string(),
            description: String::new(),
            body_md: format!("# {}\n", name),
            is_active: active,
        }
    }

    #[test]
    fn test_list_orders_active_first() {
        let store = storage();
        create_template(&store, &new_template("Zine", true)).unwrap();
        create_template(&store, &new_template("Album", false)).unwrap();
        create_template(&store, &new_template("Brief", true)).unwrap();

        let names: Vec<String> = list_templates(&store, false)
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Brief", "Zine", "Album"]);
        assert_eq!(list_templates(&store, true).unwrap().len(), 2);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let store = storage();
        create_template(&store, &new_template("Brief", true)).unwrap();
        let err = create_template(&store, &new_template("Brief", true)).unwrap_err();
        assert!(matches!(err, BoardError::Validation(ValidationError::NameTaken(_))));
    }

    #[test]
    fn test_from_card_requires_body() {
        let store = storage();
        let (board, cols) = board_with(&store, &["A"]);
        let ids = cards(&store, cols[0], &["X"]);
        let req = SaveTemplateRequest {
            name: "From X".to_string(),
            description: String::new(),
        };

        let err = template_from_card(&store, board, ids[0], &req).unwrap_err();
        assert!(matches!(err, BoardError::Validation(ValidationError::EmptyBody)));

        let patch = CardPatch {
            body_md: Some("## Steps".to_string()),
            ..CardPatch::default()
        };
        update_card(&store, board, ids[0], &patch).unwrap();
        let template = template_from_card(&store, board, ids[0], &req).unwrap();
        assert_eq!(template.body_md, "## Steps");
        assert!(template.is_active);
    }

    #[test]
    fn test_apply_needs_active_template() {
        let store = storage();
        let (board, cols) = board_with(&store, &["A"]);
        let ids = cards(&store, cols[0], &["X"]);
        let template = create_template(&store, &new_template("Brief", true)).unwrap();

        let detail = apply_template(&store, board, ids[0], template.id).unwrap();
        assert_eq!(detail.body_md, "# Brief\n");

        let toggled = toggle_template(&store, template.id).unwrap();
        assert!(!toggled.is_active);
        let err = apply_template(&store, board, ids[0], template.id).unwrap_err();
        assert!(matches!(err, BoardError::Validation(ValidationError::TemplateInactive)));
        let err = toggle_template(&store, 999).unwrap_err();
        assert!(matches!(err, BoardError::NotFound(Resource::Template)));
    }
}
