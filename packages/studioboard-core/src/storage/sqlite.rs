/// SQLite storage backend.
///
/// - One connection behind a mutex; every `write` opens `BEGIN IMMEDIATE`
///   so the write lock is held before the first ordered read
/// - Busy/locked results after `busy_timeout` surface as `StorageError::Busy`
/// - Schema is created on open
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

use super::{BoardStore, StorageError, StoreTx};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::types::*;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS boards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS columns (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    name TEXT NOT NULL,
    sort_order INTEGER NOT NULL,
    kind TEXT NOT NULL DEFAULT 'normal',
    UNIQUE (board_id, name),
    UNIQUE (board_id, sort_order)
);

CREATE TABLE IF NOT EXISTS ideas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    column_id INTEGER NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
    title TEXT NOT NULL,
    body_md TEXT NOT NULL DEFAULT '',
    status TEXT NOT NULL DEFAULT 'active',
    position INTEGER NOT NULL CHECK (position >= 0),
    impact INTEGER NOT NULL DEFAULT 0 CHECK (impact BETWEEN 0 AND 5),
    next_action TEXT NOT NULL DEFAULT '',
    converted_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_ideas_column_position ON ideas(column_id, position);
CREATE INDEX IF NOT EXISTS idx_ideas_status ON ideas(status);

CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS idea_tags (
    idea_id INTEGER NOT NULL REFERENCES ideas(id) ON DELETE CASCADE,
    tag_id INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
    PRIMARY KEY (idea_id, tag_id)
);

CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    idea_id INTEGER NOT NULL UNIQUE REFERENCES ideas(id) ON DELETE CASCADE,
    goals TEXT NOT NULL DEFAULT '',
    scope TEXT NOT NULL DEFAULT '',
    definition_of_done TEXT NOT NULL DEFAULT '',
    due_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS idea_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    body_md TEXT NOT NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);
";

const CARD_COLUMNS: &str = "i.id, i.column_id, i.title, i.body_md, i.status, i.position, \
     i.impact, i.next_action, i.converted_at, i.created_at, i.updated_at";

const PROJECT_COLUMNS: &str =
    "id, idea_id, goals, scope, definition_of_done, due_date, created_at, updated_at";

const TEMPLATE_COLUMNS: &str = "id, name, description, body_md, is_active, created_at";

pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) a database file, creating parent directories.
    pub fn open(path: &Path, config: &StoreConfig) -> std::result::Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        log::debug!("[studioboard.storage] opened {} (journal_mode={})", path.display(), mode);
        Self::init(conn, config)
    }

    /// Private in-memory database, used by tests and throwaway servers.
    pub fn open_in_memory() -> std::result::Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?, &StoreConfig::default())
    }

    fn init(conn: Connection, config: &StoreConfig) -> std::result::Result<Self, StorageError> {
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BoardStore for SqliteStorage {
    fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&dyn StoreTx) -> Result<T>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
        let value = f(&SqliteTx { conn: &tx })?;
        tx.commit()?;
        Ok(value)
    }

    fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut dyn StoreTx) -> Result<T>,
    {
        let mut conn = self.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let value = f(&mut SqliteTx { conn: &tx })?;
        tx.commit()?;
        Ok(value)
    }
}

/// Transaction-scoped view of the connection.
struct SqliteTx<'c> {
    conn: &'c Connection,
}

fn invalid_text(idx: usize, value: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        format!("unknown value {:?}", value).into(),
    )
}

fn board_from_row(row: &Row<'_>) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
    })
}

fn column_from_row(row: &Row<'_>) -> rusqlite::Result<Column> {
    let kind: String = row.get(4)?;
    Ok(Column {
        id: row.get(0)?,
        board_id: row.get(1)?,
        name: row.get(2)?,
        order: row.get(3)?,
        kind: ColumnKind::parse(&kind).ok_or_else(|| invalid_text(4, &kind))?,
    })
}

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<Card> {
    let status: String = row.get(4)?;
    Ok(Card {
        id: row.get(0)?,
        column_id: row.get(1)?,
        title: row.get(2)?,
        body_md: row.get(3)?,
        status: CardStatus::parse(&status).ok_or_else(|| invalid_text(4, &status))?,
        position: row.get(5)?,
        impact: row.get(6)?,
        next_action: row.get(7)?,
        converted_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        card_id: row.get(1)?,
        goals: row.get(2)?,
        scope: row.get(3)?,
        definition_of_done: row.get(4)?,
        due_date: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn template_from_row(row: &Row<'_>) -> rusqlite::Result<IdeaTemplate> {
    Ok(IdeaTemplate {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        body_md: row.get(3)?,
        is_active: row.get(4)?,
        created_at: row.get(5)?,
    })
}

impl StoreTx for SqliteTx<'_> {
    fn board(&self, id: BoardId) -> Result<Option<Board>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at FROM boards WHERE id = ?1",
                params![id],
                board_from_row,
            )
            .optional()?)
    }

    fn board_by_name(&self, name: &str) -> Result<Option<Board>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at FROM boards WHERE name = ?1",
                params![name],
                board_from_row,
            )
            .optional()?)
    }

    fn boards(&self) -> Result<Vec<Board>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at, updated_at FROM boards ORDER BY id",
        )?;
        let rows = stmt.query_map([], board_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_board(&mut self, name: &str, description: &str, now: DateTime<Utc>) -> Result<Board> {
        self.conn.execute(
            "INSERT INTO boards (name, description, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![name, description, now],
        )?;
        Ok(Board {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn column(&self, id: ColumnId) -> Result<Option<Column>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, board_id, name, sort_order, kind FROM columns WHERE id = ?1",
                params![id],
                column_from_row,
            )
            .optional()?)
    }

    fn columns(&self, board_id: BoardId) -> Result<Vec<Column>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, board_id, name, sort_order, kind FROM columns \
             WHERE board_id = ?1 ORDER BY sort_order, id",
        )?;
        let rows = stmt.query_map(params![board_id], column_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_column(
        &mut self,
        board_id: BoardId,
        name: &str,
        order: u32,
        kind: ColumnKind,
    ) -> Result<Column> {
        self.conn.execute(
            "INSERT INTO columns (board_id, name, sort_order, kind) VALUES (?1, ?2, ?3, ?4)",
            params![board_id, name, order, kind.as_str()],
        )?;
        Ok(Column {
            id: self.conn.last_insert_rowid(),
            board_id,
            name: name.to_string(),
            order,
            kind,
        })
    }

    fn set_column_order(&mut self, column_id: ColumnId, order: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE columns SET sort_order = ?2 WHERE id = ?1",
            params![column_id, order],
        )?;
        Ok(())
    }

    fn card(&self, id: CardId) -> Result<Option<Card>> {
        let sql = format!("SELECT {} FROM ideas i WHERE i.id = ?1", CARD_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], card_from_row)
            .optional()?)
    }

    fn board_of_card(&self, id: CardId) -> Result<Option<BoardId>> {
        Ok(self
            .conn
            .query_row(
                "SELECT c.board_id FROM ideas i JOIN columns c ON c.id = i.column_id WHERE i.id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn ordered_card_ids(&self, column_id: ColumnId, excluding: Option<CardId>) -> Result<Vec<CardId>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id FROM ideas WHERE column_id = ?1 AND (?2 IS NULL OR id <> ?2) \
             ORDER BY position, id",
        )?;
        let rows = stmt.query_map(params![column_id, excluding], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn board_card_ids(&self, board_id: BoardId) -> Result<Vec<CardId>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT i.id FROM ideas i JOIN columns c ON c.id = i.column_id \
             WHERE c.board_id = ?1 ORDER BY i.id",
        )?;
        let rows = stmt.query_map(params![board_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn board_cards(&self, board_id: BoardId) -> Result<Vec<Card>> {
        let sql = format!(
            "SELECT {} FROM ideas i JOIN columns c ON c.id = i.column_id \
             WHERE c.board_id = ?1 ORDER BY c.sort_order, c.id, i.position, i.id",
            CARD_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![board_id], card_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn max_position(&self, column_id: ColumnId) -> Result<Option<u32>> {
        Ok(self.conn.query_row(
            "SELECT MAX(position) FROM ideas WHERE column_id = ?1",
            params![column_id],
            |row| row.get(0),
        )?)
    }

    fn insert_card(&mut self, draft: &CardDraft, position: u32, now: DateTime<Utc>) -> Result<Card> {
        self.conn.execute(
            "INSERT INTO ideas (column_id, title, body_md, status, position, impact, next_action, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                draft.column_id,
                draft.title,
                draft.body_md,
                draft.status.as_str(),
                position,
                draft.impact,
                draft.next_action,
                now,
            ],
        )?;
        Ok(Card {
            id: self.conn.last_insert_rowid(),
            column_id: draft.column_id,
            title: draft.title.clone(),
            body_md: draft.body_md.clone(),
            status: draft.status,
            position,
            impact: draft.impact,
            next_action: draft.next_action.clone(),
            converted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_card(&mut self, card: &Card) -> Result<()> {
        self.conn.execute(
            "UPDATE ideas SET title = ?2, body_md = ?3, status = ?4, impact = ?5, \
             next_action = ?6, converted_at = ?7, updated_at = ?8 WHERE id = ?1",
            params![
                card.id,
                card.title,
                card.body_md,
                card.status.as_str(),
                card.impact,
                card.next_action,
                card.converted_at,
                card.updated_at,
            ],
        )?;
        Ok(())
    }

    fn set_card_position(&mut self, card_id: CardId, column_id: ColumnId, position: u32) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE ideas SET position = ?3 WHERE id = ?1 AND column_id = ?2")?;
        Ok(stmt.execute(params![card_id, column_id, position])? > 0)
    }

    fn relocate_card(&mut self, card_id: CardId, column_id: ColumnId, position: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE ideas SET column_id = ?2, position = ?3 WHERE id = ?1",
            params![card_id, column_id, position],
        )?;
        Ok(())
    }

    fn place_cards(&mut self, placements: &[Placement]) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare_cached("UPDATE ideas SET column_id = ?2, position = ?3 WHERE id = ?1")?;
        let mut written = 0;
        for placement in placements {
            written += stmt.execute(params![
                placement.card_id,
                placement.column_id,
                placement.position
            ])?;
        }
        Ok(written)
    }

    fn delete_card(&mut self, card_id: CardId) -> Result<bool> {
        Ok(self
            .conn
            .execute("DELETE FROM ideas WHERE id = ?1", params![card_id])?
            > 0)
    }

    fn ensure_tag(&mut self, name: &str, now: DateTime<Utc>) -> Result<Tag> {
        self.conn.execute(
            "INSERT OR IGNORE INTO tags (name, created_at) VALUES (?1, ?2)",
            params![name, now],
        )?;
        Ok(self.conn.query_row(
            "SELECT id, name FROM tags WHERE name = ?1",
            params![name],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )?)
    }

    fn tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM tags ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Tag {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn card_tags(&self, card_id: CardId) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT t.name FROM tags t JOIN idea_tags it ON it.tag_id = t.id \
             WHERE it.idea_id = ?1 ORDER BY t.name",
        )?;
        let rows = stmt.query_map(params![card_id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn set_card_tags(&mut self, card_id: CardId, tag_ids: &[TagId]) -> Result<()> {
        self.conn
            .execute("DELETE FROM idea_tags WHERE idea_id = ?1", params![card_id])?;
        let mut stmt = self
            .conn
            .prepare_cached("INSERT OR IGNORE INTO idea_tags (idea_id, tag_id) VALUES (?1, ?2)")?;
        for tag_id in tag_ids {
            stmt.execute(params![card_id, tag_id])?;
        }
        Ok(())
    }

    fn project_for_card(&self, card_id: CardId) -> Result<Option<Project>> {
        let sql = format!("SELECT {} FROM projects WHERE idea_id = ?1", PROJECT_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![card_id], project_from_row)
            .optional()?)
    }

    fn insert_project(&mut self, card_id: CardId, now: DateTime<Utc>) -> Result<Project> {
        self.conn.execute(
            "INSERT INTO projects (idea_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![card_id, now],
        )?;
        Ok(Project {
            id: self.conn.last_insert_rowid(),
            card_id,
            goals: String::new(),
            scope: String::new(),
            definition_of_done: String::new(),
            due_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    fn update_project(&mut self, project: &Project) -> Result<()> {
        self.conn.execute(
            "UPDATE projects SET goals = ?2, scope = ?3, definition_of_done = ?4, due_date = ?5, \
             updated_at = ?6 WHERE id = ?1",
            params![
                project.id,
                project.goals,
                project.scope,
                project.definition_of_done,
                project.due_date,
                project.updated_at,
            ],
        )?;
        Ok(())
    }

    fn template(&self, id: TemplateId) -> Result<Option<IdeaTemplate>> {
        let sql = format!("SELECT {} FROM idea_templates WHERE id = ?1", TEMPLATE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![id], template_from_row)
            .optional()?)
    }

    fn template_by_name(&self, name: &str) -> Result<Option<IdeaTemplate>> {
        let sql = format!("SELECT {} FROM idea_templates WHERE name = ?1", TEMPLATE_COLUMNS);
        Ok(self
            .conn
            .query_row(&sql, params![name], template_from_row)
            .optional()?)
    }

    fn templates(&self, active_only: bool) -> Result<Vec<IdeaTemplate>> {
        let sql = format!(
            "SELECT {} FROM idea_templates WHERE (?1 = 0 OR is_active = 1) \
             ORDER BY is_active DESC, name",
            TEMPLATE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![active_only], template_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    fn insert_template(
        &mut self,
        name: &str,
        description: &str,
        body_md: &str,
        is_active: bool,
        now: DateTime<Utc>,
    ) -> Result<IdeaTemplate> {
        self.conn.execute(
            "INSERT INTO idea_templates (name, description, body_md, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, description, body_md, is_active, now],
        )?;
        Ok(IdeaTemplate {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
            body_md: body_md.to_string(),
            is_active,
            created_at: now,
        })
    }

    fn set_template_active(&mut self, id: TemplateId, is_active: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE idea_templates SET is_active = ?2 WHERE id = ?1",
            params![id, is_active],
        )?;
        Ok(())
    }
}
