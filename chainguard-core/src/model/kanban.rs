//! Minimal kanban board attached to a project (§2 component table names
//! `kanban_*` tools but the distilled spec does not detail the board
//! shape). Modeled on the teacher's `pm::work_item` state/priority pattern
//! scaled down to a single-board, single-project CRUD surface.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KanbanColumn {
    Backlog,
    InProgress,
    Review,
    Done,
}

impl KanbanColumn {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "backlog" => Some(Self::Backlog),
            "in_progress" => Some(Self::InProgress),
            "review" => Some(Self::Review),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanbanCard {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub column: KanbanColumn,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KanbanHistoryEntry {
    pub ts: DateTime<Utc>,
    pub card_id: Uuid,
    pub event: String,
}

/// Per-project board: cards plus an append-only move/edit log (`kanban_history`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KanbanBoard {
    pub cards: Vec<KanbanCard>,
    #[serde(default)]
    pub history: Vec<KanbanHistoryEntry>,
}

impl KanbanBoard {
    pub fn add(&mut self, title: String, description: String, now: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.cards.push(KanbanCard {
            id,
            title,
            description,
            column: KanbanColumn::Backlog,
            created_at: now,
            updated_at: now,
            archived: false,
        });
        self.history.push(KanbanHistoryEntry { ts: now, card_id: id, event: "created".into() });
        id
    }

    pub fn move_card(&mut self, id: Uuid, to: KanbanColumn, now: DateTime<Utc>) -> bool {
        let Some(card) = self.cards.iter_mut().find(|c| c.id == id && !c.archived) else {
            return false;
        };
        card.column = to;
        card.updated_at = now;
        self.history.push(KanbanHistoryEntry {
            ts: now,
            card_id: id,
            event: format!("moved to {to:?}"),
        });
        true
    }

    pub fn update(&mut self, id: Uuid, title: Option<String>, description: Option<String>, now: DateTime<Utc>) -> bool {
        let Some(card) = self.cards.iter_mut().find(|c| c.id == id && !c.archived) else {
            return false;
        };
        if let Some(title) = title {
            card.title = title;
        }
        if let Some(description) = description {
            card.description = description;
        }
        card.updated_at = now;
        self.history.push(KanbanHistoryEntry { ts: now, card_id: id, event: "updated".into() });
        true
    }

    pub fn delete(&mut self, id: Uuid, now: DateTime<Utc>) -> bool {
        let before = self.cards.len();
        self.cards.retain(|c| c.id != id);
        if self.cards.len() != before {
            self.history.push(KanbanHistoryEntry { ts: now, card_id: id, event: "deleted".into() });
            true
        } else {
            false
        }
    }

    pub fn archive(&mut self, id: Uuid, now: DateTime<Utc>) -> bool {
        let Some(card) = self.cards.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        card.archived = true;
        card.updated_at = now;
        self.history.push(KanbanHistoryEntry { ts: now, card_id: id, event: "archived".into() });
        true
    }

    pub fn active_cards(&self) -> impl Iterator<Item = &KanbanCard> {
        self.cards.iter().filter(|c| !c.archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_move_then_archive() {
        let mut board = KanbanBoard::default();
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let id = board.add("Fix bug".into(), "".into(), now);
        assert!(board.move_card(id, KanbanColumn::InProgress, now));
        assert_eq!(board.cards[0].column, KanbanColumn::InProgress);
        assert!(board.archive(id, now));
        assert_eq!(board.active_cards().count(), 0);
        assert_eq!(board.history.len(), 3);
    }

    #[test]
    fn move_unknown_card_returns_false() {
        let mut board = KanbanBoard::default();
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        assert!(!board.move_card(Uuid::new_v4(), KanbanColumn::Done, now));
    }
}
