use crate::error::{AppError, Result};
use crate::ingestion::BulkImportState;
use crate::models::{Playbook, Ticket};
use crate::store::{PlaybookStore, SyncStateStore, TicketStore};
use async_trait::async_trait;
use dashmap::DashMap;
use regex::RegexBuilder;
use std::sync::Arc;
use uuid::Uuid;

/// Build the case-insensitive matcher used by lexical search. The query is
/// escaped, so operators cannot inject regex syntax through search input.
fn text_matcher(query: &str) -> Result<regex::Regex> {
    RegexBuilder::new(&regex::escape(query.trim()))
        .case_insensitive(true)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build search matcher: {}", e)))
}

/// In-memory ticket store (for MVP and testing)
#[derive(Clone)]
pub struct InMemoryTicketStore {
    tickets: Arc<DashMap<Uuid, Ticket>>,
    /// Secondary index: "source\u{1}external_id" -> store id
    external_index: Arc<DashMap<String, Uuid>>,
}

fn external_key(external_id: &str, source: &str) -> String {
    format!("{}\u{1}{}", source, external_id)
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self {
            tickets: Arc::new(DashMap::new()),
            external_index: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryTicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn save(&self, ticket: &Ticket) -> Result<()> {
        self.external_index.insert(
            external_key(&ticket.external_id, &ticket.source),
            ticket.id,
        );
        self.tickets.insert(ticket.id, ticket.clone());
        tracing::debug!(ticket_id = %ticket.id, external_id = %ticket.external_id, "Ticket saved");
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Ticket>> {
        Ok(self.tickets.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_external_id(
        &self,
        external_id: &str,
        source: &str,
    ) -> Result<Option<Ticket>> {
        let id = self
            .external_index
            .get(&external_key(external_id, source))
            .map(|entry| *entry.value());
        Ok(id.and_then(|id| self.tickets.get(&id).map(|entry| entry.value().clone())))
    }

    async fn update(&self, ticket: &Ticket) -> Result<()> {
        if self.tickets.contains_key(&ticket.id) {
            self.tickets.insert(ticket.id, ticket.clone());
            tracing::debug!(ticket_id = %ticket.id, "Ticket updated");
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Ticket {} not found",
                ticket.id
            )))
        }
    }

    async fn list_all(&self) -> Result<Vec<Ticket>> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Ticket>> {
        let matcher = text_matcher(query)?;

        let mut hits: Vec<Ticket> = self
            .tickets
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|ticket| {
                matcher.is_match(&ticket.title)
                    || matcher.is_match(&ticket.description)
                    || ticket.tags.iter().any(|tag| matcher.is_match(tag))
                    || ticket
                        .analysis
                        .as_ref()
                        .map(|a| matcher.is_match(&a.to_text()))
                        .unwrap_or(false)
            })
            .collect();

        // Newest first; lexical hits carry no relevance score
        hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// In-memory playbook store (for MVP and testing)
#[derive(Clone)]
pub struct InMemoryPlaybookStore {
    playbooks: Arc<DashMap<Uuid, Playbook>>,
}

impl InMemoryPlaybookStore {
    pub fn new() -> Self {
        Self {
            playbooks: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryPlaybookStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlaybookStore for InMemoryPlaybookStore {
    async fn save(&self, playbook: &Playbook) -> Result<()> {
        self.playbooks.insert(playbook.id, playbook.clone());
        tracing::debug!(playbook_id = %playbook.id, title = %playbook.title, "Playbook saved");
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<Option<Playbook>> {
        Ok(self.playbooks.get(id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, playbook: &Playbook) -> Result<()> {
        if self.playbooks.contains_key(&playbook.id) {
            self.playbooks.insert(playbook.id, playbook.clone());
            tracing::debug!(playbook_id = %playbook.id, "Playbook updated");
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Playbook {} not found",
                playbook.id
            )))
        }
    }

    async fn deactivate(&self, id: &Uuid) -> Result<Playbook> {
        let mut entry = self
            .playbooks
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("Playbook {} not found", id)))?;
        entry.is_active = false;
        entry.updated_at = chrono::Utc::now();
        tracing::debug!(playbook_id = %id, "Playbook deactivated");
        Ok(entry.value().clone())
    }

    async fn list_active(&self) -> Result<Vec<Playbook>> {
        let mut playbooks: Vec<Playbook> = self
            .playbooks
            .iter()
            .filter(|entry| entry.value().is_active)
            .map(|entry| entry.value().clone())
            .collect();
        playbooks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(playbooks)
    }

    async fn search_text(&self, query: &str, limit: usize) -> Result<Vec<Playbook>> {
        let matcher = text_matcher(query)?;

        let mut hits: Vec<Playbook> = self
            .playbooks
            .iter()
            .filter(|entry| entry.value().is_active)
            .map(|entry| entry.value().clone())
            .filter(|playbook| {
                matcher.is_match(&playbook.title)
                    || matcher.is_match(&playbook.description)
                    || matcher.is_match(&playbook.triggers_text())
                    || matcher.is_match(&playbook.steps_text())
                    || playbook.tags.iter().any(|tag| matcher.is_match(tag))
            })
            .collect();

        hits.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        hits.truncate(limit);
        Ok(hits)
    }
}

/// In-memory sync state store (for testing; production uses sled)
#[derive(Clone, Default)]
pub struct InMemorySyncStateStore {
    states: Arc<DashMap<String, BulkImportState>>,
}

impl InMemorySyncStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SyncStateStore for InMemorySyncStateStore {
    async fn get(&self, source: &str) -> Result<Option<BulkImportState>> {
        Ok(self.states.get(source).map(|entry| entry.value().clone()))
    }

    async fn put(&self, state: &BulkImportState) -> Result<()> {
        self.states.insert(state.source.clone(), state.clone());
        Ok(())
    }
}
