use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// A support ticket pulled from an external ticketing system and augmented
/// with AI-generated analysis.
///
/// The record store owns this entity; identity within a source is the
/// `(external_id, source)` pair. The vector index only ever holds a derived
/// twin of it.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Ticket {
    /// Store-side unique identifier
    pub id: Uuid,

    /// Stable identifier in the originating ticketing system (e.g. "OPS-1042")
    #[validate(length(min = 1, max = 255))]
    pub external_id: String,

    /// Originating system name (e.g. "jira")
    #[validate(length(min = 1, max = 255))]
    pub source: String,

    /// Human-readable title
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// Detailed description
    pub description: String,

    /// Current status in the ticketing system
    pub status: TicketStatus,

    /// Priority level
    pub priority: TicketPriority,

    /// Tags for organization and filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// AI-generated analysis (filled by an external agent, plain data here)
    pub analysis: Option<TicketAnalysis>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    /// Create a new ticket
    pub fn new(
        external_id: String,
        source: String,
        title: String,
        description: String,
        priority: TicketPriority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id,
            source,
            title,
            description,
            status: TicketStatus::Open,
            priority,
            tags: Vec::new(),
            analysis: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply fresh field values from a re-ingested external record, keeping
    /// the store id and creation time stable.
    pub fn apply_update(&mut self, other: &Ticket) {
        self.title = other.title.clone();
        self.description = other.description.clone();
        self.status = other.status;
        self.priority = other.priority;
        self.tags = other.tags.clone();
        self.updated_at = Utc::now();
    }

    /// Whether the ticket is still being worked
    pub fn is_active(&self) -> bool {
        !matches!(self.status, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

/// AI-generated analysis attached to a ticket
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TicketAnalysis {
    /// Identified root cause
    pub root_cause: Option<String>,

    /// Proposed remediation steps
    #[serde(default)]
    pub proposed_solutions: Vec<String>,

    /// Assessed blast radius / business impact
    pub impact_assessment: Option<String>,
}

impl TicketAnalysis {
    /// Flatten the analysis into one text block for embedding
    pub fn to_text(&self) -> String {
        let mut parts = Vec::new();
        if let Some(root_cause) = &self.root_cause {
            parts.push(root_cause.clone());
        }
        parts.extend(self.proposed_solutions.iter().cloned());
        if let Some(impact) = &self.impact_assessment {
            parts.push(impact.clone());
        }
        parts.join(" ")
    }
}

/// Ticket lifecycle status
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// Ticket priority level
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TicketPriority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ticket() -> Ticket {
        Ticket::new(
            "OPS-1042".to_string(),
            "jira".to_string(),
            "Database connection pool exhausted".to_string(),
            "Connections pile up during nightly batch".to_string(),
            TicketPriority::High,
        )
    }

    #[test]
    fn test_new_ticket_defaults() {
        let ticket = sample_ticket();
        assert_eq!(ticket.status, TicketStatus::Open);
        assert!(ticket.is_active());
        assert!(ticket.analysis.is_none());
        assert_eq!(ticket.created_at, ticket.updated_at);
    }

    #[test]
    fn test_apply_update_keeps_identity() {
        let mut ticket = sample_ticket();
        let original_id = ticket.id;
        let original_created = ticket.created_at;

        let mut incoming = sample_ticket();
        incoming.title = "Pool exhausted (recurring)".to_string();
        incoming.status = TicketStatus::Resolved;

        ticket.apply_update(&incoming);

        assert_eq!(ticket.id, original_id);
        assert_eq!(ticket.created_at, original_created);
        assert_eq!(ticket.title, "Pool exhausted (recurring)");
        assert!(!ticket.is_active());
    }

    #[test]
    fn test_analysis_to_text() {
        let analysis = TicketAnalysis {
            root_cause: Some("connection leak".to_string()),
            proposed_solutions: vec!["bump pool size".to_string(), "fix leak".to_string()],
            impact_assessment: Some("checkout degraded".to_string()),
        };

        assert_eq!(
            analysis.to_text(),
            "connection leak bump pool size fix leak checkout degraded"
        );
        assert_eq!(TicketAnalysis::default().to_text(), "");
    }

    #[test]
    fn test_status_round_trip() {
        let json = serde_json::to_string(&TicketStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        let back: TicketStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TicketStatus::InProgress);
    }
}
