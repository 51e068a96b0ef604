use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A remediation playbook authored by operators.
///
/// Playbooks are never hard-deleted; deactivation flips `is_active` and
/// removes the derived vector twin.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Playbook {
    /// Unique identifier
    pub id: Uuid,

    /// Human-readable title
    #[validate(length(min = 1, max = 500))]
    pub title: String,

    /// What this playbook addresses
    pub description: String,

    /// Conditions under which the playbook applies
    #[serde(default)]
    pub triggers: Vec<PlaybookTrigger>,

    /// Ordered remediation steps
    #[serde(default)]
    pub steps: Vec<PlaybookStep>,

    /// Tags for organization
    #[serde(default)]
    pub tags: Vec<String>,

    /// Soft-delete flag; inactive playbooks keep their record but lose
    /// their vector twin
    pub is_active: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Playbook {
    /// Create a new active playbook
    pub fn new(title: String, description: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            triggers: Vec::new(),
            steps: Vec::new(),
            tags: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style trigger attachment
    pub fn with_trigger(mut self, trigger: PlaybookTrigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    /// Builder-style step attachment
    pub fn with_step(mut self, step: PlaybookStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Builder-style tags
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Denormalized trigger text, one "title condition outcome" block per entry
    pub fn triggers_text(&self) -> String {
        self.triggers
            .iter()
            .map(PlaybookTrigger::to_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Denormalized step text, one "title action outcome" block per entry
    pub fn steps_text(&self) -> String {
        self.steps
            .iter()
            .map(PlaybookStep::to_text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A condition that makes a playbook applicable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookTrigger {
    /// Short trigger name
    pub title: String,

    /// What to look for
    pub condition: String,

    /// Expected observation when the trigger fires
    #[serde(default)]
    pub outcome: String,
}

impl PlaybookTrigger {
    fn to_text(&self) -> String {
        format!("{} {} {}", self.title, self.condition, self.outcome)
            .trim()
            .to_string()
    }
}

/// A single remediation step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybookStep {
    /// Short step name
    pub title: String,

    /// Concrete action to take
    pub action: String,

    /// Expected outcome of the action
    #[serde(default)]
    pub outcome: String,
}

impl PlaybookStep {
    fn to_text(&self) -> String {
        format!("{} {} {}", self.title, self.action, self.outcome)
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_playbook_is_active() {
        let playbook = Playbook::new(
            "Database failover".to_string(),
            "Promote the replica when the primary is unreachable".to_string(),
        );
        assert!(playbook.is_active);
        assert!(playbook.steps.is_empty());
    }

    #[test]
    fn test_steps_text_joins_entries() {
        let playbook = Playbook::new("Failover".to_string(), "".to_string())
            .with_step(PlaybookStep {
                title: "Verify".to_string(),
                action: "ping primary".to_string(),
                outcome: "no response".to_string(),
            })
            .with_step(PlaybookStep {
                title: "Promote".to_string(),
                action: "run failover script".to_string(),
                outcome: "replica serves writes".to_string(),
            });

        assert_eq!(
            playbook.steps_text(),
            "Verify ping primary no response Promote run failover script replica serves writes"
        );
    }

    #[test]
    fn test_triggers_text_empty_when_no_triggers() {
        let playbook = Playbook::new("Failover".to_string(), "desc".to_string());
        assert_eq!(playbook.triggers_text(), "");
    }

    #[test]
    fn test_trigger_text_trims_missing_outcome() {
        let trigger = PlaybookTrigger {
            title: "Primary down".to_string(),
            condition: "health check fails".to_string(),
            outcome: String::new(),
        };
        let playbook =
            Playbook::new("Failover".to_string(), "".to_string()).with_trigger(trigger);
        assert_eq!(playbook.triggers_text(), "Primary down health check fails");
    }
}
