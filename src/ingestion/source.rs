use crate::error::{AppError, Result};
use crate::models::{Ticket, TicketPriority, TicketStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// A paginated external ticketing system.
///
/// Pagination is purely offset-based; no server-side "changed since" cursor
/// is assumed. Any fetch failure is a whole-run failure for the caller.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Source tag recorded on every ticket pulled from this system
    fn name(&self) -> &str;

    /// Fetch up to `limit` tickets starting at `offset`
    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<Ticket>>;
}

// Jira-style wire types

#[derive(Deserialize)]
struct SearchPage {
    issues: Vec<Issue>,
}

#[derive(Deserialize)]
struct Issue {
    key: String,
    fields: IssueFields,
}

#[derive(Deserialize)]
struct IssueFields {
    summary: String,
    #[serde(default)]
    description: Option<String>,
    status: NamedField,
    #[serde(default)]
    priority: Option<NamedField>,
    #[serde(default)]
    labels: Vec<String>,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
}

#[derive(Deserialize)]
struct NamedField {
    name: String,
}

/// HTTP client for a Jira-style ticket search endpoint
pub struct HttpTicketSource {
    client: reqwest::Client,
    base_url: String,
    source_name: String,
    /// Server-side filter query (e.g. a JQL expression)
    filter_query: String,
    api_token: Option<String>,
}

impl HttpTicketSource {
    pub fn new(
        base_url: &str,
        source_name: &str,
        filter_query: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            source_name: source_name.to_string(),
            filter_query: filter_query.to_string(),
            api_token,
        })
    }

    fn source_error(&self, message: impl Into<String>) -> AppError {
        AppError::ExternalSource {
            source_name: self.source_name.clone(),
            message: message.into(),
        }
    }

    fn map_status(name: &str) -> TicketStatus {
        match name.to_lowercase().as_str() {
            "in progress" | "in_progress" => TicketStatus::InProgress,
            "resolved" => TicketStatus::Resolved,
            "done" | "closed" => TicketStatus::Closed,
            _ => TicketStatus::Open,
        }
    }

    fn map_priority(name: Option<&str>) -> TicketPriority {
        match name.map(|n| n.to_lowercase()).as_deref() {
            Some("highest") | Some("critical") | Some("blocker") => TicketPriority::Critical,
            Some("high") => TicketPriority::High,
            Some("low") | Some("lowest") => TicketPriority::Low,
            _ => TicketPriority::Medium,
        }
    }

    fn convert(&self, issue: Issue) -> Ticket {
        let mut ticket = Ticket::new(
            issue.key,
            self.source_name.clone(),
            issue.fields.summary,
            issue.fields.description.unwrap_or_default(),
            Self::map_priority(issue.fields.priority.as_ref().map(|p| p.name.as_str())),
        );
        ticket.status = Self::map_status(&issue.fields.status.name);
        ticket.tags = issue.fields.labels;
        ticket.created_at = issue.fields.created;
        ticket.updated_at = issue.fields.updated;
        ticket
    }
}

#[async_trait]
impl TicketSource for HttpTicketSource {
    fn name(&self) -> &str {
        &self.source_name
    }

    async fn fetch_page(&self, offset: usize, limit: usize) -> Result<Vec<Ticket>> {
        let url = format!("{}/rest/api/2/search", self.base_url);
        let mut request = self.client.get(&url).query(&[
            ("jql", self.filter_query.as_str()),
            ("startAt", &offset.to_string()),
            ("maxResults", &limit.to_string()),
            (
                "fields",
                "summary,description,status,priority,labels,created,updated",
            ),
        ]);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| self.source_error(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            return Err(self.source_error(format!("{}: {}", status, detail)));
        }

        let page: SearchPage = resp
            .json()
            .await
            .map_err(|e| self.source_error(format!("Malformed page: {}", e)))?;

        let tickets: Vec<Ticket> = page
            .issues
            .into_iter()
            .map(|issue| self.convert(issue))
            .collect();

        tracing::debug!(
            source = %self.source_name,
            offset,
            limit,
            fetched = tickets.len(),
            "Fetched ticket page"
        );

        Ok(tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_for(server: &mockito::ServerGuard) -> HttpTicketSource {
        HttpTicketSource::new(
            &server.url(),
            "jira",
            "project = OPS",
            None,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn issue_json(key: &str, summary: &str) -> serde_json::Value {
        serde_json::json!({
            "key": key,
            "fields": {
                "summary": summary,
                "description": "details",
                "status": { "name": "In Progress" },
                "priority": { "name": "High" },
                "labels": ["db"],
                "created": "2026-08-01T08:00:00Z",
                "updated": "2026-08-02T09:30:00Z"
            }
        })
    }

    #[tokio::test]
    async fn test_fetch_page_maps_issues() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/2/search")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("startAt".into(), "0".into()),
                mockito::Matcher::UrlEncoded("maxResults".into(), "50".into()),
            ]))
            .with_status(200)
            .with_body(
                serde_json::json!({ "issues": [issue_json("OPS-1", "Pool exhausted")] })
                    .to_string(),
            )
            .create_async()
            .await;

        let tickets = source_for(&server).fetch_page(0, 50).await.unwrap();
        assert_eq!(tickets.len(), 1);
        let ticket = &tickets[0];
        assert_eq!(ticket.external_id, "OPS-1");
        assert_eq!(ticket.source, "jira");
        assert_eq!(ticket.status, TicketStatus::InProgress);
        assert_eq!(ticket.priority, TicketPriority::High);
        assert_eq!(ticket.tags, vec!["db".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_external_source_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/rest/api/2/search")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("upstream broken")
            .create_async()
            .await;

        let err = source_for(&server).fetch_page(0, 50).await.unwrap_err();
        assert_eq!(err.error_code(), "EXTERNAL_SOURCE_ERROR");
    }

    #[test]
    fn test_status_and_priority_mapping() {
        assert_eq!(HttpTicketSource::map_status("Done"), TicketStatus::Closed);
        assert_eq!(HttpTicketSource::map_status("weird"), TicketStatus::Open);
        assert_eq!(
            HttpTicketSource::map_priority(Some("Blocker")),
            TicketPriority::Critical
        );
        assert_eq!(HttpTicketSource::map_priority(None), TicketPriority::Medium);
    }
}
