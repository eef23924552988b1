//! Outbound "you have new matches" notifications. Delivery itself belongs to
//! an external email service; this module only decides what to announce and
//! hands a structured payload over.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::matching::{MatchRecord, PersistedMatch};

const NEW_MATCHES_TEMPLATE: &str = "new_matches";
const WEBHOOK_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Notification service rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchHighlight {
    pub match_id: Uuid,
    pub job_id: Uuid,
    pub job_title: String,
    pub company: Option<String>,
    pub match_score: i32,
    pub matching_skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewMatchesNotification {
    pub candidate_id: Uuid,
    pub candidate_name: Option<String>,
    pub matches: Vec<MatchHighlight>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, email: &str, notification: &NewMatchesNotification)
        -> Result<(), NotifyError>;
}

/// Which freshly created matches are worth telling a candidate about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationPolicy {
    pub min_score: i32,
    pub max_matches: usize,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            min_score: 70,
            max_matches: 3,
        }
    }
}

impl NotificationPolicy {
    /// Picks newly created matches at or above `min_score`, highest first.
    /// Re-scored matches the candidate has already seen are never re-announced.
    pub fn select<'a>(&self, persisted: &'a [PersistedMatch]) -> Vec<&'a MatchRecord> {
        let mut fresh: Vec<&MatchRecord> = persisted
            .iter()
            .filter(|p| p.created && p.record.match_score >= self.min_score)
            .map(|p| &p.record)
            .collect();
        fresh.sort_by(|a, b| b.match_score.cmp(&a.match_score));
        fresh.truncate(self.max_matches);
        fresh
    }
}

/// Writes notifications to the log. Used when no webhook is configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(
        &self,
        email: &str,
        notification: &NewMatchesNotification,
    ) -> Result<(), NotifyError> {
        info!(
            candidate_id = %notification.candidate_id,
            email,
            matches = notification.matches.len(),
            "New matches notification (log only)"
        );
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct WebhookEnvelope<'a> {
    email: &'a str,
    template: &'a str,
    payload: &'a NewMatchesNotification,
}

/// POSTs notifications as JSON to an email-service webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(
        &self,
        email: &str,
        notification: &NewMatchesNotification,
    ) -> Result<(), NotifyError> {
        let envelope = WebhookEnvelope {
            email,
            template: NEW_MATCHES_TEMPLATE,
            payload: notification,
        };

        let response = self.client.post(&self.url).json(&envelope).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(candidate_id = %notification.candidate_id, "Notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::testing::record;

    fn persisted(score: i32, created: bool) -> PersistedMatch {
        PersistedMatch {
            record: record(Uuid::new_v4(), Uuid::new_v4(), score),
            created,
        }
    }

    #[test]
    fn test_policy_selects_top_three_new_high_matches() {
        let batch = vec![
            persisted(95, false),
            persisted(91, true),
            persisted(88, true),
            persisted(74, true),
            persisted(72, true),
            persisted(69, true),
        ];

        let picked = NotificationPolicy::default().select(&batch);
        let scores: Vec<i32> = picked.iter().map(|r| r.match_score).collect();
        assert_eq!(scores, vec![91, 88, 74]);
    }

    #[test]
    fn test_policy_threshold_is_inclusive() {
        let batch = vec![persisted(70, true), persisted(69, true)];
        let picked = NotificationPolicy::default().select(&batch);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].match_score, 70);
    }

    #[test]
    fn test_policy_ignores_rescored_matches() {
        let batch = vec![persisted(99, false), persisted(80, false)];
        assert!(NotificationPolicy::default().select(&batch).is_empty());
    }

    #[test]
    fn test_webhook_envelope_shape() {
        let notification = NewMatchesNotification {
            candidate_id: Uuid::nil(),
            candidate_name: Some("Asha".to_string()),
            matches: vec![],
        };
        let envelope = WebhookEnvelope {
            email: "asha@example.com",
            template: NEW_MATCHES_TEMPLATE,
            payload: &notification,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["email"], "asha@example.com");
        assert_eq!(json["template"], "new_matches");
        assert_eq!(json["payload"]["candidate_name"], "Asha");
        assert!(json["payload"]["matches"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notification = NewMatchesNotification {
            candidate_id: Uuid::new_v4(),
            candidate_name: None,
            matches: vec![],
        };
        assert!(LogNotifier.send("someone@example.com", &notification).await.is_ok());
    }
}
