use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::config::IssueSettings;
use crate::error::IssueError;

const EMBED_TITLE: &str = "New Report!";
const EMBED_COLOR: u32 = 15_258_703;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueReport {
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl IssueReport {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    /// ISO-8601 in UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
    pub fn timestamp(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    username: &'a str,
    content: &'a str,
    embeds: [Embed<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Embed<'a> {
    title: &'a str,
    color: u32,
    description: &'a str,
    timestamp: String,
}

#[async_trait]
pub trait IssueSubmitter: Send + Sync {
    async fn submit(&self, report: &IssueReport) -> Result<(), IssueError>;
}

#[async_trait]
impl<S: IssueSubmitter + ?Sized> IssueSubmitter for Arc<S> {
    async fn submit(&self, report: &IssueReport) -> Result<(), IssueError> {
        (**self).submit(report).await
    }
}

/// Posts reports as a single-embed webhook message. One attempt, no retry.
#[derive(Debug, Clone)]
pub struct WebhookReporter {
    client: reqwest::Client,
    endpoint: Option<Url>,
    username: String,
}

impl WebhookReporter {
    pub fn new(client: reqwest::Client, settings: &IssueSettings) -> Self {
        Self {
            client,
            endpoint: settings.webhook_url.clone(),
            username: settings.username.clone(),
        }
    }

    fn payload<'a>(&'a self, report: &'a IssueReport) -> WebhookPayload<'a> {
        WebhookPayload {
            username: &self.username,
            content: " ",
            embeds: [Embed {
                title: EMBED_TITLE,
                color: EMBED_COLOR,
                description: &report.description,
                timestamp: report.timestamp(),
            }],
        }
    }
}

#[async_trait]
impl IssueSubmitter for WebhookReporter {
    async fn submit(&self, report: &IssueReport) -> Result<(), IssueError> {
        let endpoint = self.endpoint.as_ref().ok_or(IssueError::NotConfigured)?;

        self.client
            .post(endpoint.clone())
            .json(&self.payload(report))
            .send()
            .await
            .map_err(|source| IssueError::Request { source })?
            .error_for_status()
            .map_err(|source| IssueError::Request { source })?;

        info!("issue report delivered");
        Ok(())
    }
}
