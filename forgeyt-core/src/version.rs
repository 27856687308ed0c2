use tracing::{info, warn};
use url::Url;

use crate::error::VersionError;

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    UpToDate,
    UpdateAvailable { latest: String },
    /// The check could not complete; startup continues regardless.
    Unavailable(String),
}

/// Compares the published version text byte-for-byte with ours.
pub fn compare(current: &str, published: &str) -> VersionStatus {
    if published == current {
        VersionStatus::UpToDate
    } else {
        VersionStatus::UpdateAvailable {
            latest: published.to_string(),
        }
    }
}

pub struct VersionChecker {
    client: reqwest::Client,
    url: Url,
}

impl VersionChecker {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    pub async fn fetch_published(&self) -> Result<String, VersionError> {
        self.client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|source| VersionError::Request { source })?
            .error_for_status()
            .map_err(|source| VersionError::Request { source })?
            .text()
            .await
            .map_err(|source| VersionError::Request { source })
    }

    pub async fn check(&self, current: &str) -> VersionStatus {
        match self.fetch_published().await {
            Ok(published) => {
                let status = compare(current, &published);
                info!(current, published = %published, ?status, "version check finished");
                status
            }
            Err(error) => {
                warn!(%error, "version check failed");
                VersionStatus::Unavailable(error.to_string())
            }
        }
    }
}
