//! Release version check.

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client};
use serde::Deserialize;
use skycast_core::{NetworkError, ReqwestErrorExt, UpdateConfig, UpdateError};

const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("skycast/", env!("CARGO_PKG_VERSION"));

/// Numeric segments of a dotted version. A leading `v` is ignored and
/// non-numeric segments read as 0.
fn segments(version: &str) -> Vec<u64> {
    strip_prefix(version)
        .split('.')
        .map(|s| s.trim().parse().unwrap_or(0))
        .collect()
}

fn strip_prefix(version: &str) -> &str {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version)
}

/// Compare dotted versions segment by segment, padding the shorter with zeros.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (a, b) = (segments(a), segments(b));
    let len = a.len().max(b.len());
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// True when `latest` is strictly newer than `current`.
pub fn is_update_needed(latest: &str, current: &str) -> bool {
    compare_versions(latest, current) == Ordering::Greater
}

fn major(version: &str) -> u64 {
    segments(version).first().copied().unwrap_or(0)
}

#[derive(Debug, Deserialize)]
struct ReleaseResponse {
    tag_name: Option<String>,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    browser_download_url: Option<String>,
}

/// Latest published release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: String,
    pub download_url: Option<String>,
}

/// Result of a check that found a newer release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub latest_version: String,
    pub download_url: Option<String>,
    /// Latest major version is ahead of the running one
    pub force_update: bool,
}

#[derive(Debug, Clone)]
pub struct UpdateChecker {
    client: Arc<Client>,
    release_url: String,
}

impl UpdateChecker {
    pub fn new(config: &UpdateConfig) -> Result<Self, UpdateError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| UpdateError::Network(e.into_network_error()))?;

        Ok(Self {
            client: Arc::new(client),
            release_url: config.release_url.clone(),
        })
    }

    /// Fetch the latest release metadata.
    pub async fn fetch_latest(&self) -> Result<ReleaseInfo, UpdateError> {
        tracing::debug!("Checking latest release at {}", self.release_url);

        let response = self
            .client
            .get(&self.release_url)
            .header(header::ACCEPT, "application/vnd.github+json")
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| UpdateError::Network(e.into_network_error()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UpdateError::Network(NetworkError::ServerError {
                status: status.as_u16(),
                message,
            }));
        }

        let release: ReleaseResponse = response
            .json()
            .await
            .map_err(|e| UpdateError::Network(e.into_network_error()))?;

        let tag = release
            .tag_name
            .filter(|t| !t.trim().is_empty())
            .ok_or(UpdateError::MissingTag)?;
        let version = strip_prefix(&tag).to_string();
        if !version.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(UpdateError::InvalidVersion(tag));
        }

        Ok(ReleaseInfo {
            version,
            download_url: release
                .assets
                .into_iter()
                .next()
                .and_then(|a| a.browser_download_url),
        })
    }

    /// Returns `Some` when a release newer than `current` exists.
    pub async fn check(&self, current: &str) -> Result<Option<UpdateInfo>, UpdateError> {
        let release = self.fetch_latest().await?;

        if !is_update_needed(&release.version, current) {
            tracing::info!("Up to date ({})", current);
            return Ok(None);
        }

        let force_update = major(&release.version) > major(current);
        tracing::info!(
            "Update available: {} -> {}{}",
            current,
            release.version,
            if force_update { " (required)" } else { "" }
        );

        Ok(Some(UpdateInfo {
            latest_version: release.version,
            download_url: release.download_url,
            force_update,
        }))
    }
}
