use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::platform::Platform;

/// Longest platform name we accept on create.
pub const MAX_PLATFORM_LENGTH: usize = 64;

/// Enumeration of validation errors for a link create request.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LinkError {
    #[error("platform must not be empty")]
    EmptyPlatform,
    #[error("platform name is longer than {MAX_PLATFORM_LENGTH} characters")]
    PlatformTooLong,
    #[error("could not parse url: {0}")]
    InvalidUrl(String),
    #[error("url scheme {0} is not supported, use http or https")]
    UnsupportedScheme(String),
    #[error("url has no host")]
    MissingHost,
}

/// A single entry of a user's ordered link set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LinkEntity {
    pub id: Uuid,
    pub platform: String,
    pub url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

impl LinkEntity {
    /// The styling variant for this link. A platform name we don't know falls
    /// back to whatever the url host tells us.
    pub fn platform_kind(&self) -> Platform {
        match Platform::from_name(&self.platform) {
            Platform::Other => Platform::from_url(&self.url),
            known => known,
        }
    }
}

/// One entry of a batch position update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub id: Uuid,
    pub position: i32,
}

/// The body of a request made to create a link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLink {
    pub platform: String,
    pub url: String,
}

impl NewLink {
    pub fn new(platform: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            url: url.into(),
        }
    }

    /// Check the request and return a trimmed copy of it.
    pub fn validate(&self) -> Result<NewLink, LinkError> {
        let platform = self.platform.trim();
        if platform.is_empty() {
            return Err(LinkError::EmptyPlatform);
        }
        if platform.chars().count() > MAX_PLATFORM_LENGTH {
            return Err(LinkError::PlatformTooLong);
        }

        let url = Url::parse(self.url.trim()).map_err(|e| LinkError::InvalidUrl(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(LinkError::UnsupportedScheme(other.to_owned())),
        }
        if url.host_str().map_or(true, str::is_empty) {
            return Err(LinkError::MissingHost);
        }

        Ok(NewLink {
            platform: platform.to_owned(),
            url: url.to_string(),
        })
    }
}
