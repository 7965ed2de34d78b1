use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::record::{PropertyUpdates, UserRecord};
use crate::service::{IdentityError, IdentityService};

#[derive(Clone, Debug)]
pub struct HttpIdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

impl HttpIdentityConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("COURSE_IDENTITY_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let api_key = env::var("COURSE_IDENTITY_API_KEY").unwrap_or_default();
        Some(Self { base_url, api_key })
    }
}

/// Identity service backed by the hosting platform's profile HTTP API.
#[derive(Clone)]
pub struct HttpIdentity {
    client: Client,
    config: HttpIdentityConfig,
}

impl HttpIdentity {
    #[must_use]
    pub fn new(config: HttpIdentityConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn profile_url(&self) -> String {
        format!(
            "{}/api/v1/profile",
            self.config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl IdentityService for HttpIdentity {
    async fn fetch_current_user(&self) -> Result<UserRecord, IdentityError> {
        let response = self
            .client
            .get(self.profile_url())
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(IdentityError::NoUser);
        }
        if !response.status().is_success() {
            return Err(IdentityError::HttpStatus(response.status()));
        }

        // The profile payload mixes string custom properties with structural
        // fields; only the string-valued ones are addressable properties.
        let body: serde_json::Map<String, Value> = response.json().await?;
        let mut record = UserRecord::new();
        for (name, value) in body {
            if let Value::String(s) = value {
                record = record.with_property(name, s);
            }
        }
        Ok(record)
    }

    async fn update_properties(&self, updates: &PropertyUpdates) -> Result<(), IdentityError> {
        let response = self
            .client
            .put(self.profile_url())
            .bearer_auth(&self.config.api_key)
            .json(updates)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityError::HttpStatus(response.status()));
        }
        Ok(())
    }
}
