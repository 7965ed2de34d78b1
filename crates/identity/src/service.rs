use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::record::{PropertyUpdates, UserRecord};

/// Errors surfaced by identity-service adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("no signed-in user")]
    NoUser,

    #[error("identity request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Contract of the external system of record for user properties.
///
/// Calls are best-effort and fire-once: nothing here retries, and a fetch
/// failure simply aborts initialization of the lesson module that issued it.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Fetch the signed-in user's record.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` when there is no signed-in user or the
    /// backing call fails.
    async fn fetch_current_user(&self) -> Result<UserRecord, IdentityError>;

    /// Apply a partial property update to the current user.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError` when the backing call fails. The update is
    /// not retried.
    async fn update_properties(&self, updates: &PropertyUpdates) -> Result<(), IdentityError>;
}

/// In-memory identity service for tests and prototyping. Records every
/// update payload it receives, in order, so tests can assert on the exact
/// wire-equivalent values.
#[derive(Clone, Default)]
pub struct InMemoryIdentity {
    record: Arc<Mutex<UserRecord>>,
    updates: Arc<Mutex<Vec<PropertyUpdates>>>,
}

impl InMemoryIdentity {
    #[must_use]
    pub fn new(record: UserRecord) -> Self {
        Self {
            record: Arc::new(Mutex::new(record)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every update payload received so far, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn recorded_updates(&self) -> Vec<PropertyUpdates> {
        self.updates.lock().expect("updates lock poisoned").clone()
    }

    /// The record as the service currently stores it.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn current_record(&self) -> UserRecord {
        self.record.lock().expect("record lock poisoned").clone()
    }
}

#[async_trait]
impl IdentityService for InMemoryIdentity {
    async fn fetch_current_user(&self) -> Result<UserRecord, IdentityError> {
        let guard = self
            .record
            .lock()
            .map_err(|e| IdentityError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }

    async fn update_properties(&self, updates: &PropertyUpdates) -> Result<(), IdentityError> {
        let mut record = self
            .record
            .lock()
            .map_err(|e| IdentityError::Connection(e.to_string()))?;
        record.apply(updates);
        self.updates
            .lock()
            .map_err(|e| IdentityError::Connection(e.to_string()))?
            .push(updates.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trips_property_updates() {
        let identity =
            InMemoryIdentity::new(UserRecord::new().with_property("CompletedLessons", r#"["L1"]"#));

        let mut updates = PropertyUpdates::new();
        updates.set("CompletedLessons", r#"["L1","L2"]"#);
        identity.update_properties(&updates).await.unwrap();

        let fetched = identity.fetch_current_user().await.unwrap();
        assert_eq!(fetched.property("CompletedLessons"), Some(r#"["L1","L2"]"#));
        assert_eq!(identity.recorded_updates(), vec![updates]);
    }
}
