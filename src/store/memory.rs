use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{UserRecord, UserStore};
use crate::error::StoreError;

/// Process-local user store keyed by username.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `records`.
    pub fn with_users(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let users = records
            .into_iter()
            .map(|record| (record.username.clone(), record))
            .collect();
        Self {
            users: RwLock::new(users),
        }
    }

    pub fn len(&self) -> usize {
        self.users.read().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(users.get(username).cloned())
    }

    async fn create(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        if users.contains_key(&record.username) {
            return Err(StoreError::WriteRejected(format!(
                "user {} already exists",
                record.username
            )));
        }

        tracing::info!(username = %record.username, "User added to in-memory store");
        users.insert(record.username.clone(), record);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
