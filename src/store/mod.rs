/// User record storage.
///
/// The session layer only needs two operations from the user store, `get` and
/// `create`, so it talks to a `UserStore` trait object. Production uses DynamoDB,
/// local runs and tests use the in-memory map.

mod dynamodb;
mod memory;

pub use dynamodb::DynamoDbUserStore;
pub use memory::InMemoryUserStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// A user as persisted in the store. `password` is always the bcrypt hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub password: String,
    pub email: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user by username. `Ok(None)` when no such user exists.
    async fn get(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Persist a new user. Fails if the username is already taken.
    async fn create(&self, record: UserRecord) -> Result<(), StoreError>;

    fn backend_name(&self) -> &'static str;
}
