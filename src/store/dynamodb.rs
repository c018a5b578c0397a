use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;

use super::{UserRecord, UserStore};
use crate::error::StoreError;

/// User store backed by a DynamoDB table with partition key `username`.
#[derive(Debug, Clone)]
pub struct DynamoDbUserStore {
    client: aws_sdk_dynamodb::Client,
    table: String,
}

impl DynamoDbUserStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, table: impl Into<String>) -> Self {
        let table = table.into();
        tracing::info!(table = %table, "DynamoDB user store initialized");
        Self {
            client: aws_sdk_dynamodb::Client::new(sdk_config),
            table,
        }
    }
}

#[async_trait]
impl UserStore for DynamoDbUserStore {
    async fn get(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("username", AttributeValue::S(username.to_string()))
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(DisplayErrorContext(&e).to_string()))?;

        match output.item() {
            None => Ok(None),
            Some(item) => {
                let record = record_from_item(item)?;
                // Items without a password hash cannot be logged into.
                if record.password.is_empty() {
                    tracing::warn!(username = %username, "User item has no password hash");
                    return Ok(None);
                }
                Ok(Some(record))
            }
        }
    }

    async fn create(&self, record: UserRecord) -> Result<(), StoreError> {
        let username = record.username.clone();

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item_from_record(record)))
            .condition_expression("attribute_not_exists(username)")
            .send()
            .await
            .map_err(|e| {
                let detail = DisplayErrorContext(&e).to_string();
                if e.into_service_error().is_conditional_check_failed_exception() {
                    StoreError::WriteRejected(format!("user {} already exists", username))
                } else {
                    StoreError::Unavailable(detail)
                }
            })?;

        tracing::info!(username = %username, table = %self.table, "User added to DynamoDB");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "dynamodb"
    }
}

fn string_attribute(
    item: &HashMap<String, AttributeValue>,
    name: &str,
) -> Result<Option<String>, StoreError> {
    match item.get(name) {
        None => Ok(None),
        Some(AttributeValue::S(value)) => Ok(Some(value.clone())),
        Some(_) => Err(StoreError::CorruptRecord(format!(
            "attribute {} is not a string",
            name
        ))),
    }
}

fn record_from_item(item: &HashMap<String, AttributeValue>) -> Result<UserRecord, StoreError> {
    let username = string_attribute(item, "username")?
        .ok_or_else(|| StoreError::CorruptRecord("attribute username is missing".to_string()))?;

    Ok(UserRecord {
        firstname: string_attribute(item, "firstname")?.unwrap_or_default(),
        lastname: string_attribute(item, "lastname")?.unwrap_or_default(),
        username,
        password: string_attribute(item, "password")?.unwrap_or_default(),
        email: string_attribute(item, "email")?.unwrap_or_default(),
    })
}

fn item_from_record(record: UserRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("firstname".to_string(), AttributeValue::S(record.firstname)),
        ("lastname".to_string(), AttributeValue::S(record.lastname)),
        ("username".to_string(), AttributeValue::S(record.username)),
        ("password".to_string(), AttributeValue::S(record.password)),
        ("email".to_string(), AttributeValue::S(record.email)),
    ])
}
