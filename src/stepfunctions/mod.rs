/// AWS Step Functions pass-through.
///
/// Handlers talk to a `StepFunctions` trait object so the control plane can be
/// swapped out in tests. Responses are plain serializable structs whose JSON field
/// names follow the Step Functions API (`ExecutionArn`, `NextToken`, ...).

mod aws;

pub use aws::AwsStepFunctions;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;

/// Execution states accepted by `ListExecutions` as a status filter
pub const EXECUTION_STATUSES: [&str; 6] = [
    "RUNNING",
    "SUCCEEDED",
    "FAILED",
    "TIMED_OUT",
    "ABORTED",
    "PENDING_REDRIVE",
];

pub fn is_execution_status(value: &str) -> bool {
    EXECUTION_STATUSES.contains(&value)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub max_results: Option<i32>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionListQuery {
    pub machine_arn: String,
    pub page: PageRequest,
    pub status_filter: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionSummary {
    pub execution_arn: String,
    pub state_machine_arn: String,
    pub name: String,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub stop_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionPage {
    pub executions: Vec<ExecutionSummary>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct ExecutionDescription {
    pub execution_arn: String,
    pub state_machine_arn: String,
    pub name: Option<String>,
    pub status: String,
    pub start_date: DateTime<Utc>,
    pub stop_date: Option<DateTime<Utc>>,
    pub input: Option<String>,
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StartedExecution {
    pub execution_arn: String,
    pub start_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StateMachineSummary {
    pub state_machine_arn: String,
    pub name: String,
    pub r#type: String,
    pub creation_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct StateMachinePage {
    pub state_machines: Vec<StateMachineSummary>,
    pub next_token: Option<String>,
}

/// Operations used from the Step Functions control plane. Every call names the
/// region it targets.
#[async_trait]
pub trait StepFunctions: Send + Sync {
    async fn list_executions(
        &self,
        region: &str,
        query: ExecutionListQuery,
    ) -> Result<ExecutionPage, UpstreamError>;

    async fn describe_execution(
        &self,
        region: &str,
        execution_arn: &str,
    ) -> Result<ExecutionDescription, UpstreamError>;

    async fn start_execution(
        &self,
        region: &str,
        machine_arn: &str,
        input: &str,
    ) -> Result<StartedExecution, UpstreamError>;

    async fn list_state_machines(
        &self,
        region: &str,
        page: PageRequest,
    ) -> Result<StateMachinePage, UpstreamError>;
}

/// Start a new execution of `machine_arn`.
///
/// With an empty `input`, the input of `execution_arn` is looked up and reused.
pub async fn rerun_execution(
    sfn: &dyn StepFunctions,
    region: &str,
    machine_arn: &str,
    execution_arn: &str,
    input: &str,
) -> Result<StartedExecution, UpstreamError> {
    let input = if input.is_empty() {
        sfn.describe_execution(region, execution_arn)
            .await?
            .input
            .ok_or_else(|| UpstreamError::MissingField(format!("input of {}", execution_arn)))?
    } else {
        input.to_string()
    };

    sfn.start_execution(region, machine_arn, &input).await
}

/// Outcome of a batch re-run: started executions plus one message per failure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchOutcome {
    #[serde(rename = "Execution")]
    pub executions: Vec<StartedExecution>,
    #[serde(rename = "Errors")]
    pub errors: Vec<String>,
}

/// Re-run each execution in turn. Failures are collected, not propagated.
pub async fn rerun_batch(
    sfn: &dyn StepFunctions,
    region: &str,
    machine_arn: &str,
    execution_arns: &[String],
    input: &str,
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for execution_arn in execution_arns {
        match rerun_execution(sfn, region, machine_arn, execution_arn, input).await {
            Ok(started) => outcome.executions.push(started),
            Err(e) => {
                tracing::warn!(execution = %execution_arn, error = %e, "Batch re-run failed");
                outcome.errors.push(e.to_string());
            }
        }
    }

    tracing::info!(
        machine = %machine_arn,
        started = outcome.executions.len(),
        failed = outcome.errors.len(),
        "Batch re-run finished"
    );
    outcome
}
