use async_trait::async_trait;
use aws_sdk_sfn::config::Region;
use aws_sdk_sfn::error::DisplayErrorContext;
use aws_sdk_sfn::primitives::DateTime as AwsDateTime;
use aws_sdk_sfn::types::ExecutionStatus;
use chrono::{DateTime, Utc};

use super::{
    ExecutionDescription, ExecutionListQuery, ExecutionPage, ExecutionSummary, PageRequest,
    StartedExecution, StateMachinePage, StateMachineSummary, StepFunctions,
};
use crate::error::UpstreamError;

/// Step Functions client built per request region from one shared SDK config.
#[derive(Debug, Clone)]
pub struct AwsStepFunctions {
    sdk_config: aws_config::SdkConfig,
}

impl AwsStepFunctions {
    pub fn new(sdk_config: aws_config::SdkConfig) -> Self {
        Self { sdk_config }
    }

    fn client(&self, region: &str) -> aws_sdk_sfn::Client {
        let config = aws_sdk_sfn::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        aws_sdk_sfn::Client::from_conf(config)
    }
}

fn to_utc(value: &AwsDateTime) -> Result<DateTime<Utc>, UpstreamError> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
        .ok_or_else(|| UpstreamError::MissingField(format!("valid timestamp ({:?})", value)))
}

fn to_utc_opt(value: Option<&AwsDateTime>) -> Result<Option<DateTime<Utc>>, UpstreamError> {
    value.map(to_utc).transpose()
}

fn request_error<E>(e: E) -> UpstreamError
where
    E: std::error::Error,
{
    UpstreamError::Request(DisplayErrorContext(e).to_string())
}

#[async_trait]
impl StepFunctions for AwsStepFunctions {
    async fn list_executions(
        &self,
        region: &str,
        query: ExecutionListQuery,
    ) -> Result<ExecutionPage, UpstreamError> {
        let output = self
            .client(region)
            .list_executions()
            .state_machine_arn(query.machine_arn)
            .set_max_results(query.page.max_results)
            .set_next_token(query.page.next_token)
            .set_status_filter(query.status_filter.as_deref().map(ExecutionStatus::from))
            .send()
            .await
            .map_err(request_error)?;

        let executions = output
            .executions()
            .iter()
            .map(|item| {
                Ok(ExecutionSummary {
                    execution_arn: item.execution_arn().to_string(),
                    state_machine_arn: item.state_machine_arn().to_string(),
                    name: item.name().to_string(),
                    status: item.status().as_str().to_string(),
                    start_date: to_utc(item.start_date())?,
                    stop_date: to_utc_opt(item.stop_date())?,
                })
            })
            .collect::<Result<Vec<_>, UpstreamError>>()?;

        Ok(ExecutionPage {
            executions,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn describe_execution(
        &self,
        region: &str,
        execution_arn: &str,
    ) -> Result<ExecutionDescription, UpstreamError> {
        let output = self
            .client(region)
            .describe_execution()
            .execution_arn(execution_arn)
            .send()
            .await
            .map_err(request_error)?;

        Ok(ExecutionDescription {
            execution_arn: output.execution_arn().to_string(),
            state_machine_arn: output.state_machine_arn().to_string(),
            name: output.name().map(str::to_string),
            status: output.status().as_str().to_string(),
            start_date: to_utc(output.start_date())?,
            stop_date: to_utc_opt(output.stop_date())?,
            input: output.input().map(str::to_string),
            output: output.output().map(str::to_string),
        })
    }

    async fn start_execution(
        &self,
        region: &str,
        machine_arn: &str,
        input: &str,
    ) -> Result<StartedExecution, UpstreamError> {
        let output = self
            .client(region)
            .start_execution()
            .state_machine_arn(machine_arn)
            .input(input)
            .send()
            .await
            .map_err(request_error)?;

        tracing::info!(
            machine = %machine_arn,
            execution = %output.execution_arn(),
            region = %region,
            "Execution started"
        );

        Ok(StartedExecution {
            execution_arn: output.execution_arn().to_string(),
            start_date: to_utc(output.start_date())?,
        })
    }

    async fn list_state_machines(
        &self,
        region: &str,
        page: PageRequest,
    ) -> Result<StateMachinePage, UpstreamError> {
        let output = self
            .client(region)
            .list_state_machines()
            .set_max_results(page.max_results)
            .set_next_token(page.next_token)
            .send()
            .await
            .map_err(request_error)?;

        let state_machines = output
            .state_machines()
            .iter()
            .map(|item| {
                Ok(StateMachineSummary {
                    state_machine_arn: item.state_machine_arn().to_string(),
                    name: item.name().to_string(),
                    r#type: item.r#type().as_str().to_string(),
                    creation_date: to_utc(item.creation_date())?,
                })
            })
            .collect::<Result<Vec<_>, UpstreamError>>()?;

        Ok(StateMachinePage {
            state_machines,
            next_token: output.next_token().map(str::to_string),
        })
    }
}
