/// Execution Routes
///
/// List, describe, start and re-run Step Functions executions. The target region
/// comes from the `region` query parameter on every route.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::configuration::AwsSettings;
use crate::error::AppError;
use crate::routes::machines::page_request;
use crate::routes::regions::{resolve_region, RegionQuery};
use crate::stepfunctions::{
    is_execution_status, rerun_batch, rerun_execution, ExecutionListQuery, StepFunctions,
};

const DEFAULT_INPUT: &str = "{}";

#[derive(Debug, Deserialize)]
pub struct ExecutionsQuery {
    pub machine: String,
    pub region: Option<String>,
    pub count: Option<String>,
    #[serde(rename = "nextToken")]
    pub next_token: Option<String>,
    #[serde(rename = "statusFilter")]
    pub status_filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StartExecutionForm {
    pub machine: String,
    #[serde(default)]
    pub input: String,
}

#[derive(Debug, Deserialize)]
pub struct RestartExecutionForm {
    pub machine: String,
    pub execution: String,
}

#[derive(Debug, Deserialize)]
pub struct BatchRestartForm {
    pub machine: String,
    /// JSON array of execution ARNs
    pub executions: String,
    #[serde(rename = "useOriginalInput")]
    pub use_original_input: String,
    #[serde(default)]
    pub input: String,
}

/// Boolean form value, accepting the spellings `1 t T TRUE true True` and their
/// false counterparts.
pub fn parse_form_bool(field: &str, value: &str) -> Result<bool, AppError> {
    match value.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(AppError::BadRequest(format!("{} must be a boolean", field))),
    }
}

/// GET /aws/executions
///
/// A `statusFilter` outside the Step Functions status set is ignored.
pub async fn list_executions(
    query: web::Query<ExecutionsQuery>,
    sfn: web::Data<Arc<dyn StepFunctions>>,
    aws: web::Data<AwsSettings>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    if query.machine.trim().is_empty() {
        return Err(AppError::BadRequest("machine is required".to_string()));
    }

    let region = resolve_region(query.region.as_deref(), &aws);
    let status_filter = match query.status_filter {
        Some(status) if is_execution_status(&status) => Some(status),
        Some(status) => {
            tracing::debug!(status = %status, "Ignoring unknown status filter");
            None
        }
        None => None,
    };

    let list_query = ExecutionListQuery {
        machine_arn: query.machine,
        page: page_request(query.count.as_deref(), query.next_token.as_deref()),
        status_filter,
    };

    let page = sfn.list_executions(&region, list_query).await?;
    Ok(HttpResponse::Ok().json(page))
}

/// GET /aws/execution/{execution}
pub async fn describe_execution(
    path: web::Path<String>,
    query: web::Query<RegionQuery>,
    sfn: web::Data<Arc<dyn StepFunctions>>,
    aws: web::Data<AwsSettings>,
) -> Result<HttpResponse, AppError> {
    let execution_arn = path.into_inner();
    let region = resolve_region(query.region.as_deref(), &aws);

    let description = sfn.describe_execution(&region, &execution_arn).await?;
    Ok(HttpResponse::Ok().json(description))
}

/// POST /aws/execution
///
/// Starts `machine` with `input`, or with `{}` when no input is given.
pub async fn start_execution(
    form: web::Form<StartExecutionForm>,
    query: web::Query<RegionQuery>,
    sfn: web::Data<Arc<dyn StepFunctions>>,
    aws: web::Data<AwsSettings>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let region = resolve_region(query.region.as_deref(), &aws);
    let input = if form.input.is_empty() {
        DEFAULT_INPUT
    } else {
        form.input.as_str()
    };

    let started = sfn.start_execution(&region, &form.machine, input).await?;
    Ok(HttpResponse::Ok().json(started))
}

/// POST /aws/execution/restart
///
/// Starts `machine` again with the input of `execution`.
pub async fn restart_execution(
    form: web::Form<RestartExecutionForm>,
    query: web::Query<RegionQuery>,
    sfn: web::Data<Arc<dyn StepFunctions>>,
    aws: web::Data<AwsSettings>,
) -> Result<HttpResponse, AppError> {
    let region = resolve_region(query.region.as_deref(), &aws);

    let started =
        rerun_execution(sfn.get_ref().as_ref(), &region, &form.machine, &form.execution, "")
            .await?;

    tracing::info!(
        execution = %form.execution,
        restarted_as = %started.execution_arn,
        "Execution restarted"
    );
    Ok(HttpResponse::Ok().json(started))
}

/// POST /aws/execution/batch
///
/// Re-runs every execution in `executions`, with the form `input` or, when
/// `useOriginalInput` is set or no input is given, with each execution's own
/// input. Per-execution failures are reported in `Errors` and do not fail the
/// request.
///
/// # Errors
/// - 400: `executions` is not a JSON array of strings, or `useOriginalInput`
///   is not a boolean
pub async fn batch_restart(
    form: web::Form<BatchRestartForm>,
    query: web::Query<RegionQuery>,
    sfn: web::Data<Arc<dyn StepFunctions>>,
    aws: web::Data<AwsSettings>,
) -> Result<HttpResponse, AppError> {
    let form = form.into_inner();
    let region = resolve_region(query.region.as_deref(), &aws);

    let executions: Vec<String> = serde_json::from_str(&form.executions).map_err(|e| {
        AppError::BadRequest(format!("executions must be a JSON array of strings: {}", e))
    })?;
    let use_original_input = parse_form_bool("useOriginalInput", &form.use_original_input)?;

    // An empty input makes each re-run reuse its original input.
    let input = if use_original_input {
        ""
    } else {
        form.input.as_str()
    };

    let outcome = rerun_batch(
        sfn.get_ref().as_ref(),
        &region,
        &form.machine,
        &executions,
        input,
    )
    .await;

    Ok(HttpResponse::Ok().json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_bool_spellings() {
        assert!(parse_form_bool("flag", "true").unwrap());
        assert!(parse_form_bool("flag", "T").unwrap());
        assert!(parse_form_bool("flag", "1").unwrap());
        assert!(!parse_form_bool("flag", "False").unwrap());
        assert!(!parse_form_bool("flag", "0").unwrap());
    }

    #[test]
    fn test_form_bool_rejects_other_values() {
        assert!(matches!(
            parse_form_bool("flag", "yes"),
            Err(AppError::BadRequest(_))
        ));
        assert!(parse_form_bool("flag", "").is_err());
    }
}
