use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::configuration::AwsSettings;
use crate::error::AppError;
use crate::routes::regions::resolve_region;
use crate::stepfunctions::{PageRequest, StepFunctions};

#[derive(Debug, Deserialize)]
pub struct MachinesQuery {
    pub region: Option<String>,
    pub count: Option<String>,
    #[serde(rename = "nextToken")]
    pub next_token: Option<String>,
}

/// Paging parameters from raw query values. A `count` that is not a positive
/// integer is ignored, as is an empty `nextToken`.
pub fn page_request(count: Option<&str>, next_token: Option<&str>) -> PageRequest {
    PageRequest {
        max_results: count
            .and_then(|c| c.trim().parse::<i32>().ok())
            .filter(|c| *c > 0),
        next_token: next_token
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    }
}

/// GET /aws/machines
pub async fn list_machines(
    query: web::Query<MachinesQuery>,
    sfn: web::Data<Arc<dyn StepFunctions>>,
    aws: web::Data<AwsSettings>,
) -> Result<HttpResponse, AppError> {
    let region = resolve_region(query.region.as_deref(), &aws);
    let page = page_request(query.count.as_deref(), query.next_token.as_deref());

    let machines = sfn.list_state_machines(&region, page).await?;

    tracing::debug!(
        region = %region,
        returned = machines.state_machines.len(),
        "Listed state machines"
    );
    Ok(HttpResponse::Ok().json(machines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_parsing_is_lenient() {
        assert_eq!(page_request(Some("25"), None).max_results, Some(25));
        assert_eq!(page_request(Some("abc"), None).max_results, None);
        assert_eq!(page_request(Some("-3"), None).max_results, None);
        assert_eq!(page_request(None, None).max_results, None);
    }

    #[test]
    fn test_empty_next_token_is_dropped() {
        assert_eq!(page_request(None, Some("")).next_token, None);
        assert_eq!(
            page_request(None, Some("abc")).next_token,
            Some("abc".to_string())
        );
    }
}
