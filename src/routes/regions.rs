use actix_web::HttpResponse;
use serde::Deserialize;

use crate::configuration::AwsSettings;

/// Regions offered to clients for the `region` parameter
pub const AWS_REGIONS: [&str; 17] = [
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "eu-central-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "eu-north-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-south-1",
    "sa-east-1",
];

/// Optional `region` query parameter shared by the `/aws` routes
#[derive(Debug, Default, Deserialize)]
pub struct RegionQuery {
    pub region: Option<String>,
}

/// Requested region, or the configured default when absent or blank.
pub fn resolve_region(requested: Option<&str>, aws: &AwsSettings) -> String {
    requested
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(&aws.default_region)
        .to_string()
}

/// GET /aws/regions
pub async fn list_regions() -> HttpResponse {
    HttpResponse::Ok().json(AWS_REGIONS)
}
