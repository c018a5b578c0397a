/// CORS policy for browser clients
///
/// Built on `actix-cors`. A configured origin of `*` accepts any origin by echoing
/// the request's `Origin`, since browsers refuse a literal `*` on credentialed
/// responses. Preflights are answered before routing, so they never reach the
/// token gate.

use actix_cors::Cors;
use actix_web::http::header;

use crate::configuration::CorsSettings;

const ALLOW_METHODS: [&str; 6] = ["GET", "POST", "PATCH", "PUT", "DELETE", "OPTIONS"];

const MAX_AGE_SECS: usize = 3600;

fn allow_headers() -> Vec<header::HeaderName> {
    vec![
        header::ACCEPT,
        header::CONTENT_TYPE,
        header::CONTENT_LENGTH,
        header::ACCEPT_ENCODING,
        header::AUTHORIZATION,
        header::HeaderName::from_static("x-csrf-token"),
        header::HeaderName::from_static("x-request-id"),
    ]
}

/// CORS middleware for the configured origin
pub fn cors_policy(settings: &CorsSettings) -> Cors {
    let cors = if settings.allows_any_origin() {
        Cors::default().allow_any_origin()
    } else {
        Cors::default().allowed_origin(settings.allowed_origin.trim())
    };

    cors.allowed_methods(ALLOW_METHODS)
        .allowed_headers(allow_headers())
        .expose_headers([header::HeaderName::from_static("x-request-id")])
        .supports_credentials()
        .max_age(MAX_AGE_SECS)
}
