/// Token gate for the `/aws` routes
///
/// Reads the raw token from the `Authorization` header, validates it and injects
/// the claims into request extensions. With `AuthCheck::Disabled` every request
/// is forwarded unchecked.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, AUTHORIZATION},
    Error, HttpMessage, ResponseError,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::TokenVerifier;
use crate::configuration::AuthCheck;
use crate::error::{AppError, AuthError};

/// Token carried in the `Authorization` header. The header holds the bare token;
/// a `Bearer ` prefix is tolerated. A lone `Bearer` counts as no token.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = match value {
        "Bearer" => "",
        _ => value.strip_prefix("Bearer ").unwrap_or(value).trim(),
    };

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Answer the request with the error envelope without calling the inner service.
fn reject<B>(req: ServiceRequest, error: AppError) -> ServiceResponse<EitherBody<B>> {
    req.into_response(error.error_response()).map_into_right_body()
}

pub struct AuthGate {
    verifier: TokenVerifier,
    auth_check: AuthCheck,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier, auth_check: AuthCheck) -> Self {
        Self {
            verifier,
            auth_check,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthGateService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthGateService {
            service: Rc::new(service),
            verifier: self.verifier.clone(),
            auth_check: self.auth_check,
        }))
    }
}

pub struct AuthGateService<S> {
    service: Rc<S>,
    verifier: TokenVerifier,
    auth_check: AuthCheck,
}

impl<S, B> Service<ServiceRequest> for AuthGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        if self.auth_check == AuthCheck::Disabled {
            return Box::pin(async move { Ok(service.call(req).await?.map_into_left_body()) });
        }

        let token = match extract_token(req.headers()) {
            Some(token) => token,
            None => {
                tracing::warn!(path = %req.path(), "Missing Authorization header");
                let res = reject(req, AuthError::MissingToken.into());
                return Box::pin(async move { Ok(res) });
            }
        };

        let rejection = match self.verifier.parse(&token) {
            Ok(claims) if claims.is_authorized() => {
                tracing::debug!(username = %claims.user, "JWT validated successfully");
                req.extensions_mut().insert(claims);
                return Box::pin(async move { Ok(service.call(req).await?.map_into_left_body()) });
            }
            Ok(claims) => {
                tracing::warn!(username = %claims.user, "Token is not an access token");
                AppError::Auth(AuthError::TokenInvalid)
            }
            Err(e) => {
                tracing::warn!(error = %e, "JWT validation failed");
                AppError::from(e)
            }
        };

        let res = reject(req, rejection);
        Box::pin(async move { Ok(res) })
    }
}
