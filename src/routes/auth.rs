/// Authentication Routes
///
/// Login, account creation, token refresh and logout. All logic lives in
/// `SessionFlow`; these handlers only decode requests and shape responses.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{NewAccount, SessionFlow, TokenPair};
use crate::error::{AppError, AuthError};
use crate::middleware::extract_token;
use crate::store::UserRecord;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// User creation request
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub email: String,
}

/// Token refresh request
#[derive(Deserialize)]
pub struct RefreshRequest {
    #[serde(alias = "refreshToken", alias = "RefreshToken")]
    pub refreshtoken: String,
}

/// Login response: the user's profile plus a fresh token pair
#[derive(Serialize)]
pub struct LoginResponse {
    pub firstname: String,
    pub lastname: String,
    pub username: String,
    pub email: String,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

/// POST /login
///
/// # Errors
/// - 400: Body is not a `{username, password}` JSON object
/// - 401: Unknown user or wrong password (indistinguishable)
pub async fn login(
    body: web::Json<LoginRequest>,
    session: web::Data<SessionFlow>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let outcome = session.login(&body.username, &body.password).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        firstname: outcome.user.firstname,
        lastname: outcome.user.lastname,
        username: outcome.user.username,
        email: outcome.user.email,
        tokens: outcome.tokens,
    }))
}

/// POST /createuser
///
/// Responds with the stored record; its `password` is the bcrypt hash.
///
/// # Errors
/// - 400: Validation errors
/// - 500: The user store rejected the write or is unreachable
pub async fn create_user(
    body: web::Json<CreateUserRequest>,
    session: web::Data<SessionFlow>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let record: UserRecord = session
        .create_account(NewAccount {
            username: body.username,
            password: body.password,
            firstname: body.firstname,
            lastname: body.lastname,
            email: body.email,
        })
        .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// POST /refreshtoken
///
/// # Errors
/// - 400: Body has no refresh token field
/// - 401: Token is invalid, expired or not marked for refresh
pub async fn refresh_token(
    body: web::Json<RefreshRequest>,
    session: web::Data<SessionFlow>,
) -> Result<HttpResponse, AppError> {
    let tokens = session.refresh(&body.refreshtoken).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// GET /logout
///
/// Advisory only: the token stays valid until it expires.
pub async fn logout(
    req: HttpRequest,
    session: web::Data<SessionFlow>,
) -> Result<HttpResponse, AppError> {
    let token = extract_token(req.headers()).ok_or(AuthError::MissingToken)?;
    let message = session.logout(&token).await?;
    Ok(HttpResponse::Ok().json(message))
}
