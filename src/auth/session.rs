/// Session flow
///
/// Login, account creation, token refresh and logout. Nothing here is persisted:
/// a session exists only as the token pair held by the client.

use std::sync::Arc;

use actix_web::web;

use crate::auth::claims::RefreshKind;
use crate::auth::clock::Clock;
use crate::auth::jwt::{TokenIssuer, TokenPair, TokenVerifier};
use crate::auth::password::PasswordHasher;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};
use crate::store::{UserRecord, UserStore};
use crate::validators::{is_valid_email, is_valid_name, is_valid_password, is_valid_username};

pub const LOGOUT_MESSAGE: &str = "Successfully logged out user";

/// Checked against when the user does not exist, so an unknown username costs the
/// same bcrypt work as a wrong password.
const TIMING_DUMMY_PASSWORD: &str = "timing-equalizer";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserRecord,
    pub tokens: TokenPair,
}

/// Registration input, password still in plaintext
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
}

#[derive(Clone)]
pub struct SessionFlow {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    issuer: TokenIssuer,
    verifier: TokenVerifier,
    dummy_hash: Arc<str>,
}

impl SessionFlow {
    pub fn new(
        store: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        issuer: TokenIssuer,
        verifier: TokenVerifier,
    ) -> Self {
        let dummy_hash = hasher.hash(TIMING_DUMMY_PASSWORD).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to prepare dummy password hash");
            String::new()
        });

        Self {
            store,
            hasher,
            issuer,
            verifier,
            dummy_hash: dummy_hash.into(),
        }
    }

    pub fn from_settings(
        config: &AuthSettings,
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            store,
            PasswordHasher::new(config.bcrypt_cost),
            TokenIssuer::new(config, clock.clone()),
            TokenVerifier::new(config, clock),
        )
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Check credentials and issue a token pair
    ///
    /// # Errors
    /// - `AuthError::InvalidCredentials` for an unknown user, a wrong password or an
    ///   unreadable user store; callers cannot tell these apart
    /// - `AppError::Internal` if signing fails
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let user = match self.store.get(username).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                tracing::info!(username = %username, "Login for unknown user");
                None
            }
            Err(e) => {
                tracing::error!(
                    username = %username,
                    backend = self.store.backend_name(),
                    error = %e,
                    "User lookup failed during login"
                );
                None
            }
        };

        let hasher = self.hasher;
        let candidate = password.to_string();
        let stored_hash = match &user {
            Some(user) => user.password.clone(),
            None => self.dummy_hash.to_string(),
        };
        let matches = web::block(move || hasher.verify(&candidate, &stored_hash)).await?;

        let user = match user {
            Some(user) if matches => user,
            _ => return Err(AuthError::InvalidCredentials.into()),
        };

        let tokens = self.issuer.issue_token_pair(&user.username)?;

        tracing::info!(username = %user.username, "User logged in successfully");
        Ok(LoginOutcome { user, tokens })
    }

    /// Hash the password and persist a new user
    ///
    /// # Returns
    /// The stored record, whose `password` is the bcrypt hash
    ///
    /// # Errors
    /// - 400-class `Validation` errors for bad input
    /// - `Store` if the store rejects the write or is unreachable
    pub async fn create_account(&self, account: NewAccount) -> Result<UserRecord, AppError> {
        let username = is_valid_username(&account.username)?;
        is_valid_password(&account.password)?;
        let email = is_valid_email(&account.email)?;
        let firstname = is_valid_name("firstname", &account.firstname)?;
        let lastname = is_valid_name("lastname", &account.lastname)?;

        let hasher = self.hasher;
        let plaintext = account.password;
        let password_hash = web::block(move || hasher.hash(&plaintext)).await??;

        let record = UserRecord {
            firstname,
            lastname,
            username,
            password: password_hash,
            email,
        };

        self.store.create(record.clone()).await?;

        tracing::info!(
            username = %record.username,
            backend = self.store.backend_name(),
            "User created successfully"
        );
        Ok(record)
    }

    /// Exchange a refresh token for a new token pair
    ///
    /// # Errors
    /// - `TokenInvalid`/`TokenExpired` if the token does not verify
    /// - `UnauthorizedRefresh` if the token's `sub` marker is not "authorized"
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = self.verifier.parse(refresh_token).map_err(|e| {
            tracing::warn!(error = %e, "Refresh token rejected");
            AppError::from(e)
        })?;

        if claims.refresh_kind() != Some(RefreshKind::Authorized) {
            tracing::warn!(username = %claims.user, sub = ?claims.sub, "Unauthorized user access");
            return Err(AuthError::UnauthorizedRefresh.into());
        }

        let tokens = self.issuer.issue_token_pair(&claims.user)?;

        tracing::info!(username = %claims.user, "Token refreshed successfully");
        Ok(tokens)
    }

    /// Acknowledge a logout. Tokens are not revoked server-side: the client is
    /// expected to discard them, and they stay valid until `exp`.
    pub async fn logout(&self, access_token: &str) -> Result<&'static str, AppError> {
        let claims = self.verifier.parse(access_token).map_err(|e| {
            tracing::warn!(error = %e, "Invalid JWT token on logout");
            AppError::from(e)
        })?;

        tracing::info!(
            username = %claims.user,
            expires_at = claims.exp,
            "User logged out"
        );
        Ok(LOGOUT_MESSAGE)
    }
}
