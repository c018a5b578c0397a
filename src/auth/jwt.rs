/// JWT Token Generation and Validation
///
/// `TokenIssuer` mints access and refresh tokens, `TokenVerifier` checks them.
/// Both are built from `AuthSettings` at startup and share the same HMAC secret.

use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize, Serializer};

use crate::auth::claims::{AccessClaims, Claims, RefreshClaims, RefreshKind};
use crate::auth::clock::Clock;
use crate::configuration::AuthSettings;
use crate::error::TokenError;

/// Algorithms accepted on incoming tokens. Anything else is rejected before the
/// signature is looked at.
const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// The part of the JOSE header looked at before verification
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Read `alg` straight from the header segment, so names jsonwebtoken does not
/// know (`none`, ...) are reported as unexpected rather than malformed.
fn header_algorithm(token: &str) -> Result<Algorithm, TokenError> {
    let segment = token
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TokenError::Malformed("missing header".to_string()))?;
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| TokenError::Malformed(format!("header is not base64url: {}", e)))?;
    let header: RawHeader = serde_json::from_slice(&bytes)
        .map_err(|e| TokenError::Malformed(format!("header is not valid JSON: {}", e)))?;

    match header.alg.as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(TokenError::UnexpectedAlgorithm(header.alg)),
    }
}

/// Access and refresh token handed to the client
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenPair {
    #[serde(rename = "accessToken")]
    pub access_token: String,
    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
    /// Access token expiry in Unix seconds, sent as a decimal string
    #[serde(rename = "expiresAt", serialize_with = "as_decimal_string")]
    pub access_expires_at: i64,
}

fn as_decimal_string<S>(value: &i64, ser: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    ser.serialize_str(&value.to_string())
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    access_token_ttl: i64,
    refresh_token_ttl: i64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(config: &AuthSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            access_token_ttl: config.access_token_ttl,
            refresh_token_ttl: config.refresh_token_ttl,
            clock,
        }
    }

    /// Generate an access token for `user`
    ///
    /// # Returns
    /// The compact token and its expiry (Unix seconds)
    ///
    /// # Errors
    /// Returns `TokenError::Signing` if token generation fails
    pub fn issue_access_token(&self, user: &str) -> Result<(String, i64), TokenError> {
        let claims = AccessClaims::new(user, self.clock.now(), self.access_token_ttl);
        let token = self.sign(&claims)?;
        Ok((token, claims.exp))
    }

    /// Generate a refresh token for `user`, marked as authorized for refresh
    pub fn issue_refresh_token(&self, user: &str) -> Result<String, TokenError> {
        let claims = RefreshClaims::new(
            user,
            RefreshKind::Authorized,
            self.clock.now(),
            self.refresh_token_ttl,
        );
        self.sign(&claims)
    }

    pub fn issue_token_pair(&self, user: &str) -> Result<TokenPair, TokenError> {
        let (access_token, access_expires_at) = self.issue_access_token(user)?;
        let refresh_token = self.issue_refresh_token(user)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            access_expires_at,
        })
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    pub fn new(config: &AuthSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            clock,
        }
    }

    /// Validate a token and extract its claims
    ///
    /// # Errors
    /// - `Malformed` if the token cannot be decoded
    /// - `UnexpectedAlgorithm` if the header names a non-HMAC algorithm
    /// - `InvalidSignature` if the signature does not match the key
    /// - `Expired` if `exp` is at or before the current time
    pub fn parse(&self, token: &str) -> Result<Claims, TokenError> {
        let alg = header_algorithm(token)?;

        let mut validation = Validation::new(alg);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        // Expiry is checked below against the injected clock, without leeway.
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => TokenError::UnexpectedAlgorithm(format!("{:?}", alg)),
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed(e.to_string()),
            })?;

        if claims.is_expired_at(self.clock.now()) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// True only for a valid, unexpired access token.
    pub fn require_authorized(&self, token: &str) -> bool {
        match self.parse(token) {
            Ok(claims) => claims.is_authorized(),
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected");
                false
            }
        }
    }
}
