/// JWT claim sets
///
/// Access tokens carry `{authorized, user, iat, exp}`, refresh tokens carry
/// `{sub, user, iat, exp}`. `Claims` is what the verifier hands back for either kind.

use serde::{Deserialize, Serialize};

/// Marker stored in the refresh token's `sub` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshKind {
    Unauthorized = 0,
    Authorized = 1,
}

impl RefreshKind {
    pub fn from_claim(value: i64) -> Option<Self> {
        match value {
            0 => Some(RefreshKind::Unauthorized),
            1 => Some(RefreshKind::Authorized),
            _ => None,
        }
    }
}

/// Claims minted into an access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    pub authorized: bool,
    pub user: String,
    pub iat: i64,
    pub exp: i64,
}

impl AccessClaims {
    pub fn new(user: &str, now: i64, ttl_seconds: i64) -> Self {
        Self {
            authorized: true,
            user: user.to_string(),
            iat: now,
            exp: now + ttl_seconds,
        }
    }
}

/// Claims minted into a refresh token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    pub sub: i64,
    pub user: String,
    pub iat: i64,
    pub exp: i64,
}

impl RefreshClaims {
    pub fn new(user: &str, kind: RefreshKind, now: i64, ttl_seconds: i64) -> Self {
        Self {
            sub: kind as i64,
            user: user.to_string(),
            iat: now,
            exp: now + ttl_seconds,
        }
    }
}

/// Decoded claims of a verified token of either kind
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub user: String,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub authorized: Option<bool>,
    #[serde(default)]
    pub sub: Option<i64>,
}

impl Claims {
    /// True for access tokens minted by this service.
    pub fn is_authorized(&self) -> bool {
        self.authorized == Some(true)
    }

    /// The refresh marker, if this is a refresh token with a known marker value.
    pub fn refresh_kind(&self) -> Option<RefreshKind> {
        self.sub.and_then(RefreshKind::from_claim)
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.exp <= now
    }
}
