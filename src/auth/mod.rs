/// Authentication module
///
/// Password hashing, JWT issuance/validation and the stateless session flow
/// built on top of them.

mod claims;
mod clock;
mod jwt;
mod password;
mod session;

pub use claims::{AccessClaims, Claims, RefreshClaims, RefreshKind};
pub use clock::{Clock, FixedClock, SystemClock};
pub use jwt::{TokenIssuer, TokenPair, TokenVerifier};
pub use password::{PasswordHasher, MAX_BCRYPT_COST, MIN_BCRYPT_COST};
pub use session::{LoginOutcome, NewAccount, SessionFlow, LOGOUT_MESSAGE};
