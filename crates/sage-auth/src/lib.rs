//! # sage-auth
//!
//! Authentication for PortfolioSage.
//!
//! ```text
//! ┌───────────────┐   verify()   ┌──────────────────────┐
//! │ SessionManager│─────────────▶│ Authenticator (trait)│  StaticCredentials,
//! │  login/logout │              └──────────────────────┘  or a real IdP later
//! │  authorize    │   sign()     ┌──────────────────────┐
//! │               │─────────────▶│ TokenSigner (HMAC)   │
//! │               │   save()     ┌──────────────────────┐
//! │               │─────────────▶│ SessionStore (trait) │
//! └───────────────┘              └──────────────────────┘
//! ```
//!
//! Tokens are checked on every protected request: signature, expiry, and
//! whether the session was revoked by logout.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sage_auth::{AuthConfig, SessionManager};
//!
//! let gate = SessionManager::from_config(AuthConfig::from_env()?);
//! let issued = gate.login("user", "password").await?;
//! let session = gate.authorize(&issued.token)?;
//! ```

mod credentials;
mod error;
mod gate;
mod session;
mod token;

pub use credentials::{Authenticator, StaticCredentials};
pub use error::{AuthError, Result};
pub use gate::{AuthConfig, IssuedToken, SessionManager};
pub use session::{MemorySessionStore, Session, SessionId, SessionStore};
pub use token::{TokenClaims, TokenSigner};
