//! Signed-cookie access control for the admin area and round gates.

pub mod cookie;
pub mod middleware;
pub mod session;
pub mod signer;
pub mod token;

pub use middleware::{check_rate_limit, AdminSession, AppState, ClientId};
pub use session::{Realm, RoundVerifier};
