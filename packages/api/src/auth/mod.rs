//! Auth identities, session tokens and the auth event stream.

mod events;
mod session;

pub use events::{AuthEvent, AuthEventHub, AuthEvents};
pub use session::{AuthTokens, AuthUser};
