//! # Authorization
//!
//! Role checks against an explicitly injected [`ActorContext`], plus the
//! persisted [`UserProfile`] an actor can be built from. Sign-in happens
//! elsewhere; this module only decides whether a given actor may perform a
//! given mutation.

pub mod context;
pub mod errors;
pub mod profile;

pub use context::{ActorContext, Role};
pub use errors::{AuthError, AuthResult};
pub use profile::{Reputation, ReputationKind, UserProfile, PROMOTION_THRESHOLD};
