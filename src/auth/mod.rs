//! Ambient identity for a run: the [`AuthContext`], placeholder
//! substitution into request payloads, and the "current user" lookup.
mod context;
mod identity;
mod substitute;


pub use context::{ANTI_FORGERY_HEADER, AuthContext};
pub use identity::{HttpIdentityLookup, Identity, IdentityLookup};
pub use substitute::{render_template, substitute_payload};
