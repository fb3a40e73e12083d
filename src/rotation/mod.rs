//! Identity and relay rotation
//!
//! Every browser session is started with a browser identity string drawn
//! from a fixed pool and, when relays are configured, one relay endpoint.
//! Both choices use an injected random source so runs can be reproduced.

mod endpoint;
mod identity;

pub use endpoint::{EndpointProbe, EndpointRotator, HttpProbe};
pub use identity::{IdentityPool, DEFAULT_IDENTITIES};
