//! Inbound webhook verification
pub mod stripe_signature;

pub use stripe_signature::{verify_stripe_signature, SignatureError};
