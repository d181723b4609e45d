//! Bearer token types and expiry decoding

mod claims;
mod types;

pub use claims::{decode_expiry, decode_subject, is_expired_at};
pub use types::{AccessToken, preview};
