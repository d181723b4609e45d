//! Outbound request types

mod header;
mod method;
mod spec;

pub use header::{AUTHORIZATION, Header, Headers};
pub use method::HttpMethod;
pub use spec::ApiRequest;
