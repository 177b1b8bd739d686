//! Request, response and routing types

pub mod auth;
pub mod request;
pub mod response;

pub use auth::AuthMode;
pub use request::{HttpMethod, RequestDescriptor, WireRequest};
pub use response::ResponseEnvelope;
