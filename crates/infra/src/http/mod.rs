//! HTTP client and the transport built on it

pub mod client;
pub mod transport;

pub use client::{HttpClient, HttpClientBuilder};
pub use transport::{HttpTransport, REQUEST_ID_HEADER};
