//! Agent adapter implementations

pub mod http;

pub use http::HttpAgent;
