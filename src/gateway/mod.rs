mod client;
mod error;
mod http;
mod types;

pub use client::*;
pub use error::*;
pub use http::*;
pub use types::*;
