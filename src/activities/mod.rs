mod service;
mod types;

pub use service::*;
pub use types::*;
