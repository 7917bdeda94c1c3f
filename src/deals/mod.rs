mod form;
mod service;
mod types;

pub use form::*;
pub use service::*;
pub use types::*;
