mod export;
mod service;
mod types;

pub use export::*;
pub use service::*;
pub use types::*;
