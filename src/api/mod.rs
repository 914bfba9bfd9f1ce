pub mod client;
pub mod trending;
pub mod types;

pub use client::ApiClient;
pub use types::*;
