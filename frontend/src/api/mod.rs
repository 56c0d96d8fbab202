mod auth;
pub mod client;
pub mod dashboard;
pub mod errors;
mod races;
pub mod resources;
pub mod types;
pub mod validation;

pub use client::*;
pub use errors::{ErrorContext, Operation};
pub use resources::*;
pub use types::*;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub mod test_support;
