pub mod config;
pub mod types;

pub use config::{ACME_STAGING_URL, Product, ProviderEnv};
pub use types::*;
