pub mod config;
pub mod types;

pub use config::{Config, Configuration};
pub use types::{AppCredentials, CustomerCredentials, StorageConfig};
