//! Configuration module

mod error;
mod site;

pub use error::ConfigError;
pub use site::SiteConfig;
