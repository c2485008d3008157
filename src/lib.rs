pub mod cache;
pub mod cli;
pub mod config;
pub mod docker;
pub mod error;
pub mod metrics;

pub use config::Options;
pub use docker::Resolver;
pub use error::{Result, SwirlError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
