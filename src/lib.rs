#[cfg(feature = "reqwest")]
pub mod cli;
pub mod config;
pub mod services;

pub mod env;
pub mod error;
pub mod logging;

pub use error::{AdForgeError, Result};
pub use logging::{init_logging, LoggingConfig};
