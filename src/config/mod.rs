//! Configuration module for firm-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use firm_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting from: {}", config.directory.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{page_url, Config, DirectoryConfig, FetcherConfig, LimitsConfig, OutputConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
