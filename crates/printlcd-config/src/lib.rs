//! Configuration parsing for printlcd
//!
//! This crate handles parsing the KDL configuration file that controls how
//! the daemon talks to LCDd, and rendering a configuration back to KDL.

mod error;
mod model;
mod parser;
mod generator;

pub use error::ConfigError;
pub use model::*;
pub use parser::{parse_config, parse_config_str};
pub use generator::generate_config;
