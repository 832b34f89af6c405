#![doc = include_str!("../README.md")]

pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod services;
pub mod tools;
pub mod types;

pub use config::Config;
pub use error::*;
pub use services::*;
pub use types::*;
