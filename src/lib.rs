pub mod blockchain;
pub mod config;
pub mod error;
pub mod indexer;
pub mod math;
pub mod models;
pub mod services;

pub use error::types::*;
