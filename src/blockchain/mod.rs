pub mod bindings;
pub mod client;
pub mod submitter;

pub use client::{ChainClient, ChainError, ChainRegistry};
pub use submitter::WalletSubmitter;
