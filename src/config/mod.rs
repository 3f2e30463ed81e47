pub mod settings;

pub use settings::{
    BlockchainSettings, IndexerSettings, LoggingSettings, ProtocolSettings, Settings,
};
