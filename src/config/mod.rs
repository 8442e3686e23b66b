pub mod traits;
pub mod generator;
pub mod seeds;
pub mod harness;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use generator::GeneratorConfig;
pub use seeds::{SeedCorpusConfig, SeedEntry};
pub use harness::HarnessConfig;
