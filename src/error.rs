use thiserror::Error;

#[derive(Error, Debug)]
pub enum PadcovError {
    #[error("Invalid encoding: symbol {symbol:?} at position {position} is not one of U, D, L, R or _")]
    InvalidEncoding { symbol: char, position: usize },

    #[error("Seed {index} has {actual} pulses, expected {expected}")]
    SeedLengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Empty population: no coverage has been recorded yet")]
    EmptyPopulation,

    #[error("Mutation exhausted: no novel sequence found after {attempts} attempts")]
    MutationExhausted { attempts: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Generator state poisoned by a panicking worker")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PadcovError>;
