use crate::error::PadcovError;
use serde::{Deserialize, Serialize};

/// Trait for configuration sections
pub trait ConfigSection: Serialize + for<'de> Deserialize<'de> + Default + Clone {
    fn section_name() -> &'static str;
    fn validate(&self) -> Result<(), PadcovError>;
}

/// Shorthand for a section-scoped configuration error.
pub(crate) fn invalid<S: ConfigSection>(message: impl Into<String>) -> PadcovError {
    PadcovError::Configuration(format!("[{}] {}", S::section_name(), message.into()))
}
