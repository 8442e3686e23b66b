use super::traits::{invalid, ConfigSection};
use crate::error::PadcovError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedEntry {
    pub literal: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pulse_duration: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedCorpusConfig {
    pub use_builtin: bool,
    pub entries: Vec<SeedEntry>,
}

impl Default for SeedCorpusConfig {
    fn default() -> Self {
        Self {
            use_builtin: true,
            entries: Vec::new(),
        }
    }
}

impl ConfigSection for SeedCorpusConfig {
    fn section_name() -> &'static str {
        "seeds"
    }

    fn validate(&self) -> Result<(), PadcovError> {
        if let Some(pos) = self.entries.iter().position(|e| e.pulse_duration == Some(0)) {
            return Err(invalid::<Self>(format!("entry {} has a zero pulse_duration", pos)));
        }
        Ok(())
    }
}
