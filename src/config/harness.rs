use super::traits::{invalid, ConfigSection};
use crate::error::PadcovError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub max_runs: usize,
    /// Percent of coverage sites after which a run stops early.
    pub coverage_target: f64,
    pub workers: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_runs: 50,
            coverage_target: 95.0,
            workers: 1,
        }
    }
}

impl ConfigSection for HarnessConfig {
    fn section_name() -> &'static str {
        "harness"
    }

    fn validate(&self) -> Result<(), PadcovError> {
        if self.max_runs == 0 {
            return Err(invalid::<Self>("max_runs must be at least 1"));
        }
        if !(0.0..=100.0).contains(&self.coverage_target) {
            return Err(invalid::<Self>("coverage_target must be between 0 and 100"));
        }
        if self.workers == 0 {
            return Err(invalid::<Self>("workers must be at least 1"));
        }
        Ok(())
    }
}
