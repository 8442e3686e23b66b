use super::traits::{invalid, ConfigSection};
use crate::error::PadcovError;
use crate::types::Button;
use serde::{Deserialize, Serialize};

/// Pulses per generated sequence.
pub const DEFAULT_PULSE_COUNT: usize = 100;
/// 20ms at 8MHz.
pub const DEFAULT_PULSE_DURATION: u32 = 20 * 8_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub pulse_count: usize,
    pub pulse_duration: u32,
    pub mutation_budget: usize,
    pub warmup_mutation_budget: usize,
    pub die_sides: usize,
    pub starting_parents: usize,
    pub children_per_parent: usize,
    pub best_count: usize,
    pub seed: u64,
    pub max_mutation_attempts: usize,
    pub alphabet: Vec<Button>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            pulse_count: DEFAULT_PULSE_COUNT,
            pulse_duration: DEFAULT_PULSE_DURATION,
            mutation_budget: DEFAULT_PULSE_COUNT / 3,
            warmup_mutation_budget: DEFAULT_PULSE_COUNT / 2,
            die_sides: 4,
            starting_parents: 2,
            children_per_parent: 4,
            best_count: 2,
            seed: 854269,
            max_mutation_attempts: 1_000,
            alphabet: Button::ALL.to_vec(),
        }
    }
}

impl ConfigSection for GeneratorConfig {
    fn section_name() -> &'static str {
        "generator"
    }

    fn validate(&self) -> Result<(), PadcovError> {
        if self.pulse_count == 0 {
            return Err(invalid::<Self>("pulse_count must be at least 1"));
        }
        if self.pulse_duration == 0 {
            return Err(invalid::<Self>("pulse_duration must be at least 1 cycle"));
        }
        if self.die_sides == 0 {
            return Err(invalid::<Self>("die_sides must be at least 1"));
        }
        if self.alphabet.is_empty() {
            return Err(invalid::<Self>("alphabet must name at least one button"));
        }
        let mut sorted = self.alphabet.clone();
        sorted.sort();
        sorted.dedup();
        if sorted.len() != self.alphabet.len() {
            return Err(invalid::<Self>("alphabet must not repeat a button"));
        }
        if self.starting_parents == 0 {
            return Err(invalid::<Self>("starting_parents must be at least 1"));
        }
        if self.children_per_parent == 0 {
            return Err(invalid::<Self>("children_per_parent must be at least 1"));
        }
        if self.best_count == 0 {
            return Err(invalid::<Self>("best_count must be at least 1"));
        }
        if self.max_mutation_attempts == 0 {
            return Err(invalid::<Self>("max_mutation_attempts must be at least 1"));
        }
        Ok(())
    }
}
