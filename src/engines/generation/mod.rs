pub mod sequence;
pub mod seeds;
pub mod coverage;
pub mod operators;
pub mod dominance;
pub mod population;
pub mod progress;
pub mod generator;

pub use sequence::InputSequence;
pub use seeds::SeedCorpus;
pub use coverage::CoverageRecord;
pub use dominance::{subsumed_by, CoverageIndividual};
pub use population::{Phase, PopulationManager, PopulationStats, SequenceCoverageTable};
pub use progress::{ChannelProgressCallback, LogProgressCallback, ProgressCallback, ProgressMessage};
pub use generator::{CoverageGuidedGenerator, InputGenerator, SharedGenerator};
