use crate::config::manager::AppConfig;
use crate::config::traits::ConfigSection;
use crate::config::generator::GeneratorConfig;
use crate::engines::generation::{
    coverage::CoverageRecord,
    population::{Phase, PopulationManager, PopulationStats},
    progress::ProgressCallback,
    seeds::SeedCorpus,
    sequence::InputSequence,
};
use crate::error::{PadcovError, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};

/// The request/response protocol a test harness drives: ask for a sequence,
/// run it, report the coverage it produced.
pub trait InputGenerator {
    fn generate(&mut self) -> Result<InputSequence>;
    fn record(&mut self, seq: InputSequence, coverage: CoverageRecord) -> Result<()>;

    /// Completed generation replacements, for generators that have them.
    fn generations_completed(&self) -> Option<usize> {
        None
    }
}

/// Coverage-guided generator: seed replay, then warmup, then the
/// steady-state evolutionary loop.
pub struct CoverageGuidedGenerator {
    population: PopulationManager,
    callback: Option<Box<dyn ProgressCallback>>,
}

impl CoverageGuidedGenerator {
    pub fn new(config: GeneratorConfig, seeds: SeedCorpus) -> Result<Self> {
        let rng = StdRng::seed_from_u64(config.seed);
        Self::with_rng(config, seeds, rng)
    }

    /// Build around a caller-supplied random source; `config.seed` is ignored.
    pub fn with_rng(config: GeneratorConfig, seeds: SeedCorpus, rng: StdRng) -> Result<Self> {
        config.validate()?;
        for (index, seed) in seeds.iter().enumerate() {
            if seed.len() != config.pulse_count {
                return Err(PadcovError::SeedLengthMismatch {
                    index,
                    expected: config.pulse_count,
                    actual: seed.len(),
                });
            }
        }

        Ok(Self {
            population: PopulationManager::new(config, seeds, rng),
            callback: None,
        })
    }

    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let seeds = SeedCorpus::from_config(&config.seeds, &config.generator)?;
        Self::new(config.generator.clone(), seeds)
    }

    pub fn with_callback<C: ProgressCallback + 'static>(mut self, callback: C) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    pub fn phase(&self) -> Phase {
        self.population.phase()
    }

    pub fn generation(&self) -> usize {
        self.population.generation()
    }

    pub fn stats(&self) -> PopulationStats {
        self.population.stats()
    }

    pub fn population(&self) -> &PopulationManager {
        &self.population
    }

    /// Best recorded sequence so far. Fails with `EmptyPopulation` until an
    /// evolved sequence has been recorded.
    pub fn best(&self) -> Result<(&InputSequence, &CoverageRecord)> {
        self.population.best()
    }

    /// Coverage a seed produced, kept for reporting only.
    pub fn seed_coverage(&self, seed: &InputSequence) -> Option<&CoverageRecord> {
        self.population.seed_coverage(seed)
    }

    fn notify(&mut self, before: PopulationStats) {
        let Some(callback) = self.callback.as_mut() else {
            return;
        };
        let after = self.population.stats();

        if matches!(before.phase, Phase::SeedReplay { .. })
            && !matches!(after.phase, Phase::SeedReplay { .. })
        {
            callback.on_seeds_replayed(self.population.seeds().len());
        }
        if before.phase != Phase::SteadyState && after.phase == Phase::SteadyState {
            callback.on_warmup_complete(after.parents);
        }
        if after.generation > before.generation {
            let best_covered = self
                .population
                .best()
                .map(|(_, coverage)| coverage.count_covered())
                .unwrap_or(0);
            callback.on_generation_complete(after.generation, after.parents, best_covered);
        }
    }
}

impl InputGenerator for CoverageGuidedGenerator {
    fn generate(&mut self) -> Result<InputSequence> {
        let before = self.population.stats();
        let seq = self.population.next_sequence()?;
        log::debug!("Generated {}", seq);
        self.notify(before);
        Ok(seq)
    }

    fn record(&mut self, seq: InputSequence, coverage: CoverageRecord) -> Result<()> {
        let covered = coverage.count_covered();
        if !self.population.record(seq.clone(), coverage) {
            log::warn!("Ignoring repeated coverage for {}", seq);
            return Ok(());
        }
        log::debug!("Recorded {} covering {} sites", seq, covered);

        if log::log_enabled!(log::Level::Debug) {
            if let Ok((best, best_coverage)) = self.population.best() {
                log::debug!("Best so far {} covering {} sites", best, best_coverage.count_covered());
            }
        }
        Ok(())
    }

    fn generations_completed(&self) -> Option<usize> {
        Some(self.population.generation())
    }
}

/// A generator shared between harness workers. Each call holds the lock for
/// its whole step, so generation replacement is never observed half done.
#[derive(Clone)]
pub struct SharedGenerator {
    inner: Arc<Mutex<CoverageGuidedGenerator>>,
}

impl SharedGenerator {
    pub fn new(generator: CoverageGuidedGenerator) -> Self {
        Self {
            inner: Arc::new(Mutex::new(generator)),
        }
    }

    pub fn generate(&self) -> Result<InputSequence> {
        self.inner.lock().map_err(|_| PadcovError::LockPoisoned)?.generate()
    }

    pub fn record(&self, seq: InputSequence, coverage: CoverageRecord) -> Result<()> {
        self.inner
            .lock()
            .map_err(|_| PadcovError::LockPoisoned)?
            .record(seq, coverage)
    }

    pub fn best(&self) -> Result<(InputSequence, CoverageRecord)> {
        let generator = self.inner.lock().map_err(|_| PadcovError::LockPoisoned)?;
        let (seq, coverage) = generator.best()?;
        Ok((seq.clone(), coverage.clone()))
    }

    pub fn stats(&self) -> Result<PopulationStats> {
        Ok(self.inner.lock().map_err(|_| PadcovError::LockPoisoned)?.stats())
    }

    /// Recover the generator once every other handle is dropped.
    pub fn into_inner(self) -> Option<CoverageGuidedGenerator> {
        Arc::try_unwrap(self.inner)
            .ok()
            .and_then(|mutex| mutex.into_inner().ok())
    }
}

impl InputGenerator for SharedGenerator {
    fn generate(&mut self) -> Result<InputSequence> {
        SharedGenerator::generate(self)
    }

    fn record(&mut self, seq: InputSequence, coverage: CoverageRecord) -> Result<()> {
        SharedGenerator::record(self, seq, coverage)
    }

    fn generations_completed(&self) -> Option<usize> {
        self.stats().ok().map(|stats| stats.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::generation::progress::{ChannelProgressCallback, ProgressMessage};
    use crate::engines::harness::{FirmwareExecutor, GridFirmware};
    use std::sync::mpsc;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig {
            pulse_count: 10,
            pulse_duration: 10,
            mutation_budget: 3,
            warmup_mutation_budget: 5,
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn test_callback_sees_every_transition() {
        let (sender, receiver) = mpsc::channel();
        let firmware = GridFirmware::new(4, 4).unwrap();
        let mut generator = CoverageGuidedGenerator::new(small_config(), SeedCorpus::empty())
            .unwrap()
            .with_callback(ChannelProgressCallback::new(sender));

        for _ in 0..30 {
            let seq = generator.generate().unwrap();
            let coverage = firmware.execute(&seq).unwrap();
            generator.record(seq, coverage).unwrap();
        }

        let messages: Vec<ProgressMessage> = receiver.try_iter().collect();
        assert_eq!(messages.first(), Some(&ProgressMessage::SeedsReplayed(0)));
        assert!(messages.contains(&ProgressMessage::WarmupComplete { parents: 2 }));
        assert!(messages
            .iter()
            .any(|m| matches!(m, ProgressMessage::GenerationComplete { generation: 1, .. })));
    }

    #[test]
    fn test_duplicate_record_is_ignored() {
        let mut generator = CoverageGuidedGenerator::new(small_config(), SeedCorpus::empty()).unwrap();
        let seq = generator.generate().unwrap();
        generator.record(seq.clone(), CoverageRecord::from_sites(3, [0])).unwrap();
        generator.record(seq, CoverageRecord::from_sites(3, [0, 1])).unwrap();
        assert_eq!(generator.stats().recorded, 1);
    }

    #[test]
    fn test_shared_generator_round_trip() {
        let shared = SharedGenerator::new(
            CoverageGuidedGenerator::new(small_config(), SeedCorpus::empty()).unwrap(),
        );
        let worker = shared.clone();
        let seq = worker.generate().unwrap();
        worker.record(seq.clone(), CoverageRecord::from_sites(3, [2])).unwrap();
        drop(worker);

        assert_eq!(shared.best().unwrap().0, seq);
        assert!(shared.into_inner().is_some());
    }
}
