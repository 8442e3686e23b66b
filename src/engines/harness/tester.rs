use crate::config::harness::HarnessConfig;
use crate::config::traits::ConfigSection;
use crate::engines::generation::{CoverageRecord, InputGenerator, InputSequence, SharedGenerator};
use crate::error::{PadcovError, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// The emulator side of the harness: plays a sequence against a firmware
/// image and reports which coverage sites it reached.
pub trait FirmwareExecutor {
    /// Statically identified coverage sites in the loaded firmware.
    fn site_count(&self) -> usize;
    fn execute(&self, seq: &InputSequence) -> Result<CoverageRecord>;
}

/// Outcome of a harness run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub runs: usize,
    pub covered_sites: usize,
    pub total_sites: usize,
    pub coverage_percent: f64,
    pub target_reached: bool,
    pub generation: Option<usize>,
    /// The single run that covered the most sites.
    pub best_sequence: Option<String>,
    pub best_covered: usize,
    pub coverage_pattern: String,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Union of everything observed so far
struct CoverageTally {
    global: CoverageRecord,
    runs: usize,
    best: Option<(InputSequence, usize)>,
}

impl CoverageTally {
    fn new(sites: usize) -> Self {
        Self {
            global: CoverageRecord::new(sites),
            runs: 0,
            best: None,
        }
    }

    fn absorb(&mut self, seq: &InputSequence, coverage: &CoverageRecord) -> usize {
        let new_sites = coverage.new_sites(&self.global);
        self.global.union_with(coverage);
        self.runs += 1;

        let covered = coverage.count_covered();
        if self.best.as_ref().map_or(true, |(_, most)| covered > *most) {
            self.best = Some((seq.clone(), covered));
        }
        if new_sites > 0 {
            log::info!(
                "Run {}: {} new sites (total: {}/{})",
                self.runs,
                new_sites,
                self.global.count_covered(),
                self.global.width()
            );
        }
        new_sites
    }

    fn into_report(self, target: f64, generation: Option<usize>) -> RunReport {
        let (best_sequence, best_covered) = match self.best {
            Some((seq, covered)) => (Some(seq.to_string()), covered),
            None => (None, 0),
        };
        RunReport {
            runs: self.runs,
            covered_sites: self.global.count_covered(),
            total_sites: self.global.width(),
            coverage_percent: self.global.percent(),
            target_reached: self.global.percent() >= target,
            generation,
            best_sequence,
            best_covered,
            coverage_pattern: self.global.to_pattern(),
        }
    }
}

pub struct AutomatedTester<E> {
    executor: E,
    config: HarnessConfig,
}

impl<E: FirmwareExecutor> AutomatedTester<E> {
    pub fn new(executor: E, config: HarnessConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { executor, config })
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Lock-step loop: generate, execute, record; stop after `max_runs` or
    /// once the union of all coverage reaches the target.
    pub fn run<G: InputGenerator>(&self, generator: &mut G) -> Result<RunReport> {
        let mut tally = CoverageTally::new(self.executor.site_count());

        while tally.runs < self.config.max_runs {
            let seq = generator.generate()?;
            let coverage = self.executor.execute(&seq)?;
            tally.absorb(&seq, &coverage);
            generator.record(seq, coverage)?;

            if tally.global.percent() >= self.config.coverage_target {
                log::info!("Coverage target of {:.1}% reached", self.config.coverage_target);
                break;
            }
        }

        Ok(tally.into_report(self.config.coverage_target, generator.generations_completed()))
    }

    /// `workers` threads racing against one shared generator until the run
    /// budget is spent or the target is reached. Run order, and therefore the
    /// generated sequences, is not reproducible across runs.
    pub fn run_parallel(&self, generator: &SharedGenerator) -> Result<RunReport>
    where
        E: Sync,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.workers)
            .build()
            .map_err(|e| PadcovError::Configuration(format!("Failed to start workers: {}", e)))?;

        let tickets = AtomicUsize::new(0);
        let done = AtomicBool::new(false);
        let tally = Mutex::new(CoverageTally::new(self.executor.site_count()));

        let step = |worker: usize| -> Result<()> {
            let seq = generator.generate()?;
            let coverage = self.executor.execute(&seq)?;
            {
                let mut tally = tally.lock().map_err(|_| PadcovError::LockPoisoned)?;
                if tally.absorb(&seq, &coverage) > 0 {
                    log::debug!("Worker {} found new coverage", worker);
                }
                if tally.global.percent() >= self.config.coverage_target {
                    done.store(true, Ordering::SeqCst);
                }
            }
            generator.record(seq, coverage)
        };

        pool.install(|| {
            (0..self.config.workers)
                .into_par_iter()
                .try_for_each(|worker| -> Result<()> {
                    while !done.load(Ordering::SeqCst)
                        && tickets.fetch_add(1, Ordering::SeqCst) < self.config.max_runs
                    {
                        // A failure in one worker ends the run for all of them
                        if let Err(e) = step(worker) {
                            done.store(true, Ordering::SeqCst);
                            log::error!("Worker {} aborted the run: {}", worker, e);
                            return Err(e);
                        }
                    }
                    Ok(())
                })
        })?;

        let tally = tally.into_inner().map_err(|_| PadcovError::LockPoisoned)?;
        let generation = generator.stats()?.generation;
        Ok(tally.into_report(self.config.coverage_target, Some(generation)))
    }
}
