use crate::config::generator::GeneratorConfig;
use crate::engines::generation::{
    coverage::CoverageRecord,
    dominance::{scan_best, select_top, CoverageIndividual},
    operators::mutate_novel,
    seeds::SeedCorpus,
    sequence::InputSequence,
};
use crate::error::{PadcovError, Result};
use rand::rngs::StdRng;
use std::collections::{HashMap, HashSet};

/// Where the population manager is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Replaying the seed corpus; `next` is the index of the next seed to emit.
    SeedReplay { next: usize },
    /// Building the initial parent pool.
    Warmup,
    /// Exploring parent/child batches and replacing generations.
    SteadyState,
}

/// Coverage keyed by sequence, remembering insertion order so rankings are
/// reproducible. The first record for a sequence wins.
#[derive(Debug, Clone, Default)]
pub struct SequenceCoverageTable {
    order: Vec<InputSequence>,
    records: HashMap<InputSequence, CoverageRecord>,
}

impl SequenceCoverageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false, leaving the table untouched, if `seq` already has coverage.
    pub fn insert(&mut self, seq: InputSequence, coverage: CoverageRecord) -> bool {
        if self.records.contains_key(&seq) {
            return false;
        }
        self.order.push(seq.clone());
        self.records.insert(seq, coverage);
        true
    }

    pub fn get(&self, seq: &InputSequence) -> Option<&CoverageRecord> {
        self.records.get(seq)
    }

    pub fn contains(&self, seq: &InputSequence) -> bool {
        self.records.contains_key(seq)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&InputSequence, &CoverageRecord)> {
        self.order.iter().filter_map(|seq| self.records.get_key_value(seq))
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&InputSequence) -> bool,
    {
        let records = &mut self.records;
        self.order.retain(|seq| {
            let kept = keep(seq);
            if !kept {
                records.remove(seq);
            }
            kept
        });
    }

    fn individuals(&self) -> Vec<CoverageIndividual<'_, &InputSequence>> {
        self.iter()
            .map(|(seq, coverage)| CoverageIndividual::new(seq, coverage))
            .collect()
    }
}

/// A parent and the children spawned from it. `None` until first needed.
#[derive(Debug, Clone)]
struct Lineage {
    parent: InputSequence,
    children: Option<Vec<InputSequence>>,
}

impl Lineage {
    fn new(parent: InputSequence) -> Self {
        Self {
            parent,
            children: None,
        }
    }
}

/// Snapshot of the manager's bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationStats {
    pub phase: Phase,
    pub generation: usize,
    pub parents: usize,
    pub recorded: usize,
    pub seeds_recorded: usize,
    pub pending: usize,
}

pub struct PopulationManager {
    config: GeneratorConfig,
    seeds: SeedCorpus,
    rng: StdRng,
    phase: Phase,
    generation: usize,
    parents: Vec<Lineage>,
    table: SequenceCoverageTable,
    seed_coverage: HashMap<InputSequence, CoverageRecord>,
    pending: HashSet<InputSequence>,
    accumulator: InputSequence,
}

impl PopulationManager {
    pub fn new(config: GeneratorConfig, seeds: SeedCorpus, rng: StdRng) -> Self {
        let accumulator = InputSequence::blank(config.pulse_count, config.pulse_duration);
        Self {
            config,
            seeds,
            rng,
            phase: Phase::SeedReplay { next: 0 },
            generation: 0,
            parents: Vec::new(),
            table: SequenceCoverageTable::new(),
            seed_coverage: HashMap::new(),
            pending: HashSet::new(),
            accumulator,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed generation replacements.
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn seeds(&self) -> &SeedCorpus {
        &self.seeds
    }

    pub fn table(&self) -> &SequenceCoverageTable {
        &self.table
    }

    pub fn seed_coverage(&self, seq: &InputSequence) -> Option<&CoverageRecord> {
        self.seed_coverage.get(seq)
    }

    /// Current parents with their children, `None` where not yet spawned.
    pub fn parents(&self) -> impl Iterator<Item = (&InputSequence, Option<&[InputSequence]>)> {
        self.parents
            .iter()
            .map(|lineage| (&lineage.parent, lineage.children.as_deref()))
    }

    pub fn stats(&self) -> PopulationStats {
        PopulationStats {
            phase: self.phase,
            generation: self.generation,
            parents: self.parents.len(),
            recorded: self.table.len(),
            seeds_recorded: self.seed_coverage.len(),
            pending: self.pending.len(),
        }
    }

    /// Advance the state machine by one step and return the sequence to run next.
    pub fn next_sequence(&mut self) -> Result<InputSequence> {
        if let Phase::SeedReplay { next } = self.phase {
            if let Some(seed) = self.seeds.get(next).cloned() {
                self.phase = Phase::SeedReplay { next: next + 1 };
                log::debug!("Replaying seed {}/{}", next + 1, self.seeds.len());
                return Ok(seed);
            }
            log::info!("Seed corpus exhausted after {} sequences, warming up", self.seeds.len());
            self.phase = Phase::Warmup;
        }

        match self.phase {
            Phase::Warmup => self.warmup_step(),
            _ => self.steady_step(),
        }
    }

    /// Store coverage for `seq`. Returns false if `seq` already had coverage.
    ///
    /// Seed coverage, and anything recorded while seeds are still replaying,
    /// is kept apart and never takes part in ranking.
    pub fn record(&mut self, seq: InputSequence, coverage: CoverageRecord) -> bool {
        if matches!(self.phase, Phase::SeedReplay { .. }) || self.seeds.contains(&seq) {
            if self.seed_coverage.contains_key(&seq) {
                return false;
            }
            self.seed_coverage.insert(seq, coverage);
            return true;
        }

        self.pending.remove(&seq);
        self.table.insert(seq, coverage)
    }

    /// Best recorded sequence by a dominance scan in insertion order.
    pub fn best(&self) -> Result<(&InputSequence, &CoverageRecord)> {
        let individuals = self.table.individuals();
        let best = scan_best(&individuals)?;
        Ok((individuals[best].data, individuals[best].coverage))
    }

    /// Rank every recorded sequence, keep the top `best_count` as the new
    /// parents (children not yet spawned) and drop all other coverage.
    pub fn replace_generation(&mut self) -> Result<()> {
        let survivors = self.rank(self.config.best_count)?;
        self.reseed(survivors);
        self.generation += 1;

        if let Ok((_, coverage)) = self.best() {
            log::info!(
                "Generation {} replaced: {} parents, best covers {} sites",
                self.generation,
                self.parents.len(),
                coverage.count_covered()
            );
        }
        Ok(())
    }

    fn warmup_step(&mut self) -> Result<InputSequence> {
        if self.parents.len() < self.config.starting_parents + 2 {
            let candidate = self.warmup_candidate()?;
            self.accumulator = candidate.clone();
            self.parents.push(Lineage::new(candidate.clone()));
            return Ok(self.emit(candidate));
        }

        if let Some(parent) = self.next_unrecorded_parent() {
            return Ok(self.emit(parent));
        }

        let survivors = self.rank(self.config.starting_parents)?;
        self.reseed(survivors);
        self.phase = Phase::SteadyState;
        log::info!("Warmup complete with {} starting parents", self.parents.len());

        self.steady_step()
    }

    fn steady_step(&mut self) -> Result<InputSequence> {
        if let Some(seq) = self.next_unexplored()? {
            return Ok(self.emit(seq));
        }

        self.replace_generation()?;

        match self.next_unexplored()? {
            Some(seq) => Ok(self.emit(seq)),
            None => {
                let (best, _) = self.best()?;
                Ok(best.clone())
            }
        }
    }

    /// Mutate the running accumulator until the best recorded sequence
    /// exists, then mutate that best sequence more aggressively.
    fn warmup_candidate(&mut self) -> Result<InputSequence> {
        let (base, budget) = match self.best() {
            Ok((best, _)) => (best.clone(), self.config.warmup_mutation_budget),
            Err(_) => (self.accumulator.clone(), self.config.mutation_budget),
        };

        let Self {
            ref config,
            ref mut rng,
            ref seeds,
            ref table,
            ref parents,
            ..
        } = *self;

        mutate_novel(
            &base,
            budget,
            &config.alphabet,
            config.die_sides,
            config.max_mutation_attempts,
            rng,
            |candidate| !is_known(candidate, seeds, table, parents, &[]),
        )
        .ok_or(PadcovError::MutationExhausted {
            attempts: config.max_mutation_attempts,
        })
    }

    /// Spawn `children_per_parent` children of parent `idx`, each distinct from
    /// every seed, recorded sequence, parent, child and earlier sibling.
    fn spawn_children(&mut self, idx: usize) -> Result<Vec<InputSequence>> {
        let Self {
            ref config,
            ref mut rng,
            ref seeds,
            ref table,
            ref parents,
            ..
        } = *self;

        let parent = &parents[idx].parent;
        let mut children: Vec<InputSequence> = Vec::with_capacity(config.children_per_parent);

        while children.len() < config.children_per_parent {
            let child = mutate_novel(
                parent,
                config.mutation_budget,
                &config.alphabet,
                config.die_sides,
                config.max_mutation_attempts,
                rng,
                |candidate| !is_known(candidate, seeds, table, parents, &children),
            )
            .ok_or(PadcovError::MutationExhausted {
                attempts: config.max_mutation_attempts,
            })?;
            children.push(child);
        }

        log::debug!("Spawned {} children for parent {}", children.len(), idx);
        Ok(children)
    }

    /// First parent without coverage, preferring ones not already handed out.
    fn next_unrecorded_parent(&self) -> Option<InputSequence> {
        let mut unrecorded = self
            .parents
            .iter()
            .map(|lineage| &lineage.parent)
            .filter(|parent| !self.table.contains(parent));

        let first = unrecorded.next()?;
        if !self.pending.contains(first) {
            return Some(first.clone());
        }
        unrecorded
            .find(|parent| !self.pending.contains(*parent))
            .or(Some(first))
            .cloned()
    }

    /// Walk parents in order: an unrecorded parent first, otherwise its
    /// unrecorded children (spawned on first visit). Sequences already handed
    /// out are only returned when nothing else is left.
    fn next_unexplored(&mut self) -> Result<Option<InputSequence>> {
        let mut fallback: Option<InputSequence> = None;

        for idx in 0..self.parents.len() {
            let parent = &self.parents[idx].parent;
            if !self.table.contains(parent) {
                if !self.pending.contains(parent) {
                    return Ok(Some(parent.clone()));
                }
                fallback.get_or_insert_with(|| parent.clone());
                continue;
            }

            if self.parents[idx].children.is_none() {
                let children = self.spawn_children(idx)?;
                self.parents[idx].children = Some(children);
            }

            for child in self.parents[idx].children.iter().flatten() {
                if self.table.contains(child) {
                    continue;
                }
                if !self.pending.contains(child) {
                    return Ok(Some(child.clone()));
                }
                fallback.get_or_insert_with(|| child.clone());
            }
        }

        if let Some(seq) = &fallback {
            log::warn!("All candidates are in flight, re-emitting {}", seq);
        }
        Ok(fallback)
    }

    fn rank(&self, count: usize) -> Result<Vec<InputSequence>> {
        let selected = select_top(self.table.individuals(), count)?;
        Ok(selected.into_iter().cloned().collect())
    }

    fn reseed(&mut self, survivors: Vec<InputSequence>) {
        self.table.retain(|seq| survivors.contains(seq));
        self.parents = survivors.into_iter().map(Lineage::new).collect();
        self.pending.clear();
    }

    fn emit(&mut self, seq: InputSequence) -> InputSequence {
        self.pending.insert(seq.clone());
        seq
    }
}

fn is_known(
    candidate: &InputSequence,
    seeds: &SeedCorpus,
    table: &SequenceCoverageTable,
    parents: &[Lineage],
    siblings: &[InputSequence],
) -> bool {
    seeds.contains(candidate)
        || table.contains(candidate)
        || siblings.contains(candidate)
        || parents.iter().any(|lineage| {
            lineage.parent == *candidate || lineage.children.iter().flatten().any(|c| c == candidate)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Button;
    use rand::SeedableRng;

    fn tiny_config() -> GeneratorConfig {
        GeneratorConfig {
            pulse_count: 12,
            pulse_duration: 10,
            mutation_budget: 4,
            warmup_mutation_budget: 6,
            die_sides: 6,
            starting_parents: 2,
            children_per_parent: 3,
            best_count: 2,
            seed: 42,
            max_mutation_attempts: 500,
            alphabet: Button::ALL.to_vec(),
        }
    }

    fn manager(config: GeneratorConfig) -> PopulationManager {
        let rng = StdRng::seed_from_u64(config.seed);
        PopulationManager::new(config, SeedCorpus::empty(), rng)
    }

    /// Coverage that grows with the number of held pulses.
    fn coverage_of(seq: &InputSequence) -> CoverageRecord {
        CoverageRecord::from_sites(
            seq.len(),
            seq.events()
                .iter()
                .enumerate()
                .filter(|(_, e)| e.button().is_some())
                .map(|(i, _)| i),
        )
    }

    #[test]
    fn test_table_first_write_wins() {
        let mut table = SequenceCoverageTable::new();
        let seq = InputSequence::from_literal("UD", 1).unwrap();
        assert!(table.insert(seq.clone(), CoverageRecord::from_sites(4, [0])));
        assert!(!table.insert(seq.clone(), CoverageRecord::from_sites(4, [1])));
        assert_eq!(table.get(&seq), Some(&CoverageRecord::from_sites(4, [0])));
    }

    #[test]
    fn test_table_retain_keeps_order() {
        let mut table = SequenceCoverageTable::new();
        for literal in ["UU", "DD", "LL", "RR"] {
            let seq = InputSequence::from_literal(literal, 1).unwrap();
            table.insert(seq, CoverageRecord::new(4));
        }
        table.retain(|seq| seq.to_string() != "DD");

        let order: Vec<String> = table.iter().map(|(seq, _)| seq.to_string()).collect();
        assert_eq!(order, vec!["UU", "LL", "RR"]);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_warmup_builds_parent_pool() {
        let config = tiny_config();
        let target = config.starting_parents + 2;
        let mut pm = manager(config);

        for _ in 0..target {
            let seq = pm.next_sequence().unwrap();
            assert_eq!(pm.phase(), Phase::Warmup);
            pm.record(seq.clone(), coverage_of(&seq));
        }
        assert_eq!(pm.stats().parents, target);

        // Next step ranks the pool and enters steady state
        pm.next_sequence().unwrap();
        assert_eq!(pm.phase(), Phase::SteadyState);
        assert_eq!(pm.stats().parents, 2);
        assert_eq!(pm.table().len(), 2);
    }

    #[test]
    fn test_replacement_leaves_fresh_parents() {
        let mut pm = manager(tiny_config());

        // Run until every parent and child of the first steady batch is recorded
        while pm.phase() != Phase::SteadyState || pm.next_unexplored_for_test() {
            let seq = pm.next_sequence().unwrap();
            pm.record(seq.clone(), coverage_of(&seq));
        }

        pm.replace_generation().unwrap();
        assert_eq!(pm.generation(), 1);
        assert_eq!(pm.stats().parents, 2);
        assert!(pm.parents().all(|(_, children)| children.is_none()));
        assert_eq!(pm.table().len(), 2);
    }

    #[test]
    fn test_children_spawned_once_per_parent() {
        let mut pm = manager(tiny_config());

        // Warmup, then the first steady step spawns the first parent's children
        while pm.phase() != Phase::SteadyState {
            let seq = pm.next_sequence().unwrap();
            pm.record(seq.clone(), coverage_of(&seq));
        }
        let first_parent = pm.parents[0].parent.clone();
        let spawned = pm.parents[0].children.clone().unwrap();
        assert_eq!(spawned.len(), 3);

        // Recording children and stepping again never regenerates them
        for _ in 0..3 {
            let seq = pm.next_sequence().unwrap();
            pm.record(seq.clone(), coverage_of(&seq));
            assert_eq!(pm.parents[0].parent, first_parent);
            assert_eq!(pm.parents[0].children.as_ref(), Some(&spawned));
        }
    }

    #[test]
    fn test_spawn_children_exhausted() {
        let config = GeneratorConfig {
            pulse_count: 1,
            alphabet: vec![Button::Up],
            die_sides: 2,
            mutation_budget: 1,
            max_mutation_attempts: 50,
            children_per_parent: 1,
            ..tiny_config()
        };
        let mut pm = manager(config);

        // Both possible one-pulse sequences are already known
        pm.phase = Phase::Warmup;
        pm.parents.push(Lineage::new(InputSequence::from_literal("U", 10).unwrap()));
        pm.record(InputSequence::from_literal("_", 10).unwrap(), CoverageRecord::new(1));

        assert!(matches!(
            pm.spawn_children(0),
            Err(PadcovError::MutationExhausted { attempts: 50 })
        ));
    }

    #[test]
    fn test_pending_prefers_fresh_work() {
        let mut pm = manager(tiny_config());
        let a = pm.next_sequence().unwrap();
        let b = pm.next_sequence().unwrap();
        assert_ne!(a, b);
        assert_eq!(pm.stats().pending, 2);

        pm.record(a, CoverageRecord::new(12));
        assert_eq!(pm.stats().pending, 1);
    }

    impl PopulationManager {
        /// True while the current batch still has unrecorded members.
        fn next_unexplored_for_test(&self) -> bool {
            self.parents.iter().any(|lineage| {
                !self.table.contains(&lineage.parent)
                    || match &lineage.children {
                        None => true,
                        Some(children) => children.iter().any(|c| !self.table.contains(c)),
                    }
            })
        }
    }
}
