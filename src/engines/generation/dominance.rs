/// Coverage dominance utilities for population ranking
/// Fitness is set inclusion only: covered-site counts are never compared.

use crate::engines::generation::coverage::CoverageRecord;
use crate::error::{PadcovError, Result};

/// Individual paired with the coverage it produced
#[derive(Debug, Clone)]
pub struct CoverageIndividual<'a, T> {
    pub data: T,
    pub coverage: &'a CoverageRecord,
}

impl<'a, T> CoverageIndividual<'a, T> {
    pub fn new(data: T, coverage: &'a CoverageRecord) -> Self {
        Self { data, coverage }
    }
}

/// Check whether `lhs` is subsumed by `rhs`
/// Every site covered by `lhs` must also be covered by `rhs`; equal sets subsume each other
pub fn subsumed_by(lhs: &CoverageRecord, rhs: &CoverageRecord) -> bool {
    lhs.is_subsumed_by(rhs)
}

/// Linear dominance scan over `individuals` in encounter order
///
/// Starts from the first individual and moves to every later one whose
/// coverage subsumes the current pick. Ties go to the later individual.
/// With incomparable coverage sets the result is only a local maximum along
/// this scan order, not a global one.
pub fn scan_best<T>(individuals: &[CoverageIndividual<'_, T>]) -> Result<usize> {
    let mut best = match individuals.first() {
        Some(_) => 0,
        None => return Err(PadcovError::EmptyPopulation),
    };

    for (idx, candidate) in individuals.iter().enumerate() {
        if subsumed_by(individuals[best].coverage, candidate.coverage) {
            best = idx;
        }
    }

    Ok(best)
}

/// Pick up to `count` individuals by repeated `scan_best`, removing each pick
/// before the next scan. Returns the picks in selection order.
pub fn select_top<T>(mut individuals: Vec<CoverageIndividual<'_, T>>, count: usize) -> Result<Vec<T>> {
    if individuals.is_empty() {
        return Err(PadcovError::EmptyPopulation);
    }

    let mut selected = Vec::with_capacity(count.min(individuals.len()));
    while selected.len() < count && !individuals.is_empty() {
        let best = scan_best(&individuals)?;
        selected.push(individuals.remove(best).data);
    }

    Ok(selected)
}
