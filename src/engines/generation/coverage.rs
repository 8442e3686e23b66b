//! Coverage records produced by the emulator harness.
//!
//! One bit per statically identified branch/instruction site. Records are
//! built by the harness, handed to the generator once, and never edited after
//! that; the only in-place operation is `union_with`, used by the harness for
//! its own running total.

use serde::{Deserialize, Serialize};

const WORD_BITS: usize = 64;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoverageRecord {
    width: usize,
    words: Vec<u64>,
}

impl CoverageRecord {
    /// An empty record for a firmware image with `width` sites.
    pub fn new(width: usize) -> Self {
        Self {
            width,
            words: vec![0; width.div_ceil(WORD_BITS)],
        }
    }

    /// Build a record from covered site indices. Indices past `width` are ignored.
    pub fn from_sites<I>(width: usize, sites: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut record = Self::new(width);
        for site in sites {
            record.cover(site);
        }
        record
    }

    /// Build a record from one flag per site.
    pub fn from_flags(flags: &[bool]) -> Self {
        Self::from_sites(
            flags.len(),
            flags
                .iter()
                .enumerate()
                .filter(|(_, &covered)| covered)
                .map(|(site, _)| site),
        )
    }

    /// Mark a site as covered. Out-of-range sites are ignored.
    pub fn cover(&mut self, site: usize) {
        if site < self.width {
            self.words[site / WORD_BITS] |= 1u64 << (site % WORD_BITS);
        }
    }

    pub fn is_covered(&self, site: usize) -> bool {
        site < self.width && self.words[site / WORD_BITS] & (1u64 << (site % WORD_BITS)) != 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of covered sites.
    pub fn count_covered(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Covered sites in ascending order.
    pub fn covered_sites(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.width).filter(move |&site| self.is_covered(site))
    }

    /// True iff every site covered here is also covered by `other`.
    /// Records of different widths come from different firmware images and
    /// never subsume each other.
    pub fn is_subsumed_by(&self, other: &CoverageRecord) -> bool {
        self.width == other.width
            && self
                .words
                .iter()
                .zip(other.words.iter())
                .all(|(&mine, &theirs)| mine & !theirs == 0)
    }

    /// Merge `other` into this record (set union). The wider width wins.
    pub fn union_with(&mut self, other: &CoverageRecord) {
        if other.width > self.width {
            self.width = other.width;
            self.words.resize(other.words.len(), 0);
        }
        for (mine, theirs) in self.words.iter_mut().zip(other.words.iter()) {
            *mine |= theirs;
        }
    }

    /// Number of sites covered by `self` but not by `global`.
    pub fn new_sites(&self, global: &CoverageRecord) -> usize {
        self.words
            .iter()
            .enumerate()
            .map(|(i, &word)| {
                let seen = global.words.get(i).copied().unwrap_or(0);
                (word & !seen).count_ones() as usize
            })
            .sum()
    }

    /// Covered percentage of all sites; an empty firmware counts as fully covered.
    pub fn percent(&self) -> f64 {
        if self.width == 0 {
            return 100.0;
        }
        self.count_covered() as f64 * 100.0 / self.width as f64
    }

    /// `*` for covered sites, `.` for the rest.
    pub fn to_pattern(&self) -> String {
        (0..self.width)
            .map(|site| if self.is_covered(site) { '*' } else { '.' })
            .collect()
    }
}
