use crate::config::generator::GeneratorConfig;
use crate::config::seeds::{SeedCorpusConfig, SeedEntry};
use crate::engines::generation::sequence::InputSequence;
use crate::error::{PadcovError, Result};

/// Pulse width of the long-hold seeds: 125ms at 8MHz.
pub const LONG_PULSE_DURATION: u32 = 125 * 8_000;

/// Hand-curated 100-pulse sequences known to reach deep into the sample game
/// firmwares. `None` means the configured pulse duration.
pub const BUILTIN_SEEDS: [(&str, Option<u32>); 4] = [
    (
        "RLDUDLDDUURRUDURLRUULLLLLULULDLLUDDRURLDLLDLLULDLRURUDRURRRUULUDDDDULLLRLLDDULUDURRULRDRRUUDURLLULDU",
        Some(LONG_PULSE_DURATION),
    ),
    (
        "LRD_LDLDUDUD_LLLRLLLRRDRUUD_DRULL__L_DUURLRULRRU_RLRLLRL_LLRRLUUURURR_RLLD_D_LDDRULRULLLUUUURDRLDUU_",
        None,
    ),
    (
        "DUUD_UD_R_DDRRDLRLDURD_LUDLRLUUUULRU_DDULD_UULLRRDUUUDURLUL_UULURDULRLURRU_DULLRRLDUUD_L_RLDD_UURRRU",
        None,
    ),
    (
        "RDUUDUURDRDRRDUDLRRRDRLLRDDLRLRLLRLLDDRRUDULULUDDULURDULLRUULUDURUDRDLUDULDDRDDURRURLRURDLDDDUUURRLU",
        None,
    ),
];

/// Ordered warm-start corpus replayed before any evolution.
#[derive(Debug, Clone, Default)]
pub struct SeedCorpus {
    sequences: Vec<InputSequence>,
}

impl SeedCorpus {
    pub fn new(sequences: Vec<InputSequence>) -> Self {
        Self { sequences }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Decode literals, checking each against the configured pulse count.
    pub fn from_literals<'a, I>(literals: I, generator: &GeneratorConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, Option<u32>)>,
    {
        let sequences = literals
            .into_iter()
            .enumerate()
            .map(|(index, (literal, duration))| {
                let seq =
                    InputSequence::from_literal(literal, duration.unwrap_or(generator.pulse_duration))?;
                if seq.len() != generator.pulse_count {
                    return Err(PadcovError::SeedLengthMismatch {
                        index,
                        expected: generator.pulse_count,
                        actual: seq.len(),
                    });
                }
                Ok(seq)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { sequences })
    }

    pub fn builtin(generator: &GeneratorConfig) -> Result<Self> {
        Self::from_literals(BUILTIN_SEEDS, generator)
    }

    /// Built-in corpus (when enabled) followed by the configured entries.
    pub fn from_config(seeds: &SeedCorpusConfig, generator: &GeneratorConfig) -> Result<Self> {
        let builtin = if seeds.use_builtin { &BUILTIN_SEEDS[..] } else { &[] };
        let literals = builtin.iter().copied().chain(
            seeds
                .entries
                .iter()
                .map(|SeedEntry { literal, pulse_duration }| (literal.as_str(), *pulse_duration)),
        );
        Self::from_literals(literals, generator)
    }

    pub fn get(&self, index: usize) -> Option<&InputSequence> {
        self.sequences.get(index)
    }

    pub fn contains(&self, seq: &InputSequence) -> bool {
        self.sequences.contains(seq)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputSequence> {
        self.sequences.iter()
    }
}
