use crate::error::{PadcovError, Result};
use crate::types::ControlEvent;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Input sequence representation
///
/// An input sequence is the unit the harness executes: a fixed number of
/// pulses, each holding exactly one `ControlEvent` for `pulse_duration`
/// cycles. Sequences are only ever created from a literal or by cloning a
/// parent inside the mutation operators; nothing outside the crate can edit
/// one in place, so a sequence used as a coverage key never changes.
///
/// Equality and hashing look at the events alone. Two sequences holding the
/// same buttons in the same order are the same input even when one of them
/// came from a seed with a longer pulse.
///
/// # Example
///
/// ```
/// use padcov::engines::generation::InputSequence;
///
/// let seq = InputSequence::from_literal("UD_L", 10).unwrap();
/// assert_eq!(seq.len(), 4);
/// assert_eq!(seq.to_string(), "UD_L");
/// ```
#[derive(Debug, Clone)]
pub struct InputSequence {
    events: Vec<ControlEvent>,
    pulse_duration: u32,
}

impl InputSequence {
    /// A sequence of `pulse_count` released pulses.
    pub fn blank(pulse_count: usize, pulse_duration: u32) -> Self {
        Self {
            events: vec![ControlEvent::Released; pulse_count],
            pulse_duration,
        }
    }

    /// Decode one symbol per pulse (`U`, `D`, `L`, `R`, `_`).
    pub fn from_literal(literal: &str, pulse_duration: u32) -> Result<Self> {
        let events = literal
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                ControlEvent::from_symbol(symbol)
                    .ok_or(PadcovError::InvalidEncoding { symbol, position })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            events,
            pulse_duration,
        })
    }

    pub fn from_events(events: Vec<ControlEvent>, pulse_duration: u32) -> Self {
        Self {
            events,
            pulse_duration,
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn pulse_duration(&self) -> u32 {
        self.pulse_duration
    }

    /// Total cycles needed to play the whole sequence.
    pub fn total_cycles(&self) -> u64 {
        self.events.len() as u64 * u64::from(self.pulse_duration)
    }

    pub fn events(&self) -> &[ControlEvent] {
        &self.events
    }

    pub fn event(&self, pulse: usize) -> Option<ControlEvent> {
        self.events.get(pulse).copied()
    }

    /// Number of pulses at which the two sequences differ. Sequences of
    /// different length count every unmatched tail pulse as a difference.
    pub fn distance(&self, other: &InputSequence) -> usize {
        let shared = self
            .events
            .iter()
            .zip(other.events.iter())
            .filter(|(a, b)| a != b)
            .count();
        shared + self.events.len().abs_diff(other.events.len())
    }

    pub(crate) fn set_event(&mut self, pulse: usize, event: ControlEvent) {
        self.events[pulse] = event;
    }
}

impl PartialEq for InputSequence {
    fn eq(&self, other: &Self) -> bool {
        self.events == other.events
    }
}

impl Eq for InputSequence {}

impl Hash for InputSequence {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.events.hash(state);
    }
}

impl fmt::Display for InputSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            write!(f, "{}", event.symbol())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Button;
    use std::collections::HashSet;

    #[test]
    fn test_from_literal() {
        let seq = InputSequence::from_literal("UDLR_", 10).unwrap();
        assert_eq!(
            seq.events(),
            &[
                ControlEvent::Held(Button::Up),
                ControlEvent::Held(Button::Down),
                ControlEvent::Held(Button::Left),
                ControlEvent::Held(Button::Right),
                ControlEvent::Released,
            ]
        );
        assert_eq!(seq.pulse_duration(), 10);
        assert_eq!(seq.total_cycles(), 50);
    }

    #[test]
    fn test_from_literal_rejects_unknown_symbol() {
        match InputSequence::from_literal("UD-L", 10) {
            Err(PadcovError::InvalidEncoding { symbol, position }) => {
                assert_eq!(symbol, '-');
                assert_eq!(position, 2);
            }
            other => panic!("expected InvalidEncoding, got {:?}", other),
        }
    }

    #[test]
    fn test_equality_ignores_duration() {
        let a = InputSequence::from_literal("U_R", 10).unwrap();
        let b = InputSequence::from_literal("U_R", 1_000).unwrap();
        let c = InputSequence::from_literal("U_L", 10).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_distance() {
        let a = InputSequence::from_literal("UUUU", 1).unwrap();
        let b = InputSequence::from_literal("UDUD", 1).unwrap();
        let c = InputSequence::from_literal("UD", 1).unwrap();
        assert_eq!(a.distance(&a), 0);
        assert_eq!(a.distance(&b), 2);
        assert_eq!(b.distance(&c), 2);
    }

    #[test]
    fn test_blank_is_released() {
        let seq = InputSequence::blank(3, 7);
        assert_eq!(seq.to_string(), "___");
        assert!(InputSequence::blank(0, 7).is_empty());
    }
}
