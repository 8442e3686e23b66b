use crate::engines::generation::sequence::InputSequence;
use crate::types::{Button, ControlEvent};
use rand::Rng;

/// Roll an m-sided die: a face landing on a button of the alphabet holds that
/// button, any other face releases the pad. The more `die_sides` exceeds the
/// alphabet, the sparser the resulting key presses.
pub fn roll_event<R: Rng>(alphabet: &[Button], die_sides: usize, rng: &mut R) -> ControlEvent {
    let roll = rng.gen_range(0..die_sides.max(1));
    match alphabet.get(roll) {
        Some(&button) => ControlEvent::Held(button),
        None => ControlEvent::Released,
    }
}

/// Mutation: replace up to `budget` pulses of a clone of `parent`
///
/// Positions are picked left to right by selection sampling: position `i` is
/// taken when a draw from the remaining `len - i` positions lands below the
/// remaining budget, so exactly `min(budget, len)` positions are re-rolled.
/// A re-rolled position may come up with the event it already had, hence
/// "up to". The parent is never touched.
pub fn mutate<R: Rng>(
    parent: &InputSequence,
    budget: usize,
    alphabet: &[Button],
    die_sides: usize,
    rng: &mut R,
) -> InputSequence {
    let mut child = parent.clone();
    let len = parent.len();
    let mut remaining = budget;

    for pulse in 0..len {
        if remaining == 0 {
            break;
        }
        if rng.gen_range(0..len - pulse) < remaining {
            child.set_event(pulse, roll_event(alphabet, die_sides, rng));
            remaining -= 1;
        }
    }

    child
}

/// Mutate `parent` until the result satisfies `is_novel`, giving up after
/// `max_attempts` draws.
pub fn mutate_novel<R, F>(
    parent: &InputSequence,
    budget: usize,
    alphabet: &[Button],
    die_sides: usize,
    max_attempts: usize,
    rng: &mut R,
    mut is_novel: F,
) -> Option<InputSequence>
where
    R: Rng,
    F: FnMut(&InputSequence) -> bool,
{
    (0..max_attempts)
        .map(|_| mutate(parent, budget, alphabet, die_sides, rng))
        .find(|candidate| is_novel(candidate))
}
