//! Synthetic firmware used in place of the emulator.
//!
//! A cursor starts in the middle of a bounded grid and moves one cell per held
//! button. Coverage sites are every cell the cursor visits, one "bumped into
//! the wall" site per direction, and one site for three released pulses in a
//! row. Outcomes depend only on the events, never on pulse duration.

use crate::engines::generation::{CoverageRecord, InputSequence};
use crate::engines::harness::tester::FirmwareExecutor;
use crate::error::{PadcovError, Result};
use crate::types::Button;

const IDLE_RUN: usize = 3;

#[derive(Debug, Clone)]
pub struct GridFirmware {
    width: usize,
    height: usize,
}

impl GridFirmware {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PadcovError::Configuration(format!(
                "grid must be at least 1x1, got {}x{}",
                width, height
            )));
        }
        Ok(Self { width, height })
    }

    fn cell_site(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn bump_site(&self, button: Button) -> usize {
        let offset = match button {
            Button::Up => 0,
            Button::Down => 1,
            Button::Left => 2,
            Button::Right => 3,
        };
        self.width * self.height + offset
    }

    fn idle_site(&self) -> usize {
        self.width * self.height + 4
    }
}

impl FirmwareExecutor for GridFirmware {
    fn site_count(&self) -> usize {
        self.width * self.height + 5
    }

    fn execute(&self, seq: &InputSequence) -> Result<CoverageRecord> {
        let mut coverage = CoverageRecord::new(self.site_count());
        let (mut x, mut y) = (self.width / 2, self.height / 2);
        let mut idle = 0;
        coverage.cover(self.cell_site(x, y));

        for event in seq.events() {
            let Some(button) = event.button() else {
                idle += 1;
                if idle >= IDLE_RUN {
                    coverage.cover(self.idle_site());
                }
                continue;
            };
            idle = 0;

            let moved = match button {
                Button::Up if y > 0 => Some((x, y - 1)),
                Button::Down if y + 1 < self.height => Some((x, y + 1)),
                Button::Left if x > 0 => Some((x - 1, y)),
                Button::Right if x + 1 < self.width => Some((x + 1, y)),
                _ => None,
            };

            match moved {
                Some((nx, ny)) => {
                    x = nx;
                    y = ny;
                    coverage.cover(self.cell_site(x, y));
                }
                None => coverage.cover(self.bump_site(button)),
            }
        }

        Ok(coverage)
    }
}
