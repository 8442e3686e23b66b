pub mod tester;
pub mod grid;

pub use tester::{AutomatedTester, FirmwareExecutor, RunReport};
pub use grid::GridFirmware;
