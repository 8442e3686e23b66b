use padcov::config::ConfigManager;
use padcov::engines::generation::{CoverageGuidedGenerator, LogProgressCallback, SharedGenerator};
use padcov::engines::harness::{AutomatedTester, GridFirmware};
use std::env;

const GRID_WIDTH: usize = 12;
const GRID_HEIGHT: usize = 8;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Optional config file; PADCOV__<SECTION>__<FIELD> variables override it
    let args: Vec<String> = env::args().collect();
    let manager = ConfigManager::new();
    manager.load_layered(args.get(1))?;
    let config = manager.get()?;

    log::info!(
        "Fuzzing a {}x{} grid firmware: {} pulses of {} cycles, up to {} runs",
        GRID_WIDTH,
        GRID_HEIGHT,
        config.generator.pulse_count,
        config.generator.pulse_duration,
        config.harness.max_runs
    );

    let generator = CoverageGuidedGenerator::from_app_config(&config)?.with_callback(LogProgressCallback);
    let tester = AutomatedTester::new(GridFirmware::new(GRID_WIDTH, GRID_HEIGHT)?, config.harness.clone())?;

    let report = if config.harness.workers > 1 {
        tester.run_parallel(&SharedGenerator::new(generator))?
    } else {
        let mut generator = generator;
        tester.run(&mut generator)?
    };

    println!("{}", report.to_json()?);
    if !report.target_reached {
        log::warn!(
            "Coverage {:.2}% is below the {:.1}% target",
            report.coverage_percent,
            config.harness.coverage_target
        );
    }

    Ok(())
}
