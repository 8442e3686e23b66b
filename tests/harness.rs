use padcov::{
    config::{GeneratorConfig, HarnessConfig},
    engines::generation::{CoverageGuidedGenerator, CoverageRecord, InputSequence, SeedCorpus, SharedGenerator},
    engines::harness::{AutomatedTester, FirmwareExecutor, GridFirmware},
    PadcovError, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};

fn generator() -> CoverageGuidedGenerator {
    let config = GeneratorConfig {
        pulse_count: 16,
        pulse_duration: 10,
        mutation_budget: 5,
        warmup_mutation_budget: 8,
        ..GeneratorConfig::default()
    };
    CoverageGuidedGenerator::new(config, SeedCorpus::empty()).unwrap()
}

#[test]
fn test_lock_step_run() {
    let firmware = GridFirmware::new(6, 6).unwrap();
    let sites = firmware.site_count();
    let tester = AutomatedTester::new(
        firmware,
        HarnessConfig {
            max_runs: 40,
            coverage_target: 100.0,
            workers: 1,
        },
    )
    .unwrap();

    let mut generator = generator();
    let report = tester.run(&mut generator).unwrap();

    assert!(report.runs >= 1 && report.runs <= 40);
    if !report.target_reached {
        assert_eq!(report.runs, 40);
    }
    assert_eq!(report.total_sites, sites);
    assert_eq!(report.coverage_pattern.len(), sites);
    assert!(report.best_covered >= 1);
    assert!(report.covered_sites >= report.best_covered);

    // Every run was fed back to the generator
    let stats = generator.stats();
    assert!(stats.recorded >= 1);
    assert_eq!(report.generation, Some(generator.generation()));
}

#[test]
fn test_zero_target_stops_after_first_run() {
    let tester = AutomatedTester::new(
        GridFirmware::new(3, 3).unwrap(),
        HarnessConfig {
            max_runs: 10,
            coverage_target: 0.0,
            workers: 1,
        },
    )
    .unwrap();

    let report = tester.run(&mut generator()).unwrap();
    assert_eq!(report.runs, 1);
    assert!(report.target_reached);
}

#[test]
fn test_parallel_workers_share_one_generator() {
    let tester = AutomatedTester::new(
        GridFirmware::new(8, 8).unwrap(),
        HarnessConfig {
            max_runs: 60,
            coverage_target: 100.0,
            workers: 4,
        },
    )
    .unwrap();

    let shared = SharedGenerator::new(generator());
    let report = tester.run_parallel(&shared).unwrap();

    assert!(report.runs >= 1 && report.runs <= 60);
    if !report.target_reached {
        assert_eq!(report.runs, 60);
    }

    let stats = shared.stats().unwrap();
    assert!(stats.recorded >= 1);
    assert!(shared.best().is_ok());

    let generator = shared.into_inner().unwrap();
    assert!(generator.best().is_ok());
}

#[test]
fn test_report_json() {
    let tester = AutomatedTester::new(
        GridFirmware::new(2, 2).unwrap(),
        HarnessConfig {
            max_runs: 3,
            coverage_target: 100.0,
            workers: 1,
        },
    )
    .unwrap();

    let report = tester.run(&mut generator()).unwrap();
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["total_sites"], 9);
    assert!(json["best_sequence"].is_string());
}

/// Grid firmware that fails on its `fail_at`-th execution.
struct FailingFirmware {
    inner: GridFirmware,
    fail_at: usize,
    executions: AtomicUsize,
}

impl FirmwareExecutor for FailingFirmware {
    fn site_count(&self) -> usize {
        self.inner.site_count()
    }

    fn execute(&self, seq: &InputSequence) -> Result<CoverageRecord> {
        let call = self.executions.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_at {
            return Err(PadcovError::Execution("emulator crashed".to_string()));
        }
        self.inner.execute(seq)
    }
}

#[test]
fn test_parallel_failure_aborts_all_workers() {
    let tester = AutomatedTester::new(
        FailingFirmware {
            inner: GridFirmware::new(8, 8).unwrap(),
            fail_at: 3,
            executions: AtomicUsize::new(0),
        },
        HarnessConfig {
            max_runs: 200,
            coverage_target: 100.0,
            workers: 4,
        },
    )
    .unwrap();

    let result = tester.run_parallel(&SharedGenerator::new(generator()));
    assert!(matches!(result, Err(PadcovError::Execution(_))));

    // Workers already past the ticket check may finish one more run each
    let executions = tester.executor().executions.load(Ordering::SeqCst);
    assert!(executions < 20, "ran {} executions after the failure", executions);
}

#[test]
fn test_sequential_failure_aborts() {
    let tester = AutomatedTester::new(
        FailingFirmware {
            inner: GridFirmware::new(4, 4).unwrap(),
            fail_at: 2,
            executions: AtomicUsize::new(0),
        },
        HarnessConfig {
            max_runs: 50,
            coverage_target: 100.0,
            workers: 1,
        },
    )
    .unwrap();

    assert!(tester.run(&mut generator()).is_err());
    assert_eq!(tester.executor().executions.load(Ordering::SeqCst), 2);
}
