//! Runs checks and tallies the results

use std::time::Instant;

use tracing::debug;

use super::check::{CheckResult, CheckStatus, SystemCheck};

/// Results of one run, in registration order
#[derive(Debug)]
pub struct HealthCheckReport {
    pub results: Vec<(String, CheckResult)>,
    pub total: usize,
    pub passed: usize,
    pub warned: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl HealthCheckReport {
    /// Returns true if no check failed
    pub fn is_healthy(&self) -> bool {
        self.failed == 0
    }

    pub fn has_warnings(&self) -> bool {
        self.warned > 0
    }

    /// 0 = all pass, 1 = any fail, 2 = any warn (but no fail)
    ///
    /// Skipped checks do not affect the code.
    pub fn exit_code(&self) -> i32 {
        if self.failed > 0 {
            1
        } else if self.warned > 0 {
            2
        } else {
            0
        }
    }

    /// Result of the check called `name`
    pub fn get(&self, name: &str) -> Option<&CheckResult> {
        self.results
            .iter()
            .find(|(check, _)| check == name)
            .map(|(_, result)| result)
    }
}

/// Collects checks and runs them in order
pub struct HealthCheckRunner {
    checks: Vec<Box<dyn SystemCheck>>,
    headless: bool,
}

impl HealthCheckRunner {
    pub fn new() -> Self {
        Self {
            checks: Vec::new(),
            headless: false,
        }
    }

    pub fn add_check<C: SystemCheck + 'static>(mut self, check: C) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    /// Skips checks that need a GPU adapter
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn run(self) -> HealthCheckReport {
        let mut report = HealthCheckReport {
            results: Vec::with_capacity(self.checks.len()),
            total: self.checks.len(),
            passed: 0,
            warned: 0,
            failed: 0,
            skipped: 0,
        };

        for check in self.checks {
            let result = if self.headless && check.needs_gpu() {
                CheckResult::skip("Needs a GPU; runner is headless")
            } else {
                let start = Instant::now();
                let result = check.check();
                result.with_duration(start.elapsed())
            };
            debug!(check = check.name(), status = ?result.status, "Health check finished");

            match result.status {
                CheckStatus::Pass => report.passed += 1,
                CheckStatus::Warn => report.warned += 1,
                CheckStatus::Fail => report.failed += 1,
                CheckStatus::Skip => report.skipped += 1,
            }
            report.results.push((check.name().to_string(), result));
        }

        report
    }
}

impl Default for HealthCheckRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str, CheckStatus, bool);

    impl SystemCheck for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn check(&self) -> CheckResult {
            match self.1 {
                CheckStatus::Pass => CheckResult::pass("ok"),
                CheckStatus::Warn => CheckResult::warn("meh"),
                CheckStatus::Fail => CheckResult::fail("bad"),
                CheckStatus::Skip => CheckResult::skip("n/a"),
            }
        }

        fn needs_gpu(&self) -> bool {
            self.2
        }
    }

    #[test]
    fn test_tallies_and_exit_code() {
        let report = HealthCheckRunner::new()
            .add_check(Fixed("a", CheckStatus::Pass, false))
            .add_check(Fixed("b", CheckStatus::Warn, false))
            .run();

        assert_eq!((report.passed, report.warned, report.failed), (1, 1, 0));
        assert_eq!(report.exit_code(), 2);

        let report = HealthCheckRunner::new()
            .add_check(Fixed("a", CheckStatus::Warn, false))
            .add_check(Fixed("b", CheckStatus::Fail, false))
            .run();
        assert_eq!(report.exit_code(), 1);
        assert!(!report.is_healthy());
    }

    #[test]
    fn test_headless_skips_gpu_checks() {
        let report = HealthCheckRunner::new()
            .headless(true)
            .add_check(Fixed("gpu", CheckStatus::Fail, true))
            .add_check(Fixed("cpu", CheckStatus::Pass, false))
            .run();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.get("gpu").map(|r| r.status), Some(CheckStatus::Skip));
        assert_eq!(report.exit_code(), 0);
    }
}
