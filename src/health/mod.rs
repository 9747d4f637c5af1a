//! Startup diagnostics
//!
//! Each [`SystemCheck`] probes one piece the demo needs before a window can
//! open: config profiles, asset files, the render loop on the recording
//! backend, build metadata, the display and a GPU adapter. The `health`
//! binary runs them all and exits non-zero on failure.
//!
//! ```no_run
//! use hotshade::health::{HealthCheckRunner, checks::*};
//!
//! let report = HealthCheckRunner::new()
//!     .headless(true)
//!     .add_check(AssetsCheck::new())
//!     .add_check(RenderLoopCheck::new())
//!     .add_check(GraphicsBackendCheck::new())
//!     .run();
//!
//! assert_eq!(report.skipped, 1);
//! ```

pub mod check;
pub mod checks;
pub mod reporter;
pub mod runner;

pub use check::{CheckResult, CheckStatus, SystemCheck};
pub use reporter::{format_report, print_report};
pub use runner::{HealthCheckReport, HealthCheckRunner};

/// Runs every check that needs no GPU and returns a report
pub fn run_all_checks() -> HealthCheckReport {
    HealthCheckRunner::new()
        .add_check(checks::ConfigCheck::new())
        .add_check(checks::AssetsCheck::new())
        .add_check(checks::RenderLoopCheck::new())
        .add_check(checks::BuildInfoCheck::new())
        .add_check(checks::SystemInfoCheck::new())
        .run()
}
