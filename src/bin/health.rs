//! Runs every startup health check and prints a report
//!
//! Exit code: 0 when all pass, 1 on any failure, 2 on warnings only.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use hotshade::health::{self, HealthCheckRunner, checks::*};

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hotshade=warn")))
        .init();

    let headless = SystemInfoCheck::display().is_none();
    let report = HealthCheckRunner::new()
        .headless(headless)
        .add_check(ConfigCheck::new())
        .add_check(BuildInfoCheck::new())
        .add_check(SystemInfoCheck::new())
        .add_check(AssetsCheck::new())
        .add_check(RenderLoopCheck::new())
        .add_check(GraphicsBackendCheck::new())
        .run();

    health::print_report(&report);
    std::process::exit(report.exit_code());
}
