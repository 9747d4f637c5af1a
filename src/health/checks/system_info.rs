//! System information health check

use sysinfo::System;

use crate::health::check::{CheckResult, SystemCheck};

/// Environment variables that indicate a display the window can open on
const DISPLAY_VARS: [&str; 2] = ["WAYLAND_DISPLAY", "DISPLAY"];

/// Checks that system information can be gathered and a display is reachable
pub struct SystemInfoCheck;

impl SystemInfoCheck {
    pub fn new() -> Self {
        Self
    }

    /// The display server the window would connect to, if any
    pub fn display() -> Option<String> {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            return Some("native".to_string());
        }
        DISPLAY_VARS.iter().find_map(|var| {
            std::env::var(var)
                .ok()
                .filter(|value| !value.is_empty())
                .map(|value| format!("{var}={value}"))
        })
    }
}

impl Default for SystemInfoCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for SystemInfoCheck {
    fn name(&self) -> &'static str {
        "System Info"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Reports OS, CPU and memory, and whether a display is available")
    }

    fn check(&self) -> CheckResult {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();

        let mut details = Vec::new();

        let os_name = System::name().unwrap_or_else(|| "Unknown".to_string());
        let os_version = System::os_version().unwrap_or_else(|| "Unknown".to_string());
        details.push(format!("  OS: {} {}", os_name, os_version));

        let logical_cores = sys.cpus().len();
        details.push(format!("  CPU cores: {} logical", logical_cores));

        let total_memory_gb = sys.total_memory() as f64 / 1_073_741_824.0;
        details.push(format!("  Memory: {:.1} GB total", total_memory_gb));

        let display = Self::display();
        details.push(format!(
            "  Display: {}",
            display.as_deref().unwrap_or("none")
        ));

        let details = details.join("\n");

        if logical_cores == 0 {
            CheckResult::warn("Unable to detect CPU cores").with_details(details)
        } else if display.is_none() {
            // The headless parts still work; only the window would fail to open
            CheckResult::warn("No display available, window cannot open").with_details(details)
        } else {
            CheckResult::pass("System info gathered successfully").with_details(details)
        }
    }
}
