//! Graphics backend health check

use crate::app::renderer::VertexLayout;
use crate::health::check::{CheckResult, SystemCheck};

/// Checks that wgpu finds an adapter able to run the model pipeline
pub struct GraphicsBackendCheck;

impl GraphicsBackendCheck {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GraphicsBackendCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCheck for GraphicsBackendCheck {
    fn name(&self) -> &'static str {
        "Graphics Backend"
    }

    fn description(&self) -> Option<&'static str> {
        Some("Validates wgpu instance creation and adapter availability")
    }

    fn needs_gpu(&self) -> bool {
        true
    }

    fn check(&self) -> CheckResult {
        let mut details = Vec::new();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        details.push("  ✓ wgpu instance created".to_string());

        let runtime = match tokio::runtime::Builder::new_current_thread().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                return CheckResult::fail("Failed to create runtime")
                    .with_details(format!("  ✗ {e}"));
            }
        };
        let adapter = runtime.block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: None,
            force_fallback_adapter: false,
        }));

        let adapter = match adapter {
            Ok(adapter) => adapter,
            Err(e) => {
                details.push(format!("  ✗ {e}"));
                return CheckResult::fail("No compatible graphics adapter available")
                    .with_details(details.join("\n"));
            }
        };

        let info = adapter.get_info();
        let device_type = match info.device_type {
            wgpu::DeviceType::DiscreteGpu => "Discrete GPU",
            wgpu::DeviceType::IntegratedGpu => "Integrated GPU",
            wgpu::DeviceType::VirtualGpu => "Virtual GPU",
            wgpu::DeviceType::Cpu => "CPU",
            wgpu::DeviceType::Other => "Other",
        };
        details.push(format!(
            "  ✓ Adapter: {} - {} ({:?})",
            info.name, device_type, info.backend
        ));

        let limits = adapter.limits();
        let layout = VertexLayout::position_only();
        details.push(format!(
            "  Vertex attributes: {} max, {} needed",
            limits.max_vertex_attributes,
            layout.attributes().len()
        ));

        if (limits.max_vertex_attributes as usize) < layout.attributes().len()
            || u64::from(limits.max_vertex_buffer_array_stride) < layout.stride_bytes()
        {
            return CheckResult::fail(format!("{} cannot run the model pipeline", info.name))
                .with_details(details.join("\n"));
        }

        match info.device_type {
            wgpu::DeviceType::DiscreteGpu | wgpu::DeviceType::IntegratedGpu => {
                CheckResult::pass(format!("{} ({})", info.name, device_type))
                    .with_details(details.join("\n"))
            }
            _ => CheckResult::warn(format!("{} (no hardware GPU detected)", info.name))
                .with_details(details.join("\n")),
        }
    }
}
