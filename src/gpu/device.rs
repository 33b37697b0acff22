// gpu/device.rs — wgpu device abstraction.
//
// Responsibilities:
//   - Enumerate adapters and select the first non-CPU one.
//   - Expose a `DeviceProfile` for simulating downlevel limits on a
//     development machine (cap invocations per workgroup at 256).
//   - Validate a VRS batch layout against the active profile before a
//     pipeline is built for it.
//
// ADAPTER SELECTION:
// wgpu's default `request_adapter` may grab llvmpipe/softpipe when a
// software renderer is exposed as a valid device. We enumerate explicitly
// and prefer real hardware, falling back to anything as a last resort.
//
// DEVICE LIMITS:
// Under a non-Native profile we request *lower* limits than the hardware
// supports. wgpu validates every dispatch against the requested limits,
// so a layout that would not fit on the target fails here first.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info};

use crate::dispatch::BatchLayout;
use crate::error::VrsError;

/// Hardware profile controlling the requested device limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceProfile {
    /// Use wgpu's default limits.
    Native,
    /// Simulate a downlevel GPU: 256 invocations per workgroup and
    /// 4096-texel textures.
    Downlevel,
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceProfile::Native => write!(f, "Native"),
            DeviceProfile::Downlevel => write!(f, "Downlevel (simulated limits)"),
        }
    }
}

/// Cached adapter information for logging and debugging.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub vendor: u32,
    pub device: u32,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

/// The core GPU context: device, queue and active profile.
///
/// Hold one `GpuDevice` for the lifetime of the application; creating it
/// is expensive.
///
/// # Field drop order
/// Fields drop top to bottom. `_instance` is declared last so the
/// `wgpu::Instance` outlives `device` and `queue`.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub profile: DeviceProfile,
    pub adapter_info: AdapterInfo,
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// First suitable adapter with `DeviceProfile::Native` limits.
    ///
    /// # Errors
    /// Returns `Err` if no adapter is found or the device request fails.
    pub fn new() -> Result<Self, GpuError> {
        Self::new_with_profile(DeviceProfile::Native)
    }

    pub fn new_with_profile(profile: DeviceProfile) -> Result<Self, GpuError> {
        pollster::block_on(Self::init_async(profile))
    }

    async fn init_async(profile: DeviceProfile) -> Result<Self, GpuError> {
        let flags = if cfg!(debug_assertions) {
            wgpu::InstanceFlags::VALIDATION
        } else {
            wgpu::InstanceFlags::empty()
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags,
            ..Default::default()
        });

        let all_adapters = instance.enumerate_adapters(wgpu::Backends::PRIMARY);
        if all_adapters.is_empty() {
            return Err(GpuError::NoSuitableAdapter);
        }
        for a in &all_adapters {
            let info = a.get_info();
            debug!(name = %info.name, backend = ?info.backend, kind = ?info.device_type, "adapter found");
        }

        // Real hardware first, then whatever exists.
        let mut hardware = None;
        let mut fallback = None;
        for a in all_adapters {
            if a.get_info().device_type == wgpu::DeviceType::Cpu {
                fallback.get_or_insert(a);
            } else if hardware.is_none() {
                hardware = Some(a);
            }
        }
        let adapter = hardware.or(fallback).ok_or(GpuError::NoSuitableAdapter)?;

        let raw_info = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw_info.name.clone(),
            vendor: raw_info.vendor,
            device: raw_info.device,
            device_type: raw_info.device_type,
            backend: raw_info.backend,
        };
        info!(adapter = %adapter_info, %profile, "GPU adapter selected");

        // wgpu 22: request_device returns (Device, Queue) directly.
        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("vrsgen"),
                    required_features: wgpu::Features::empty(),
                    required_limits: limits_for_profile(profile),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await?;

        Ok(GpuDevice {
            device,
            queue,
            profile,
            adapter_info,
            _instance: instance,
        })
    }

    /// Check that one workgroup per batch of `layout` fits this device.
    pub fn validate_layout(&self, layout: &BatchLayout) -> Result<(), GpuError> {
        check_invocations(layout, max_invocations_for_profile(self.profile))
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuDevice {{ adapter: {}, profile: {} }}", self.adapter_info, self.profile)
    }
}

// ============================================================
// Limits helpers
// ============================================================

fn limits_for_profile(profile: DeviceProfile) -> wgpu::Limits {
    match profile {
        DeviceProfile::Native => wgpu::Limits::default(),
        DeviceProfile::Downlevel => wgpu::Limits {
            max_compute_invocations_per_workgroup: 256,
            max_compute_workgroup_size_x: 256,
            max_compute_workgroup_size_y: 256,
            max_compute_workgroup_size_z: 64,
            max_texture_dimension_2d: 4096,
            max_storage_buffer_binding_size: 128 << 20,
            ..wgpu::Limits::default()
        },
    }
}

fn max_invocations_for_profile(profile: DeviceProfile) -> u32 {
    limits_for_profile(profile).max_compute_invocations_per_workgroup
}

fn check_invocations(layout: &BatchLayout, max: u32) -> Result<(), GpuError> {
    let total = layout.workgroup_invocations();
    if total > max {
        return Err(GpuError::WorkgroupTooLarge { total, max });
    }
    Ok(())
}

// ============================================================
// Error type
// ============================================================

/// Errors from GPU setup and VRS dispatches.
#[derive(Error, Debug)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoSuitableAdapter,

    #[error("device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("workgroup size {total} exceeds profile limit of {max} invocations")]
    WorkgroupTooLarge { total: u32, max: u32 },

    #[error("rate buffer readback failed: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),

    #[error("readback channel closed before the map callback ran")]
    ReadbackDropped,

    #[error(transparent)]
    Vrs(#[from] VrsError),
}

// ============================================================
// Tests
// ============================================================
