// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Context
//!
//! Fundamentally required resources, including the entry, instance, hardware device and the one
//! compute queue we use, are encapsulated by `DeviceContext`.
//!
//! Initializing a physical device for use results in a logical `ash::Device`, which is used in most
//! calls to Vulkan.  Device selection is first-match: the first physical device with a compute
//! queue family and every required extension is used.  There is no scoring.

use std::ffi::{CStr, CString};

use ash::vk;

use crate::diagnostics::{self, Diagnostics};
use crate::prelude::*;
use crate::queue::{ComputeQueue, QueueFamilyIndices};

/// Device extensions a candidate must support.  Nothing beyond core is needed for compute.
pub const REQUIRED_DEVICE_EXTENSIONS: &[&CStr] = &[];

/// What device selection needs to know about a physical device.  Implemented for the real thing
/// and for fakes in tests.
pub trait DeviceCandidate {
    fn queue_family_properties(&self) -> Vec<vk::QueueFamilyProperties>;
    fn supports_extensions(&self, required: &[&CStr]) -> bool;
}

/// A physical device seen through its instance.
pub struct PhysicalDeviceProbe<'a> {
    pub instance: &'a ash::Instance,
    pub physical_device: vk::PhysicalDevice,
}

impl DeviceCandidate for PhysicalDeviceProbe<'_> {
    fn queue_family_properties(&self) -> Vec<vk::QueueFamilyProperties> {
        unsafe {
            self.instance
                .get_physical_device_queue_family_properties(self.physical_device)
        }
    }

    fn supports_extensions(&self, required: &[&CStr]) -> bool {
        let available = match unsafe {
            self.instance
                .enumerate_device_extension_properties(self.physical_device)
        } {
            Ok(available) => available,
            Err(e) => {
                tracing::warn!("enumerating device extensions failed: {e}");
                return false;
            }
        };
        required.iter().all(|req| {
            available
                .iter()
                .any(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) } == *req)
        })
    }
}

/// Index of the first suitable candidate and its compute queue family.
pub fn select_device<C: DeviceCandidate>(
    candidates: &[C],
    required_extensions: &[&CStr],
) -> Option<(usize, u32)> {
    candidates.iter().enumerate().find_map(|(i, candidate)| {
        let indices = QueueFamilyIndices::find(&candidate.queue_family_properties());
        match indices.compute {
            Some(family) if candidate.supports_extensions(required_extensions) => {
                Some((i, family))
            }
            _ => None,
        }
    })
}

pub struct DeviceContext {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    diagnostics: Option<Diagnostics>,

    pub physical_device: vk::PhysicalDevice,
    /// Vulkan logical device
    pub device: ash::Device,
    /// The compute queue and its command pool.
    pub queue: ComputeQueue,

    properties: vk::PhysicalDeviceProperties,
    destroyed: bool,
}

impl DeviceContext {
    /// Obtain an entry, instance, and initialized device.  Nothing is leaked on failure.
    pub fn create(config: &ContextConfig) -> Result<Self, VulkanError> {
        let entry = unsafe { ash::Entry::load()? };

        // Checked before the instance exists so a missing layer leaves nothing behind.
        if config.enable_diagnostics {
            let available = diagnostics::available_layers(&entry)?;
            diagnostics::check_layers(&available, &config.required_layers)?;
        }

        let instance = create_instance(&entry, config)?;

        let diagnostics = if config.enable_diagnostics {
            match Diagnostics::new(&entry, &instance) {
                Ok(d) => Some(d),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        let destroy_partial = |diagnostics: &Option<Diagnostics>| unsafe {
            if let Some(d) = diagnostics {
                d.destroy();
            }
            instance.destroy_instance(None);
        };

        let picked = match pick_physical_device(&instance) {
            Ok(picked) => picked,
            Err(e) => {
                destroy_partial(&diagnostics);
                return Err(e);
            }
        };
        let (physical_device, family_index) = picked;

        let device = match create_device(&instance, physical_device, family_index) {
            Ok(device) => device,
            Err(e) => {
                destroy_partial(&diagnostics);
                return Err(e);
            }
        };

        let queue = match ComputeQueue::new(&device, family_index) {
            Ok(queue) => queue,
            Err(e) => {
                unsafe { device.destroy_device(None) };
                destroy_partial(&diagnostics);
                return Err(e);
            }
        };

        let properties = unsafe { instance.get_physical_device_properties(physical_device) };

        let context = Self {
            entry,
            instance,
            diagnostics,
            physical_device,
            device,
            queue,
            properties,
            destroyed: false,
        };
        tracing::info!(
            device = %context.device_name(),
            queue_family = family_index,
            diagnostics = context.diagnostics_enabled(),
            "device context ready"
        );
        Ok(context)
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn compute_queue(&self) -> vk::Queue {
        self.queue.queue
    }

    pub fn compute_pool(&self) -> vk::CommandPool {
        self.queue.command_pool
    }

    pub fn limits(&self) -> &vk::PhysicalDeviceLimits {
        &self.properties.limits
    }

    pub fn device_name(&self) -> String {
        unsafe { CStr::from_ptr(self.properties.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned()
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.is_some()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn wait_idle(&self) -> Result<(), VulkanError> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Release everything in reverse creation order.  A second call does nothing.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                tracing::warn!("device wait before teardown failed: {e}");
            }
            self.queue.destroy(&self.device);
            self.device.destroy_device(None);
            if let Some(diagnostics) = self.diagnostics.take() {
                diagnostics.destroy();
            }
            self.instance.destroy_instance(None);
        }
        tracing::debug!("device context destroyed");
    }
}

fn create_instance(entry: &ash::Entry, config: &ContextConfig) -> Result<ash::Instance, VulkanError> {
    let app_info = vk::ApplicationInfo::default()
        .application_name(&config.application_name)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(c"gridlight")
        .api_version(vk::make_api_version(0, 1, 3, 0));

    let mut extensions = Vec::new();
    if config.enable_diagnostics {
        extensions.push(ash::vk::EXT_DEBUG_UTILS_NAME.as_ptr());
    }
    let layers: Vec<*const std::ffi::c_char> =
        config.layers().iter().map(|l: &CString| l.as_ptr()).collect();

    let mut debug_info = diagnostics::messenger_create_info();
    let mut create_info = vk::InstanceCreateInfo::default()
        .application_info(&app_info)
        .enabled_extension_names(&extensions)
        .enabled_layer_names(&layers);
    if config.enable_diagnostics {
        create_info = create_info.push_next(&mut debug_info);
    }

    let instance = unsafe { entry.create_instance(&create_info, None)? };
    Ok(instance)
}

fn pick_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32), VulkanError> {
    let physical_devices = unsafe { instance.enumerate_physical_devices()? };
    tracing::debug!(count = physical_devices.len(), "enumerated physical devices");

    let probes: Vec<PhysicalDeviceProbe> = physical_devices
        .iter()
        .map(|&physical_device| PhysicalDeviceProbe {
            instance,
            physical_device,
        })
        .collect();

    select_device(&probes, REQUIRED_DEVICE_EXTENSIONS)
        .map(|(i, family)| (physical_devices[i], family))
        .ok_or(VulkanError::NoCapableDevice)
}

fn create_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    family_index: u32,
) -> Result<ash::Device, VulkanError> {
    let queue_priorities = [1.0];
    let queue_infos = [vk::DeviceQueueCreateInfo::default()
        .queue_family_index(family_index)
        .queue_priorities(&queue_priorities)];

    let device_extensions: Vec<*const std::ffi::c_char> = REQUIRED_DEVICE_EXTENSIONS
        .iter()
        .map(|ext| ext.as_ptr())
        .collect();

    let device_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&device_extensions);

    unsafe {
        instance
            .create_device(physical_device, &device_info, None)
            .map_err(VulkanError::DeviceCreationFailed)
    }
}
