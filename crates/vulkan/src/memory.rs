// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Memory
//!
//! A pooled allocator over the device, courtesy of `gpu-allocator`.  Buffers and their backing
//! allocations are created together and destroyed together.  `GpuBuffer` is consumed on
//! destruction so neither half can be freed twice.
//!
//! The allocator holds a clone of the device handle.  It must be destroyed before the device.

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};

use crate::prelude::*;

/// Where the memory should live, from the host's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryUsage {
    /// Device-local.  Not mappable.
    GpuOnly,
    /// Host-visible, written by the host and read by the device.  Staging uploads.
    CpuToGpu,
    /// Host-visible, written by the device and read by the host.  Readback.
    GpuToCpu,
}

impl From<MemoryUsage> for MemoryLocation {
    fn from(usage: MemoryUsage) -> Self {
        match usage {
            MemoryUsage::GpuOnly => MemoryLocation::GpuOnly,
            MemoryUsage::CpuToGpu => MemoryLocation::CpuToGpu,
            MemoryUsage::GpuToCpu => MemoryLocation::GpuToCpu,
        }
    }
}

/// A buffer object and the allocation bound to it.
pub struct GpuBuffer {
    pub buffer: vk::Buffer,
    pub allocation: Allocation,
    pub size_bytes: vk::DeviceSize,
    pub usage: MemoryUsage,
}

impl GpuBuffer {
    /// Host view of the memory.  `None` for `GpuOnly` buffers.
    pub fn mapped_slice(&self) -> Option<&[u8]> {
        self.allocation
            .mapped_slice()
            .map(|bytes| &bytes[..self.size_bytes as usize])
    }

    pub fn mapped_slice_mut(&mut self) -> Option<&mut [u8]> {
        let size = self.size_bytes as usize;
        self.allocation
            .mapped_slice_mut()
            .map(|bytes| &mut bytes[..size])
    }

    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        vk::DescriptorBufferInfo {
            buffer: self.buffer,
            offset: 0,
            range: self.size_bytes,
        }
    }
}

pub struct MemoryAllocator {
    // None after destroy
    allocator: Option<Allocator>,
    device: ash::Device,
}

impl MemoryAllocator {
    pub fn new(context: &DeviceContext) -> Result<Self, VulkanError> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: context.instance.clone(),
            device: context.device.clone(),
            physical_device: context.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| VulkanError::AllocationFailed(format!("allocator creation: {e}")))?;

        Ok(Self {
            allocator: Some(allocator),
            device: context.device.clone(),
        })
    }

    /// Create a buffer of `size_bytes` and bind fresh memory to it.  On failure nothing is left
    /// allocated.
    pub fn create_buffer(
        &mut self,
        name: &str,
        size_bytes: vk::DeviceSize,
        usage_flags: vk::BufferUsageFlags,
        usage: MemoryUsage,
    ) -> Result<GpuBuffer, VulkanError> {
        let allocator = self
            .allocator
            .as_mut()
            .ok_or_else(|| VulkanError::AllocationFailed("allocator destroyed".to_owned()))?;

        if size_bytes == 0 {
            return Err(VulkanError::AllocationFailed(format!(
                "{name}: zero-sized buffer"
            )));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size_bytes)
            .usage(usage_flags)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { self.device.create_buffer(&buffer_info, None) }
            .map_err(|e| VulkanError::AllocationFailed(format!("{name}: create buffer: {e}")))?;

        let requirements = unsafe { self.device.get_buffer_memory_requirements(buffer) };

        let allocation = match allocator.allocate(&AllocationCreateDesc {
            name,
            requirements,
            location: usage.into(),
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        }) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { self.device.destroy_buffer(buffer, None) };
                return Err(VulkanError::AllocationFailed(format!("{name}: {e}")));
            }
        };

        let bound = unsafe {
            self.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
        };
        if let Err(e) = bound {
            if let Err(free_err) = allocator.free(allocation) {
                tracing::warn!("{name}: freeing unbound allocation failed: {free_err}");
            }
            unsafe { self.device.destroy_buffer(buffer, None) };
            return Err(VulkanError::AllocationFailed(format!("{name}: bind memory: {e}")));
        }

        tracing::trace!(name, size_bytes, ?usage, "created buffer");
        Ok(GpuBuffer {
            buffer,
            allocation,
            size_bytes,
            usage,
        })
    }

    /// Free the allocation and destroy the buffer, together.
    pub fn destroy_buffer(&mut self, buffer: GpuBuffer) {
        let GpuBuffer {
            buffer, allocation, ..
        } = buffer;
        match self.allocator.as_mut() {
            Some(allocator) => {
                if let Err(e) = allocator.free(allocation) {
                    tracing::warn!("freeing allocation failed: {e}");
                }
            }
            // The allocator released its memory blocks already.
            None => tracing::warn!("buffer destroyed after its allocator"),
        }
        unsafe { self.device.destroy_buffer(buffer, None) };
    }

    /// Live sub-allocations.  Zero once destroyed.
    pub fn allocation_count(&self) -> usize {
        self.allocator
            .as_ref()
            .map_or(0, |allocator| allocator.generate_report().allocations.len())
    }

    pub fn is_destroyed(&self) -> bool {
        self.allocator.is_none()
    }

    /// Drop the allocator and every memory block it still holds.  Call before the device goes.
    pub fn destroy(&mut self) {
        if let Some(allocator) = self.allocator.take() {
            drop(allocator);
            tracing::debug!("memory allocator destroyed");
        }
    }
}
