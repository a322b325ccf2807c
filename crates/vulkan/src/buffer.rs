// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Buffer
//!
//! `DeviceBuffer<T>` is a device-local storage buffer holding an array of `T`.  Device-local memory
//! is not host-mappable, so data goes in and out through short-lived staging buffers and one-shot
//! copy submissions.
//!
//! Upload is two-phase:
//!
//! 1. create the device-local target
//! 2. stage the host data and copy it over, retrying once with a fresh staging buffer when the
//!    transfer itself fails
//!
//! Anything created along the way is destroyed before an error is returned.

use std::marker::PhantomData;

use ash::vk;
use bytemuck::Pod;

use crate::memory::GpuBuffer;
use crate::prelude::*;

pub struct DeviceBuffer<T> {
    raw: GpuBuffer,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> DeviceBuffer<T> {
    /// Upload `data` into a new device-local buffer.  An empty `data` still gets a buffer, sized for
    /// one zeroed element, so its descriptor slot can be bound.  `len()` stays 0.
    pub fn upload(
        context: &mut DeviceContext,
        allocator: &mut MemoryAllocator,
        name: &str,
        data: &[T],
    ) -> Result<Self, VulkanError> {
        Self::upload_with(context, allocator, name, data, stage_and_copy)
    }

    /// `upload` with the per-attempt transfer supplied by the caller.
    pub(crate) fn upload_with<S>(
        context: &mut DeviceContext,
        allocator: &mut MemoryAllocator,
        name: &str,
        data: &[T],
        mut stage: S,
    ) -> Result<Self, VulkanError>
    where
        S: FnMut(
            &mut DeviceContext,
            &mut MemoryAllocator,
            &str,
            &[u8],
            &GpuBuffer,
        ) -> Result<(), VulkanError>,
    {
        let zeroed = [T::zeroed()];
        let contents: &[u8] = if data.is_empty() {
            bytemuck::cast_slice(&zeroed)
        } else {
            bytemuck::cast_slice(data)
        };
        let size_bytes = contents.len() as vk::DeviceSize;

        let target = allocator.create_buffer(
            name,
            size_bytes,
            vk::BufferUsageFlags::STORAGE_BUFFER
                | vk::BufferUsageFlags::TRANSFER_DST
                | vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryUsage::GpuOnly,
        )?;

        let staged = retry_transfer(name, || stage(context, allocator, name, contents, &target));

        if let Err(e) = staged {
            allocator.destroy_buffer(target);
            return Err(e);
        }

        tracing::debug!(name, len = data.len(), size_bytes, "uploaded device buffer");
        Ok(Self {
            raw: target,
            len: data.len(),
            _marker: PhantomData,
        })
    }

    /// Copy the device contents back to the host.  Debug and test path, it stalls the queue.
    pub fn read_back(
        &self,
        context: &mut DeviceContext,
        allocator: &mut MemoryAllocator,
    ) -> Result<Vec<T>, VulkanError> {
        if self.len == 0 {
            return Ok(Vec::new());
        }
        let size_bytes = self.byte_len();

        let readback = allocator.create_buffer(
            "readback",
            size_bytes,
            vk::BufferUsageFlags::TRANSFER_DST,
            MemoryUsage::GpuToCpu,
        )?;

        let copied = context
            .queue
            .submit_one_shot(&context.device, |device, cb| unsafe {
                device.cmd_copy_buffer(
                    cb,
                    self.raw.buffer,
                    readback.buffer,
                    &[vk::BufferCopy {
                        src_offset: 0,
                        dst_offset: 0,
                        size: size_bytes,
                    }],
                );
                barrier(
                    device,
                    cb,
                    readback.buffer,
                    (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_WRITE),
                    (vk::PipelineStageFlags::HOST, vk::AccessFlags::HOST_READ),
                );
            })
            .map_err(|e| VulkanError::TransferFailed(format!("readback copy: {e}")));

        let result = copied.and_then(|_| {
            readback
                .mapped_slice()
                .map(|bytes| bytemuck::pod_collect_to_vec(&bytes[..size_bytes as usize]))
                .ok_or_else(|| VulkanError::TransferFailed("readback memory not mapped".to_owned()))
        });

        allocator.destroy_buffer(readback);
        result
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes of live data.  Zero for an empty upload even though the buffer itself is not.
    pub fn byte_len(&self) -> vk::DeviceSize {
        (self.len * size_of::<T>()) as vk::DeviceSize
    }

    pub fn buffer(&self) -> vk::Buffer {
        self.raw.buffer
    }

    /// Covers the whole buffer, including the placeholder element of an empty upload.
    pub fn descriptor_info(&self) -> vk::DescriptorBufferInfo {
        self.raw.descriptor_info()
    }

    pub fn destroy(self, allocator: &mut MemoryAllocator) {
        allocator.destroy_buffer(self.raw);
    }
}

/// Run `attempt`, then once more if the transfer itself failed.  Other errors are returned as is.
fn retry_transfer<F>(name: &str, mut attempt: F) -> Result<(), VulkanError>
where
    F: FnMut() -> Result<(), VulkanError>,
{
    match attempt() {
        Err(VulkanError::TransferFailed(reason)) => {
            tracing::warn!(name, %reason, "transfer failed, retrying with fresh staging buffer");
            attempt()
        }
        other => other,
    }
}

/// One attempt: fresh staging buffer, host write, copy into `target`, wait, destroy staging.
fn stage_and_copy(
    context: &mut DeviceContext,
    allocator: &mut MemoryAllocator,
    name: &str,
    contents: &[u8],
    target: &GpuBuffer,
) -> Result<(), VulkanError> {
    let size_bytes = contents.len() as vk::DeviceSize;
    let mut staging = allocator.create_buffer(
        "staging",
        size_bytes,
        vk::BufferUsageFlags::TRANSFER_SRC,
        MemoryUsage::CpuToGpu,
    )?;

    let result = match staging.mapped_slice_mut() {
        Some(mapped) => {
            mapped.copy_from_slice(contents);
            context
                .queue
                .submit_one_shot(&context.device, |device, cb| unsafe {
                    device.cmd_copy_buffer(
                        cb,
                        staging.buffer,
                        target.buffer,
                        &[vk::BufferCopy {
                            src_offset: 0,
                            dst_offset: 0,
                            size: size_bytes,
                        }],
                    );
                    barrier(
                        device,
                        cb,
                        target.buffer,
                        (vk::PipelineStageFlags::TRANSFER, vk::AccessFlags::TRANSFER_WRITE),
                        (
                            vk::PipelineStageFlags::COMPUTE_SHADER,
                            vk::AccessFlags::SHADER_READ | vk::AccessFlags::SHADER_WRITE,
                        ),
                    );
                })
                .map_err(|e| VulkanError::TransferFailed(format!("{name}: staging copy: {e}")))
        }
        None => Err(VulkanError::TransferFailed(format!(
            "{name}: staging memory not mapped"
        ))),
    };

    allocator.destroy_buffer(staging);
    result
}

/// Whole-buffer memory barrier between two (stage, access) pairs.
pub fn barrier(
    device: &ash::Device,
    cb: vk::CommandBuffer,
    buffer: vk::Buffer,
    src: (vk::PipelineStageFlags, vk::AccessFlags),
    dst: (vk::PipelineStageFlags, vk::AccessFlags),
) {
    let buffer_barrier = vk::BufferMemoryBarrier::default()
        .src_access_mask(src.1)
        .dst_access_mask(dst.1)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .buffer(buffer)
        .offset(0)
        .size(vk::WHOLE_SIZE);

    unsafe {
        device.cmd_pipeline_barrier(
            cb,
            src.0,
            dst.0,
            vk::DependencyFlags::empty(),
            &[],
            &[buffer_barrier],
            &[],
        );
    }
}

#[cfg(test)]
mod test {
    use std::cell::Cell;

    use super::*;

    fn failed() -> VulkanError {
        VulkanError::TransferFailed("copy lost".to_owned())
    }

    #[test]
    fn transfer_retried_once_then_succeeds() {
        let calls = Cell::new(0);
        let result = retry_transfer("t", || {
            calls.set(calls.get() + 1);
            if calls.get() == 1 { Err(failed()) } else { Ok(()) }
        });
        assert!(result.is_ok());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn second_transfer_failure_escalates() {
        let calls = Cell::new(0);
        let result = retry_transfer("t", || {
            calls.set(calls.get() + 1);
            Err(failed())
        });
        assert!(matches!(result, Err(VulkanError::TransferFailed(_))));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn other_errors_not_retried() {
        let calls = Cell::new(0);
        let result = retry_transfer("t", || {
            calls.set(calls.get() + 1);
            Err(VulkanError::AllocationFailed("out of memory".to_owned()))
        });
        assert!(matches!(result, Err(VulkanError::AllocationFailed(_))));
        assert_eq!(calls.get(), 1);
    }

    fn setup() -> (DeviceContext, MemoryAllocator) {
        let context = DeviceContext::create(&ContextConfig::default()).unwrap();
        let allocator = MemoryAllocator::new(&context).unwrap();
        (context, allocator)
    }

    #[test]
    #[ignore = "needs a Vulkan device"]
    fn failed_upload_releases_target() {
        let (mut context, mut allocator) = setup();
        let before = allocator.allocation_count();

        let mut attempts = 0;
        let result = DeviceBuffer::upload_with(
            &mut context,
            &mut allocator,
            "doomed",
            &[1.0_f32; 16],
            |_, _, _, _, _| {
                attempts += 1;
                Err(failed())
            },
        );
        assert!(matches!(result, Err(VulkanError::TransferFailed(_))));
        assert_eq!(attempts, 2);
        assert_eq!(allocator.allocation_count(), before);

        allocator.destroy();
        context.destroy();
    }

    #[test]
    #[ignore = "needs a Vulkan device"]
    fn retried_upload_lands_data() {
        let (mut context, mut allocator) = setup();
        let data: Vec<u32> = (0..64).collect();

        let mut attempts = 0;
        let buffer = DeviceBuffer::upload_with(
            &mut context,
            &mut allocator,
            "flaky",
            &data,
            |context, allocator, name, contents, target| {
                attempts += 1;
                if attempts == 1 {
                    Err(failed())
                } else {
                    stage_and_copy(context, allocator, name, contents, target)
                }
            },
        )
        .unwrap();
        assert_eq!(attempts, 2);
        assert_eq!(buffer.read_back(&mut context, &mut allocator).unwrap(), data);

        buffer.destroy(&mut allocator);
        allocator.destroy();
        context.destroy();
    }
}
