// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Queue
//!
//! Vulkan device queues and command buffer pools are tightly coupled.  We only ever want one
//! compute-capable queue and the pool that feeds it.  Every submission here is synchronous: record,
//! submit, wait for idle, free.
//!

use ash::vk;

use crate::prelude::*;

/// Where the compute queue lives.  Unset until a compute-capable family is found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub compute: Option<u32>,
}

impl QueueFamilyIndices {
    /// First family whose flags include `COMPUTE`.  A combined graphics + compute family is as good
    /// as a dedicated one.
    pub fn find(qfps: &[vk::QueueFamilyProperties]) -> Self {
        let compute = qfps
            .iter()
            .position(|qf| qf.queue_count > 0 && qf.queue_flags.contains(vk::QueueFlags::COMPUTE))
            .map(|i| i as u32);
        QueueFamilyIndices { compute }
    }

    pub fn is_complete(&self) -> bool {
        self.compute.is_some()
    }
}

pub struct ComputeQueue {
    pub queue: vk::Queue,
    pub command_pool: vk::CommandPool,
    pub family_index: u32,
}

impl ComputeQueue {
    pub fn new(device: &ash::Device, family_index: u32) -> Result<Self, VulkanError> {
        let queue = unsafe { device.get_device_queue(family_index, 0) };

        let command_pool_ci = vk::CommandPoolCreateInfo::default()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(family_index);

        let command_pool = unsafe { device.create_command_pool(&command_pool_ci, None)? };
        Ok(Self {
            queue,
            command_pool,
            family_index,
        })
    }

    /// Record with `record`, submit, and block until the queue is idle.  The command buffer is freed
    /// whether or not anything failed.
    ///
    /// The pool and the queue are externally synchronized, hence `&mut self`.
    pub fn submit_one_shot<F>(&mut self, device: &ash::Device, record: F) -> Result<(), vk::Result>
    where
        F: FnOnce(&ash::Device, vk::CommandBuffer),
    {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);

        let command_buffers = unsafe { device.allocate_command_buffers(&alloc_info)? };
        let cb = command_buffers[0];

        let result = (|| {
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            unsafe { device.begin_command_buffer(cb, &begin_info)? };

            record(device, cb);

            unsafe {
                device.end_command_buffer(cb)?;
                let submit = vk::SubmitInfo::default().command_buffers(&command_buffers);
                device.queue_submit(self.queue, &[submit], vk::Fence::null())?;
                device.queue_wait_idle(self.queue)
            }
        })();

        unsafe {
            device.free_command_buffers(self.command_pool, &command_buffers);
        }
        result
    }

    pub fn destroy(&self, device: &ash::Device) {
        unsafe {
            device.destroy_command_pool(self.command_pool, None);
        }
        // NOTE device owns queues.  Just drop handles.
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn first_compute_family_wins() {
        let qfps = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::COMPUTE),
        ];
        let indices = QueueFamilyIndices::find(&qfps);
        assert_eq!(indices.compute, Some(1));
        assert!(indices.is_complete());
    }

    #[test]
    fn submission_needs_exclusive_queue() {
        type Record = fn(&ash::Device, vk::CommandBuffer);
        let _: fn(&mut ComputeQueue, &ash::Device, Record) -> Result<(), vk::Result> =
            ComputeQueue::submit_one_shot::<Record>;
    }

    #[test]
    fn no_compute_family() {
        let qfps = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
        ];
        let indices = QueueFamilyIndices::find(&qfps);
        assert_eq!(indices, QueueFamilyIndices::default());
        assert!(!indices.is_complete());
        assert!(!QueueFamilyIndices::find(&[]).is_complete());
    }
}
