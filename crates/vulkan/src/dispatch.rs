// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Dispatch
//!
//! The one repeatable operation.  Record, submit, wait.  Successive dispatches never overlap.

use ash::vk;

use crate::pipeline::ComputePipeline;
use crate::prelude::*;

/// Workgroups needed to cover `items` invocations.
pub fn group_count(items: u32, workgroup_size: u32) -> u32 {
    items.div_ceil(workgroup_size.max(1))
}

/// Run `pipeline` over `set` with `groups` workgroups and block until the queue is idle.  Shader
/// writes are made visible to transfers and host reads before returning.
pub fn dispatch(
    context: &mut DeviceContext,
    pipeline: &ComputePipeline,
    set: vk::DescriptorSet,
    groups: [u32; 3],
) -> Result<(), VulkanError> {
    let [x, y, z] = groups;
    let limits = context.limits().max_compute_work_group_count;
    if x > limits[0] || y > limits[1] || z > limits[2] {
        tracing::error!(?groups, ?limits, "dispatch exceeds device workgroup limits");
        return Err(VulkanError::SubmissionFailed(vk::Result::ERROR_UNKNOWN));
    }

    context
        .queue
        .submit_one_shot(&context.device, |device, cb| unsafe {
            device.cmd_bind_pipeline(cb, vk::PipelineBindPoint::COMPUTE, pipeline.pipeline);
            device.cmd_bind_descriptor_sets(
                cb,
                vk::PipelineBindPoint::COMPUTE,
                pipeline.layout,
                0,
                &[set],
                &[],
            );
            device.cmd_dispatch(cb, x, y, z);

            let memory_barrier = vk::MemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::SHADER_WRITE)
                .dst_access_mask(
                    vk::AccessFlags::TRANSFER_READ
                        | vk::AccessFlags::HOST_READ
                        | vk::AccessFlags::SHADER_READ,
                );
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::PipelineStageFlags::TRANSFER
                    | vk::PipelineStageFlags::HOST
                    | vk::PipelineStageFlags::COMPUTE_SHADER,
                vk::DependencyFlags::empty(),
                &[memory_barrier],
                &[],
                &[],
            );
        })
        .map_err(VulkanError::SubmissionFailed)?;

    tracing::debug!(x, y, z, "dispatch complete");
    Ok(())
}
