// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Pipeline
//!
//! A compute pipeline built from one SPIR-V kernel and one descriptor set layout.  The shader
//! module only lives while the pipeline is being built.

use ash::vk;

use crate::prelude::*;

pub const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Every kernel exposes its single compute stage under this name.
pub const ENTRY_POINT: &std::ffi::CStr = c"main";

/// Cheap structural check before handing words to the driver.
pub fn validate_spirv(words: &[u32]) -> Result<(), VulkanError> {
    match words.first() {
        None => Err(VulkanError::ShaderModuleInvalid("empty kernel".to_owned())),
        Some(&SPIRV_MAGIC) if words.len() >= 5 => Ok(()),
        Some(&SPIRV_MAGIC) => Err(VulkanError::ShaderModuleInvalid(format!(
            "truncated header: {} words",
            words.len()
        ))),
        Some(magic) => Err(VulkanError::ShaderModuleInvalid(format!(
            "bad magic number {magic:#010x}"
        ))),
    }
}

pub struct ComputePipeline {
    pub layout: vk::PipelineLayout,
    pub pipeline: vk::Pipeline,
}

impl ComputePipeline {
    pub fn build(
        device: &ash::Device,
        kernel: &[u32],
        set_layout: vk::DescriptorSetLayout,
    ) -> Result<Self, VulkanError> {
        validate_spirv(kernel)?;

        let module_ci = vk::ShaderModuleCreateInfo::default().code(kernel);
        let module = unsafe { device.create_shader_module(&module_ci, None) }
            .map_err(|e| VulkanError::ShaderModuleInvalid(format!("driver rejected module: {e}")))?;

        let built = Self::build_with_module(device, module, set_layout);

        unsafe {
            device.destroy_shader_module(module, None);
        }
        built
    }

    fn build_with_module(
        device: &ash::Device,
        module: vk::ShaderModule,
        set_layout: vk::DescriptorSetLayout,
    ) -> Result<Self, VulkanError> {
        let set_layouts = [set_layout];
        let layout_ci = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
        let layout = unsafe { device.create_pipeline_layout(&layout_ci, None) }
            .map_err(VulkanError::PipelineCreationFailed)?;

        let stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(vk::ShaderStageFlags::COMPUTE)
            .module(module)
            .name(ENTRY_POINT);

        let pipeline_ci = vk::ComputePipelineCreateInfo::default()
            .stage(stage)
            .layout(layout);

        let created = unsafe {
            device.create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_ci], None)
        };

        match created {
            Ok(pipelines) => Ok(Self {
                layout,
                pipeline: pipelines[0],
            }),
            Err((_, e)) => {
                unsafe { device.destroy_pipeline_layout(layout, None) };
                Err(VulkanError::PipelineCreationFailed(e))
            }
        }
    }

    pub fn destroy(&mut self, device: &ash::Device) {
        unsafe {
            if self.pipeline != vk::Pipeline::null() {
                device.destroy_pipeline(self.pipeline, None);
            }
            if self.layout != vk::PipelineLayout::null() {
                device.destroy_pipeline_layout(self.layout, None);
            }
        }
        self.pipeline = vk::Pipeline::null();
        self.layout = vk::PipelineLayout::null();
    }
}
