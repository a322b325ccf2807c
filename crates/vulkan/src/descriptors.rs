// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Descriptors
//!
//! One descriptor set, one storage buffer per slot, compute stage only.  The pool is sized for
//! exactly that set, so the slot count, the layout's binding count, the pool capacity and the
//! number of buffers written must all agree.  They are checked before any Vulkan call is made, so
//! a mismatch never touches the pool and a corrected retry works.
//!
//! Until every slot has been written, `descriptor_set` refuses to hand the set out.  Binding a set
//! with undefined slots is undefined behavior, so we reject it before dispatch instead.

use ash::vk;
use smallvec::SmallVec;

use crate::prelude::*;

pub struct BindingLayer {
    layout: vk::DescriptorSetLayout,
    pool: vk::DescriptorPool,
    set: Option<vk::DescriptorSet>,

    slot_count: u32,
    /// Descriptors the pool was sized for.
    pool_capacity: u32,
    written: bool,
    destroyed: bool,
}

/// The count check, separate so it can be exercised without a device.
pub fn check_binding_counts(
    buffers: usize,
    slot_count: u32,
    pool_capacity: u32,
) -> Result<(), VulkanError> {
    if buffers != slot_count as usize || pool_capacity != slot_count {
        return Err(VulkanError::BindingLayoutMismatch {
            buffers,
            slots: slot_count,
        });
    }
    Ok(())
}

impl BindingLayer {
    pub fn new(device: &ash::Device, slot_count: u32) -> Result<Self, VulkanError> {
        if slot_count == 0 {
            return Err(VulkanError::BindingLayoutMismatch {
                buffers: 0,
                slots: 0,
            });
        }
        let layout = Self::build_layout(device, slot_count)?;
        let pool = match Self::build_pool(device, slot_count) {
            Ok(pool) => pool,
            Err(e) => {
                unsafe { device.destroy_descriptor_set_layout(layout, None) };
                return Err(e);
            }
        };
        Ok(Self {
            layout,
            pool,
            set: None,
            slot_count,
            pool_capacity: slot_count,
            written: false,
            destroyed: false,
        })
    }

    /// One storage buffer binding per slot, visible only to compute.
    pub fn build_layout(
        device: &ash::Device,
        slot_count: u32,
    ) -> Result<vk::DescriptorSetLayout, VulkanError> {
        let bindings: SmallVec<vk::DescriptorSetLayoutBinding, 4> = (0..slot_count)
            .map(|slot| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(slot)
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::COMPUTE)
            })
            .collect();

        let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        Ok(unsafe { device.create_descriptor_set_layout(&layout_info, None)? })
    }

    /// Exactly one set holding `slot_count` storage buffer descriptors.
    pub fn build_pool(device: &ash::Device, slot_count: u32) -> Result<vk::DescriptorPool, VulkanError> {
        let pool_sizes = [vk::DescriptorPoolSize {
            ty: vk::DescriptorType::STORAGE_BUFFER,
            descriptor_count: slot_count,
        }];

        let pool_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(1)
            .pool_sizes(&pool_sizes);

        Ok(unsafe { device.create_descriptor_pool(&pool_info, None)? })
    }

    /// Write `buffers[i]` into slot `i`, all in one update.  The set is allocated on first use and
    /// reused afterwards.
    pub fn allocate_and_write(
        &mut self,
        device: &ash::Device,
        buffers: &[vk::DescriptorBufferInfo],
    ) -> Result<vk::DescriptorSet, VulkanError> {
        check_binding_counts(buffers.len(), self.slot_count, self.pool_capacity)?;

        let set = match self.set {
            Some(set) => set,
            None => {
                let layouts = [self.layout];
                let alloc_info = vk::DescriptorSetAllocateInfo::default()
                    .descriptor_pool(self.pool)
                    .set_layouts(&layouts);
                let set = unsafe { device.allocate_descriptor_sets(&alloc_info)?[0] };
                self.set = Some(set);
                set
            }
        };

        let writes: SmallVec<vk::WriteDescriptorSet, 4> = buffers
            .iter()
            .enumerate()
            .map(|(slot, info)| {
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(slot as u32)
                    .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                    .buffer_info(std::slice::from_ref(info))
            })
            .collect();

        unsafe {
            device.update_descriptor_sets(&writes, &[]);
        }
        self.written = true;
        tracing::debug!(slots = self.slot_count, "descriptor set written");
        Ok(set)
    }

    /// The set, once every slot holds a buffer.
    pub fn descriptor_set(&self) -> Result<vk::DescriptorSet, VulkanError> {
        match self.set {
            Some(set) if self.written => Ok(set),
            _ => Err(VulkanError::BindingLayoutMismatch {
                buffers: 0,
                slots: self.slot_count,
            }),
        }
    }

    pub fn layout(&self) -> vk::DescriptorSetLayout {
        self.layout
    }

    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Destroying the pool frees the set with it.
    pub fn destroy(&mut self, device: &ash::Device) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        unsafe {
            device.destroy_descriptor_pool(self.pool, None);
            device.destroy_descriptor_set_layout(self.layout, None);
        }
        self.set = None;
        self.written = false;
    }
}
