// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Grid Compute
//!
//! The canonical setup sequence, in one place:
//!
//! `DeviceContext` → `MemoryAllocator` → `SceneBufferSet` → `BindingLayer` → `ComputePipeline`
//!
//! Setup is all-or-nothing.  If a stage fails, everything before it is torn down and the error is
//! returned; no half-built `GridCompute` ever exists.  After setup, `dispatch` is the only thing
//! that runs repeatedly.

use gridlight_vulkan::descriptors::BindingLayer;
use gridlight_vulkan::dispatch;
use gridlight_vulkan::pipeline::ComputePipeline;

use crate::buffers::{SLOT_COUNT, SceneBufferSet};
use crate::prelude::*;
use crate::scene::{Grid, Scene};

pub struct GridCompute {
    context: DeviceContext,
    allocator: MemoryAllocator,
    // None once destroyed
    buffers: Option<SceneBufferSet>,
    bindings: BindingLayer,
    pipeline: ComputePipeline,
    destroyed: bool,
}

impl GridCompute {
    pub fn new(config: &ContextConfig, scene: &Scene, kernel: &[u32]) -> Result<Self, GridlightError> {
        let mut context = DeviceContext::create(config)?;

        let mut allocator = match MemoryAllocator::new(&context) {
            Ok(allocator) => allocator,
            Err(e) => {
                context.destroy();
                return Err(e.into());
            }
        };

        let buffers = match SceneBufferSet::upload(&mut context, &mut allocator, scene) {
            Ok(buffers) => buffers,
            Err(e) => {
                allocator.destroy();
                context.destroy();
                return Err(e);
            }
        };

        let bindings = Self::bind(&context, &buffers);
        let mut bindings = match bindings {
            Ok(bindings) => bindings,
            Err(e) => {
                buffers.destroy(&mut allocator);
                allocator.destroy();
                context.destroy();
                return Err(e.into());
            }
        };

        let pipeline = match ComputePipeline::build(context.device(), kernel, bindings.layout()) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                bindings.destroy(context.device());
                buffers.destroy(&mut allocator);
                allocator.destroy();
                context.destroy();
                return Err(e.into());
            }
        };

        tracing::info!("compute pipeline ready");
        Ok(Self {
            context,
            allocator,
            buffers: Some(buffers),
            bindings,
            pipeline,
            destroyed: false,
        })
    }

    fn bind(context: &DeviceContext, buffers: &SceneBufferSet) -> Result<BindingLayer, VulkanError> {
        let mut bindings = BindingLayer::new(context.device(), SLOT_COUNT)?;
        if let Err(e) = bindings.allocate_and_write(context.device(), &buffers.descriptor_infos()) {
            bindings.destroy(context.device());
            return Err(e);
        }
        Ok(bindings)
    }

    fn buffers(&self) -> Result<&SceneBufferSet, GridlightError> {
        self.buffers.as_ref().ok_or(GridlightError::Destroyed)
    }

    /// One synchronous pass with explicit workgroup counts.
    pub fn dispatch(&mut self, groups: [u32; 3]) -> Result<(), GridlightError> {
        if self.destroyed {
            return Err(GridlightError::Destroyed);
        }
        let set = self.bindings.descriptor_set()?;
        dispatch::dispatch(&mut self.context, &self.pipeline, set, groups)?;
        Ok(())
    }

    /// One pass with enough one-dimensional workgroups of `workgroup_size` to cover every cell.
    pub fn dispatch_grid(&mut self, workgroup_size: u32) -> Result<[u32; 3], GridlightError> {
        let cells = self.buffers()?.cell_count();
        let groups = [dispatch::group_count(cells, workgroup_size), 1, 1];
        self.dispatch(groups)?;
        Ok(groups)
    }

    /// Read the grid back off the device.
    pub fn read_grid(&mut self) -> Result<Grid, GridlightError> {
        let buffers = self.buffers.as_ref().ok_or(GridlightError::Destroyed)?;
        let (width, height) = buffers.grid_dimensions();
        let cells = buffers.read_grid(&mut self.context, &mut self.allocator)?;
        Grid::from_cells(width, height, cells)
            .ok_or_else(|| GridlightError::Scene("grid readback has the wrong length".to_owned()))
    }

    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Tear everything down in reverse creation order.  Safe to call again.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        if let Err(e) = self.context.wait_idle() {
            tracing::warn!("wait before teardown failed: {e}");
        }
        let device = self.context.device();
        self.pipeline.destroy(device);
        self.bindings.destroy(device);
        if let Some(buffers) = self.buffers.take() {
            buffers.destroy(&mut self.allocator);
        }
        self.allocator.destroy();
        self.context.destroy();
        tracing::info!("compute torn down");
    }
}

impl Drop for GridCompute {
    fn drop(&mut self) {
        self.destroy();
    }
}
