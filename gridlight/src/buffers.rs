// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Scene Buffers
//!
//! One device-local storage buffer per primitive kind, each bound at a fixed slot.  The slot
//! numbers are a contract with every kernel.

use ash::vk;

use gridlight_vulkan::buffer::DeviceBuffer;

use crate::prelude::*;
use crate::scene::{Circle, GridCell, LightSource, Rectangle, Scene};

pub const SLOT_GRID: u32 = 0;
pub const SLOT_RECTANGLES: u32 = 1;
pub const SLOT_CIRCLES: u32 = 2;
pub const SLOT_LIGHTS: u32 = 3;
pub const SLOT_COUNT: u32 = 4;

pub struct SceneBufferSet {
    pub grid: DeviceBuffer<GridCell>,
    pub rectangles: DeviceBuffer<Rectangle>,
    pub circles: DeviceBuffer<Circle>,
    pub lights: DeviceBuffer<LightSource>,
    grid_width: u32,
    grid_height: u32,
    cell_count: u32,
}

/// Cell count as a dispatch dimension.  Grids past `u32::MAX` cells cannot be indexed by a kernel.
fn dispatchable_cells(len: usize) -> Result<u32, GridlightError> {
    if len == 0 {
        return Err(GridlightError::Scene("grid must not be empty".to_owned()));
    }
    u32::try_from(len)
        .map_err(|_| GridlightError::Scene(format!("grid of {len} cells is too large to dispatch")))
}

impl SceneBufferSet {
    /// Upload every primitive kind.  If any upload fails, the ones already made are destroyed.
    pub fn upload(
        context: &mut DeviceContext,
        allocator: &mut MemoryAllocator,
        scene: &Scene,
    ) -> Result<Self, GridlightError> {
        let cell_count = dispatchable_cells(scene.grid.len())?;

        let grid = DeviceBuffer::upload(context, allocator, "grid", scene.grid.cells())?;

        let rectangles =
            match DeviceBuffer::upload(context, allocator, "rectangles", &scene.rectangles) {
                Ok(b) => b,
                Err(e) => {
                    grid.destroy(allocator);
                    return Err(e.into());
                }
            };

        let circles = match DeviceBuffer::upload(context, allocator, "circles", &scene.circles) {
            Ok(b) => b,
            Err(e) => {
                rectangles.destroy(allocator);
                grid.destroy(allocator);
                return Err(e.into());
            }
        };

        let lights = match DeviceBuffer::upload(context, allocator, "lights", &scene.lights) {
            Ok(b) => b,
            Err(e) => {
                circles.destroy(allocator);
                rectangles.destroy(allocator);
                grid.destroy(allocator);
                return Err(e.into());
            }
        };

        tracing::info!(
            cells = grid.len(),
            rectangles = rectangles.len(),
            circles = circles.len(),
            lights = lights.len(),
            "scene uploaded"
        );

        Ok(Self {
            grid,
            rectangles,
            circles,
            lights,
            grid_width: scene.grid.width(),
            grid_height: scene.grid.height(),
            cell_count,
        })
    }

    /// Buffer infos in slot order, ready for the binding layer.
    pub fn descriptor_infos(&self) -> [vk::DescriptorBufferInfo; SLOT_COUNT as usize] {
        let mut infos = [vk::DescriptorBufferInfo::default(); SLOT_COUNT as usize];
        infos[SLOT_GRID as usize] = self.grid.descriptor_info();
        infos[SLOT_RECTANGLES as usize] = self.rectangles.descriptor_info();
        infos[SLOT_CIRCLES as usize] = self.circles.descriptor_info();
        infos[SLOT_LIGHTS as usize] = self.lights.descriptor_info();
        infos
    }

    pub fn grid_dimensions(&self) -> (u32, u32) {
        (self.grid_width, self.grid_height)
    }

    pub fn cell_count(&self) -> u32 {
        self.cell_count
    }

    /// Copy the grid back to the host.
    pub fn read_grid(
        &self,
        context: &mut DeviceContext,
        allocator: &mut MemoryAllocator,
    ) -> Result<Vec<GridCell>, GridlightError> {
        Ok(self.grid.read_back(context, allocator)?)
    }

    pub fn destroy(self, allocator: &mut MemoryAllocator) {
        self.lights.destroy(allocator);
        self.circles.destroy(allocator);
        self.rectangles.destroy(allocator);
        self.grid.destroy(allocator);
    }
}
