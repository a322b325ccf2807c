// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

// End to end on a real device.  Ignored by default, run with `cargo test -- --ignored`.

mod common;

use gridlight::buffers::SceneBufferSet;
use gridlight::compute::GridCompute;
use gridlight::prelude::*;
use gridlight::scene::{Circle, Grid, GridCell, LightSource, Rectangle, Scene};
use gridlight::vulkan::buffer::DeviceBuffer;

#[test]
#[ignore = "needs a Vulkan device"]
fn fill_kernel_covers_default_grid() {
    let kernel = common::compile_wgsl(common::FILL_WGSL);
    let scene = Scene::default();
    let mut compute = GridCompute::new(&ContextConfig::default(), &scene, &kernel).unwrap();

    assert_eq!(compute.dispatch_grid(64).unwrap(), [7, 1, 1]);
    let grid = compute.read_grid().unwrap();

    assert_eq!(grid.width(), 20);
    assert_eq!(grid.height(), 20);
    assert_eq!(grid.len(), 400);
    assert!(grid.cells().iter().all(|c| c.value == 1.0));
    // Coordinates are untouched by the kernel.
    assert_eq!(grid.cells(), Grid::new(20, 20, 1.0).cells());

    compute.destroy();
}

#[test]
#[ignore = "needs a Vulkan device"]
fn composite_kernel_agrees_with_host_shapes() {
    let kernel = common::compile_wgsl(common::COMPOSITE_WGSL);
    let scene = Scene {
        grid: Grid::new(16, 12, 0.0),
        rectangles: vec![Rectangle::new(1.0, 1.0, 4.0, 3.0)],
        circles: vec![Circle::new(10.0, 6.0, 3.0)],
        lights: vec![],
    };
    let mut compute = GridCompute::new(&ContextConfig::default(), &scene, &kernel).unwrap();
    compute.dispatch_grid(64).unwrap();
    let grid = compute.read_grid().unwrap();

    for cell in grid.cells() {
        let (px, py) = (cell.x as f32 + 0.5, cell.y as f32 + 0.5);
        let covered = scene.rectangles.iter().any(|r| r.contains(px, py))
            || scene.circles.iter().any(|c| c.contains(px, py));
        let expected = if covered { 1.0 } else { 0.0 };
        assert_eq!(cell.value, expected, "cell ({}, {})", cell.x, cell.y);
    }
}

#[test]
#[ignore = "needs a Vulkan device"]
fn lights_brighten_uncovered_cells() {
    let kernel = common::compile_wgsl(common::COMPOSITE_WGSL);
    let mut scene = Scene::with_grid(Grid::new(8, 8, 0.0));
    scene.lights.push(LightSource::new(4.0, 4.0, 1.0, 0.5));
    let mut compute = GridCompute::new(&ContextConfig::default(), &scene, &kernel).unwrap();
    compute.dispatch_grid(64).unwrap();
    let grid = compute.read_grid().unwrap();

    let near = grid.get(3, 3).unwrap().value;
    let far = grid.get(0, 0).unwrap().value;
    assert!(near > far, "near {near} far {far}");
    assert!(far > 0.0);
    assert!(grid.cells().iter().all(|c| c.value <= 1.0));
}

#[test]
#[ignore = "needs a Vulkan device"]
fn staging_round_trip() {
    let mut context = common::create_context();
    let mut allocator = MemoryAllocator::new(&context).unwrap();

    for n in [0u32, 1, 400] {
        let cells: Vec<GridCell> = (0..n)
            .map(|i| GridCell {
                x: i as i32,
                y: -(i as i32),
                value: i as f32 * 0.25,
            })
            .collect();
        let buffer = DeviceBuffer::upload(&mut context, &mut allocator, "round trip", &cells).unwrap();
        assert_eq!(buffer.len(), n as usize);
        assert_eq!(buffer.byte_len(), size_of_cells(n as usize));
        // Empty uploads still bind one placeholder element.
        assert!(buffer.descriptor_info().range >= size_of_cells(1));

        let back = buffer.read_back(&mut context, &mut allocator).unwrap();
        assert_eq!(
            bytemuck::cast_slice::<GridCell, u8>(&back),
            bytemuck::cast_slice::<GridCell, u8>(&cells)
        );
        buffer.destroy(&mut allocator);
    }

    allocator.destroy();
    context.destroy();
}

fn size_of_cells(n: usize) -> u64 {
    (n * std::mem::size_of::<GridCell>()) as u64
}

#[test]
#[ignore = "needs a Vulkan device"]
fn scene_buffers_keep_slot_order() {
    let mut context = common::create_context();
    let mut allocator = MemoryAllocator::new(&context).unwrap();

    let mut scene = Scene::with_grid(Grid::new(4, 4, 0.0));
    scene.circles.push(Circle::new(1.0, 1.0, 1.0));
    let buffers = SceneBufferSet::upload(&mut context, &mut allocator, &scene).unwrap();
    let infos = buffers.descriptor_infos();
    assert_eq!(infos[0].buffer, buffers.grid.buffer());
    assert_eq!(infos[1].buffer, buffers.rectangles.buffer());
    assert_eq!(infos[2].buffer, buffers.circles.buffer());
    assert_eq!(infos[3].buffer, buffers.lights.buffer());
    assert_eq!(buffers.cell_count(), 16);
    assert!(buffers.rectangles.is_empty());
    assert_eq!(buffers.circles.len(), 1);

    let cells = buffers.read_grid(&mut context, &mut allocator).unwrap();
    assert_eq!(cells, scene.grid.cells());

    buffers.destroy(&mut allocator);
    allocator.destroy();
    context.destroy();
}

#[test]
#[ignore = "needs a Vulkan device"]
fn empty_grid_is_rejected() {
    let mut context = common::create_context();
    let mut allocator = MemoryAllocator::new(&context).unwrap();
    let scene = Scene::with_grid(Grid::new(0, 0, 0.0));
    assert!(matches!(
        SceneBufferSet::upload(&mut context, &mut allocator, &scene),
        Err(GridlightError::Scene(_))
    ));
    allocator.destroy();
    context.destroy();
}

#[test]
#[ignore = "needs a Vulkan device"]
fn destroy_twice_then_dispatch() {
    let kernel = common::compile_wgsl(common::FILL_WGSL);
    let mut compute =
        GridCompute::new(&ContextConfig::default(), &Scene::default(), &kernel).unwrap();
    compute.destroy();
    assert!(compute.is_destroyed());
    compute.destroy();
    assert!(matches!(
        compute.dispatch([1, 1, 1]),
        Err(GridlightError::Destroyed)
    ));
    assert!(matches!(compute.read_grid(), Err(GridlightError::Destroyed)));
}

#[test]
#[ignore = "needs a Vulkan device"]
fn invalid_kernel_fails_setup() {
    let garbage = [0x0102_0304_u32; 16];
    assert!(matches!(
        GridCompute::new(&ContextConfig::default(), &Scene::default(), &garbage),
        Err(GridlightError::Vulkan(VulkanError::ShaderModuleInvalid(_)))
    ));
}

#[test]
#[ignore = "needs a Vulkan device"]
fn oversized_dispatch_is_refused() {
    let kernel = common::compile_wgsl(common::FILL_WGSL);
    let mut compute =
        GridCompute::new(&ContextConfig::default(), &Scene::default(), &kernel).unwrap();
    let limit = compute.context().limits().max_compute_work_group_count[0];
    if let Some(over) = limit.checked_add(1) {
        assert!(matches!(
            compute.dispatch([over, 1, 1]),
            Err(GridlightError::Vulkan(VulkanError::SubmissionFailed(_)))
        ));
    }
    compute.destroy();
}
