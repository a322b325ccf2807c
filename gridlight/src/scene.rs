// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Scene
//!
//! Host-side primitives.  Each struct is laid out exactly as the kernel sees it in a std430
//! storage buffer, so the bytes can be copied over without translation.  If a field is added here,
//! the kernels must change with it; the layout tests below are the tripwire.
//!
//! | slot | kernel type                         | host type     | stride |
//! |------|-------------------------------------|---------------|--------|
//! | 0    | `struct { int x; int y; float v; }` | `GridCell`    | 12     |
//! | 1    | `vec4`                              | `Rectangle`   | 16     |
//! | 2    | `vec3`                              | `Circle`      | 16     |
//! | 3    | `vec4`                              | `LightSource` | 16     |

use bytemuck::{Pod, Zeroable};

pub const DEFAULT_GRID_WIDTH: u32 = 20;
pub const DEFAULT_GRID_HEIGHT: u32 = 20;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
    pub value: f32,
}

/// `bounds` is `(x, y, width, height)` with `(x, y)` the minimum corner.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Rectangle {
    pub bounds: [f32; 4],
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Rectangle {
            bounds: [x, y, width, height],
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        let [x, y, w, h] = self.bounds;
        px >= x && px < x + w && py >= y && py < y + h
    }
}

/// `center_radius` is `(cx, cy, radius)`.  A std430 `vec3` array element occupies 16 bytes, hence
/// the pad.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Circle {
    pub center_radius: [f32; 3],
    _pad: f32,
}

impl Circle {
    pub fn new(cx: f32, cy: f32, radius: f32) -> Self {
        Circle {
            center_radius: [cx, cy, radius],
            _pad: 0.0,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        let [cx, cy, r] = self.center_radius;
        let (dx, dy) = (px - cx, py - cy);
        dx * dx + dy * dy < r * r
    }
}

/// `data` is `(x, y, z, intensity)`.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LightSource {
    pub data: [f32; 4],
}

impl LightSource {
    pub fn new(x: f32, y: f32, z: f32, intensity: f32) -> Self {
        LightSource {
            data: [x, y, z, intensity],
        }
    }
}

/// Row-major cells, fixed at creation.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: u32,
    height: u32,
    cells: Vec<GridCell>,
}

impl Grid {
    /// Every cell knows its own coordinates and starts at `initial_value`.
    pub fn new(width: u32, height: u32, initial_value: f32) -> Self {
        let cells = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| GridCell {
                    x: x as i32,
                    y: y as i32,
                    value: initial_value,
                })
            })
            .collect();
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Rebuild a grid from cells read back off the device.
    pub fn from_cells(width: u32, height: u32, cells: Vec<GridCell>) -> Option<Self> {
        (cells.len() == (width as usize) * (height as usize)).then_some(Grid {
            width,
            height,
            cells,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub fn get(&self, x: u32, y: u32) -> Option<&GridCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(cell_index(self.width, x, y))
    }
}

/// Row-major index, in `usize` so wide grids do not wrap.
fn cell_index(width: u32, x: u32, y: u32) -> usize {
    y as usize * width as usize + x as usize
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new(DEFAULT_GRID_WIDTH, DEFAULT_GRID_HEIGHT, 0.0)
    }
}

/// Everything uploaded for one run.  Only the grid is mandatory.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub grid: Grid,
    pub rectangles: Vec<Rectangle>,
    pub circles: Vec<Circle>,
    pub lights: Vec<LightSource>,
}

impl Scene {
    pub fn with_grid(grid: Grid) -> Self {
        Scene {
            grid,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod test {
    use std::mem::{align_of, offset_of, size_of};

    use super::*;

    #[test]
    fn grid_cell_layout() {
        assert_eq!(size_of::<GridCell>(), 12);
        assert_eq!(align_of::<GridCell>(), 4);
        assert_eq!(offset_of!(GridCell, x), 0);
        assert_eq!(offset_of!(GridCell, y), 4);
        assert_eq!(offset_of!(GridCell, value), 8);
    }

    #[test]
    fn shape_layouts_match_std430_strides() {
        assert_eq!(size_of::<Rectangle>(), 16);
        assert_eq!(size_of::<Circle>(), 16);
        assert_eq!(offset_of!(Circle, center_radius), 0);
        assert_eq!(size_of::<LightSource>(), 16);
        assert_eq!(size_of::<[Circle; 3]>(), 48);
    }

    #[test]
    fn cell_bytes_are_field_order() {
        let cell = GridCell {
            x: 3,
            y: -2,
            value: 1.5,
        };
        let bytes = bytemuck::bytes_of(&cell);
        assert_eq!(&bytes[0..4], &3i32.to_ne_bytes());
        assert_eq!(&bytes[4..8], &(-2i32).to_ne_bytes());
        assert_eq!(&bytes[8..12], &1.5f32.to_ne_bytes());
    }

    #[test]
    fn grid_is_row_major() {
        let grid = Grid::new(4, 3, 0.25);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.cells()[5], GridCell { x: 1, y: 1, value: 0.25 });
        assert_eq!(grid.get(3, 2), Some(&GridCell { x: 3, y: 2, value: 0.25 }));
        assert_eq!(grid.get(4, 0), None);
        assert_eq!(Grid::default().len(), 400);
    }

    #[test]
    fn from_cells_checks_dimensions() {
        let cells = Grid::new(2, 2, 0.0).cells().to_vec();
        assert!(Grid::from_cells(2, 2, cells.clone()).is_some());
        assert!(Grid::from_cells(3, 2, cells).is_none());
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn wide_grid_index_does_not_wrap() {
        // 100_000 * 100_000 is past u32::MAX
        assert_eq!(cell_index(100_000, 7, 100_000), 10_000_000_007);
    }

    #[test]
    fn shape_containment() {
        let rect = Rectangle::new(1.0, 1.0, 2.0, 3.0);
        assert!(rect.contains(1.0, 1.0));
        assert!(rect.contains(2.5, 3.5));
        assert!(!rect.contains(3.0, 1.0));

        let circle = Circle::new(0.0, 0.0, 2.0);
        assert!(circle.contains(1.9, 0.0));
        assert!(!circle.contains(2.0, 0.0));
        assert!(!circle.contains(1.5, 1.5));
        assert!(!Circle::new(0.0, 0.0, 0.0).contains(0.0, 0.0));
    }
}
