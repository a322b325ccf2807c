// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gridlight composites rectangles, circles and lights onto a grid of cells with one Vulkan compute
//! dispatch.
//!
//! The scene lives on the host as plain `#[repr(C)]` structs (`scene`), is uploaded once into
//! device-local storage buffers (`buffers`), and is run through a single compute kernel by
//! `compute::GridCompute`.  What the kernel does to the grid is the kernel's business; this crate
//! only guarantees the buffers are where the kernel expects them and that the grid comes back.

pub mod buffers;
pub mod compute;
pub mod config;
pub mod scene;

pub use gridlight_assets as assets;
pub use gridlight_vulkan as vulkan;

pub mod prelude {
    pub use super::GridlightError;
    pub use gridlight_vulkan::prelude::*;
}

#[derive(thiserror::Error, Debug)]
pub enum GridlightError {
    #[error("Vulkan: {0}")]
    Vulkan(#[from] gridlight_vulkan::VulkanError),

    #[error("asset: {0}")]
    Asset(#[from] gridlight_assets::AssetError),

    #[error("scene config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("scene: {0}")]
    Scene(String),

    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("compute already torn down")]
    Destroyed,
}
