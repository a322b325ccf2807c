// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Vulkan
//!
//! Compute-only Vulkan plumbing.  Nothing here presents to a surface.
//!
//! Core types, in the order they must be created (and the reverse order they must be destroyed):
//!
//! - `DeviceContext`
//!   * `Diagnostics` (optional)
//!   * `ComputeQueue`
//! - `MemoryAllocator`
//!   * `GpuBuffer`
//!   * `DeviceBuffer<T>`
//! - `BindingLayer`
//! - `ComputePipeline`
//! - `dispatch`
//!
//! This treatment does not use RAII for GPU objects.  Every type has a `destroy` that is safe to
//! call more than once, and the owner decides the order.

pub mod buffer;
pub mod config;
pub mod context;
pub mod descriptors;
pub mod diagnostics;
pub mod dispatch;
pub mod memory;
pub mod pipeline;
pub mod queue;

use ash::vk;

pub mod prelude {
    pub use super::VulkanError;
    pub use crate::config::ContextConfig;
    pub use crate::context::DeviceContext;
    pub use crate::memory::{MemoryAllocator, MemoryUsage};
}

#[derive(thiserror::Error, Debug)]
pub enum VulkanError {
    #[error("Vulkan loader: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("validation layer unavailable: {0}")]
    LayerUnavailable(String),

    #[error("no physical device exposes a compute queue")]
    NoCapableDevice,

    #[error("logical device creation failed: {0}")]
    DeviceCreationFailed(vk::Result),

    #[error("allocation failed: {0}")]
    AllocationFailed(String),

    #[error("transfer failed: {0}")]
    TransferFailed(String),

    #[error("invalid shader module: {0}")]
    ShaderModuleInvalid(String),

    #[error("compute pipeline creation failed: {0}")]
    PipelineCreationFailed(vk::Result),

    #[error("binding layout mismatch: {buffers} buffers for {slots} slots")]
    BindingLayoutMismatch { buffers: usize, slots: u32 },

    #[error("submission failed: {0}")]
    SubmissionFailed(vk::Result),

    #[error("Ash: {0}")]
    Ash(#[from] vk::Result),
}
