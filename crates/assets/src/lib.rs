// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Assets
//!
//! Compute kernels are produced by an external compiler and arrive here as SPIR-V files.  Scenes
//! are small TOML files.  Both are looked up by name through `AssetDirs`, or read directly from a
//! path when the caller already has one.

pub mod assets;
pub use assets::*;

use std::ffi::OsStr;

mod prelude {
    pub use super::AssetError;
    pub use super::AssetKind;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Kernel,
    Scene,
}

impl AssetKind {
    fn ext(&self) -> &'static OsStr {
        match self {
            AssetKind::Kernel => OsStr::new("spv"),
            AssetKind::Scene => OsStr::new("toml"),
        }
    }

    fn subdir(&self) -> &'static OsStr {
        match self {
            AssetKind::Kernel => OsStr::new("kernels"),
            AssetKind::Scene => OsStr::new("scenes"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("read failed: {:?}", .0)]
    ReadError(#[from] std::io::Error),
    #[error("file not found: {:?}", .0)]
    NotFound(String),
    #[error("load spirv failed: {:?}", .0)]
    InvalidKernel(String),
}
