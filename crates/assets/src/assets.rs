// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Assets
//!
//! The assets module encapsulates how lookups can vary across platforms and between usage and
//! development.  `AssetDirs` is a set of realized directories where lookups may search.  Hold onto
//! it for doing many lookups at computer speed but re-initialize it for human-speed queries.
//!
//! ## Precedence Rules
//!
//! - On **debug builds**:
//!
//!   1. `GRIDLIGHT_ASSETS_DIR` enabling overrides for any purpose.
//!   2. The source tree's assets folder, below `CARGO_MANIFEST_DIR` as set by cargo.
//!
//! - On **release builds**:
//!
//!   1. `GRIDLIGHT_ASSETS_DIR`
//!   2. The user's local data directory
//!   3. The system data directory as a backup.
//!
//! When set, `GRIDLIGHT_ASSETS_DIR` should point directly to an assets root i.e. a folder containing
//! a kernels directory.

use std::path::{Path, PathBuf};

use crate::prelude::*;

pub const ASSETS_ENV: &str = "GRIDLIGHT_ASSETS_DIR";

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Pre-calculated and checked parent paths for reuse in asset look-ups.
pub struct AssetDirs {
    search_paths: Vec<PathBuf>,
}

impl AssetDirs {
    /// Checks asset search directories once on construction.
    pub fn new() -> Self {
        let mut search_paths = Vec::with_capacity(3);

        // Always highest priority: explicit override.
        if let Ok(raw) = std::env::var(ASSETS_ENV) {
            match as_assets_root(PathBuf::from(&raw)) {
                Some(path) => search_paths.push(path),
                None => tracing::warn!("invalid {ASSETS_ENV} (path not found): {raw}"),
            }
        }

        if cfg!(debug_assertions) {
            std::env::var("CARGO_MANIFEST_DIR")
                .ok()
                .map(PathBuf::from)
                .and_then(with_assets_subdir)
                .into_iter()
                .for_each(|p| search_paths.push(p));
        } else {
            dirs::data_local_dir()
                .map(|p| p.join("gridlight"))
                .and_then(with_assets_subdir)
                .into_iter()
                .for_each(|p| search_paths.push(p));

            dirs::data_dir()
                .map(|p| p.join("gridlight"))
                .and_then(with_assets_subdir)
                .into_iter()
                .for_each(|p| search_paths.push(p));
        }

        AssetDirs { search_paths }
    }

    /// Search only `roots`, ignoring the environment.
    pub fn with_roots<I: IntoIterator<Item = PathBuf>>(roots: I) -> Self {
        AssetDirs {
            search_paths: roots.into_iter().filter_map(as_assets_root).collect(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// First existing `<root>/<kind subdir>/<name>.<kind ext>`.
    pub fn find(&self, name: &str, kind: AssetKind) -> Option<PathBuf> {
        let mut file = PathBuf::from(kind.subdir()).join(name);
        file.set_extension(kind.ext());

        let found = self
            .search_paths
            .iter()
            .map(|root| root.join(&file))
            .find(|candidate| candidate.exists());

        if found.is_none() {
            tracing::warn!("{kind:?} {name} not found");
            self.search_paths.iter().for_each(|root| {
                tracing::debug!("  checked: {:?}", root.join(&file));
            });
        }
        found
    }

    pub fn find_bytes(&self, name: &str, kind: AssetKind) -> Result<Vec<u8>, AssetError> {
        self.find(name, kind)
            .ok_or(AssetError::NotFound(name.to_owned()))
            .and_then(|found| std::fs::read(found).map_err(|e| e.into()))
    }

    pub fn find_kernel(&self, name: &str) -> Result<Vec<u32>, AssetError> {
        let path = self
            .find(name, AssetKind::Kernel)
            .ok_or_else(|| AssetError::NotFound(name.to_owned()))?;
        read_kernel(&path)
    }
}

impl Default for AssetDirs {
    fn default() -> Self {
        Self::new()
    }
}

fn as_assets_root(p: PathBuf) -> Option<PathBuf> {
    p.canonicalize().ok().filter(|p| p.is_dir())
}

// Treat the given path as a parent containing an `assets/` subdir.
fn with_assets_subdir(p: PathBuf) -> Option<PathBuf> {
    as_assets_root(p.join("assets"))
}

/// Read a whole SPIR-V file into words.
pub fn read_kernel(path: &Path) -> Result<Vec<u32>, AssetError> {
    let bytes = std::fs::read(path)?;
    tracing::debug!(?path, bytes = bytes.len(), "read kernel");
    spirv_words(&bytes)
}

/// Decode SPIR-V bytes in whichever byte order the magic number says they were written.
pub fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>, AssetError> {
    if bytes.len() % size_of::<u32>() != 0 {
        return Err(AssetError::InvalidKernel(format!(
            "SPIR-V length not multiple of 4: {} bytes",
            bytes.len()
        )));
    }
    if bytes.is_empty() {
        return Err(AssetError::InvalidKernel("empty file".to_owned()));
    }

    let words = bytes
        .chunks_exact(size_of::<u32>())
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]));

    match words.clone().next() {
        Some(SPIRV_MAGIC) => Ok(words.collect()),
        Some(m) if m.swap_bytes() == SPIRV_MAGIC => Ok(words.map(u32::swap_bytes).collect()),
        Some(m) => Err(AssetError::InvalidKernel(format!(
            "bad magic number {m:#010x}"
        ))),
        None => Err(AssetError::InvalidKernel("empty file".to_owned())),
    }
}
