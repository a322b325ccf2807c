// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use gridlight::prelude::*;

pub const FILL_WGSL: &str = include_str!("../../shaders/fill.wgsl");
pub const COMPOSITE_WGSL: &str = include_str!("../../shaders/composite.wgsl");

pub fn parse_wgsl(source: &str) -> naga::Module {
    naga::front::wgsl::parse_str(source).expect("wgsl parses")
}

/// WGSL to SPIR-V words, the same thing an offline kernel build produces.
pub fn compile_wgsl(source: &str) -> Vec<u32> {
    let module = parse_wgsl(source);
    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .expect("wgsl validates");
    naga::back::spv::write_vec(&module, &info, &naga::back::spv::Options::default(), None)
        .expect("spir-v written")
}

/// A context on the default config.  Device tests are `#[ignore]`d, run them with `--ignored`.
pub fn create_context() -> DeviceContext {
    DeviceContext::create(&ContextConfig::default()).expect("a Vulkan device")
}
