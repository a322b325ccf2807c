// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Config
//!
//! Everything `DeviceContext::create` needs to know up front.  There are no process-wide switches;
//! build one of these and pass it in.

use std::ffi::{CStr, CString};

/// The Khronos validation layer, the only layer requested by default.
pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Any non-empty value enables diagnostics in `ContextConfig::from_env`.
pub const VALIDATION_ENV: &str = "GRIDLIGHT_VALIDATION";

#[derive(bon::Builder, Debug, Clone)]
pub struct ContextConfig {
    /// Enable validation layers and install the debug messenger.
    #[builder(default)]
    pub enable_diagnostics: bool,

    /// Layers that must all be present when diagnostics are enabled.  Ignored otherwise.
    #[builder(default = vec![VALIDATION_LAYER.to_owned()])]
    pub required_layers: Vec<CString>,

    #[builder(default = c"gridlight".to_owned())]
    pub application_name: CString,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig::builder().build()
    }
}

impl ContextConfig {
    /// Defaults, with diagnostics switched on when `GRIDLIGHT_VALIDATION` is set and non-empty.
    pub fn from_env() -> Self {
        let enable_diagnostics = std::env::var(VALIDATION_ENV)
            .map(|v| !v.is_empty())
            .unwrap_or(false);
        ContextConfig::builder()
            .enable_diagnostics(enable_diagnostics)
            .build()
    }

    /// Layers to enable on the instance.  Empty unless diagnostics were requested.
    pub fn layers(&self) -> &[CString] {
        if self.enable_diagnostics {
            &self.required_layers
        } else {
            &[]
        }
    }
}
