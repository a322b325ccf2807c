// Copyright 2026 The Gridlight Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Diagnostics
//!
//! Validation layers and the debug-utils messenger.  Purely observational.  The callback never asks
//! the driver to abort the call that produced a message.
//!
//! The `EXT_debug_utils` entry points are resolved exactly once, when `Diagnostics::new` builds the
//! loader.  Without diagnostics there is no loader at all, just `None` on the context.

use std::ffi::{c_void, CStr, CString};

use ash::vk;

use crate::prelude::*;

pub struct Diagnostics {
    loader: ash::ext::debug_utils::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl Diagnostics {
    /// Install the messenger on a freshly created instance.
    pub fn new(entry: &ash::Entry, instance: &ash::Instance) -> Result<Self, VulkanError> {
        let loader = ash::ext::debug_utils::Instance::new(entry, instance);
        let info = messenger_create_info();
        let messenger = unsafe { loader.create_debug_utils_messenger(&info, None)? };
        Ok(Self { loader, messenger })
    }

    pub fn destroy(&self) {
        unsafe {
            self.loader
                .destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}

/// Also chained into instance creation so messages from `vkCreateInstance` itself are seen.
pub fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
}

/// Fail with `LayerUnavailable` naming the first required layer missing from `available`.
pub fn check_layers(available: &[CString], required: &[CString]) -> Result<(), VulkanError> {
    match required.iter().find(|layer| !available.contains(layer)) {
        Some(missing) => Err(VulkanError::LayerUnavailable(
            missing.to_string_lossy().into_owned(),
        )),
        None => Ok(()),
    }
}

/// Names of the instance layers installed on this host.
pub fn available_layers(entry: &ash::Entry) -> Result<Vec<CString>, VulkanError> {
    let props = unsafe { entry.enumerate_instance_layer_properties()? };
    Ok(props
        .iter()
        .map(|p| unsafe { CStr::from_ptr(p.layer_name.as_ptr()) }.to_owned())
        .collect())
}

fn severity_label(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> &'static str {
    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => "error",
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => "warning",
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => "info",
        _ => "verbose",
    }
}

unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    category: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut c_void,
) -> vk::Bool32 {
    if data.is_null() {
        return vk::FALSE;
    }
    let p_message = unsafe { (*data).p_message };
    let message = if p_message.is_null() {
        std::borrow::Cow::Borrowed("<no message>")
    } else {
        unsafe { CStr::from_ptr(p_message) }.to_string_lossy()
    };
    let label = severity_label(severity);

    match severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            tracing::error!(?category, "{label}: {message}")
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            tracing::warn!(?category, "{label}: {message}")
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            tracing::info!(?category, "{label}: {message}")
        }
        _ => tracing::debug!(?category, "{label}: {message}"),
    }

    vk::FALSE
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn missing_layer_is_named() {
        let available = vec![c"VK_LAYER_MESA_device_select".to_owned()];
        let required = vec![crate::config::VALIDATION_LAYER.to_owned()];
        match check_layers(&available, &required) {
            Err(VulkanError::LayerUnavailable(name)) => {
                assert_eq!(name, "VK_LAYER_KHRONOS_validation")
            }
            other => panic!("expected LayerUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn present_layers_pass() {
        let available = vec![
            c"VK_LAYER_MESA_device_select".to_owned(),
            crate::config::VALIDATION_LAYER.to_owned(),
        ];
        let required = vec![crate::config::VALIDATION_LAYER.to_owned()];
        assert!(check_layers(&available, &required).is_ok());
        assert!(check_layers(&available, &[]).is_ok());
    }

    #[test]
    fn callback_never_aborts() {
        let message = c"vkCreateBuffer: size is zero";
        let data = vk::DebugUtilsMessengerCallbackDataEXT::default().message(message);
        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                &data,
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, vk::FALSE);

        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                std::ptr::null(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, vk::FALSE);
    }
}
