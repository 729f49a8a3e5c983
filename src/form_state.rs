/*
 * Configuration and transient processing flags of a top-level window.
 *
 * `FormFlags` holds the persistent configuration (border, boxes, taskbar, top-most,
 * transparency, start position, window state...). `TransientFlags` holds the
 * short-lived processing state (closing, creating the handle, menu updates
 * suspended, inside a scale operation or an interactive size/move loop).
 *
 * Every setter reports whether the stored value actually changed; callers use that
 * to skip restyling when the requested value is already in place.
 */

use crate::types::{
    AutoScaleMode, AutoSizeMode, BorderStyle, CloseReason, FormConfig, SizeGripStyle,
    StartPosition, WindowState,
};

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormFlags {
    border_style: BorderStyle,
    control_box: bool,
    minimize_box: bool,
    maximize_box: bool,
    help_button: bool,
    key_preview: bool,
    show_in_taskbar: bool,
    show_icon: bool,
    top_most: bool,
    allow_transparency: bool,
    layered: bool,
    size_grip_style: SizeGripStyle,
    start_position: StartPosition,
    auto_scale_mode: AutoScaleMode,
    window_state: WindowState,
    right_to_left_layout: bool,
    auto_size: bool,
    auto_size_mode: AutoSizeMode,
}

impl Default for FormFlags {
    fn default() -> Self {
        Self::from_config(&FormConfig::default())
    }
}

impl FormFlags {
    pub(crate) fn from_config(config: &FormConfig) -> Self {
        let layered = config.opacity < 1.0 || config.transparency_key.is_some();
        Self {
            border_style: config.border_style,
            control_box: config.control_box,
            minimize_box: config.minimize_box,
            maximize_box: config.maximize_box,
            help_button: config.help_button,
            key_preview: config.key_preview,
            show_in_taskbar: config.show_in_taskbar,
            show_icon: config.show_icon,
            top_most: config.top_most,
            allow_transparency: layered,
            layered,
            size_grip_style: config.size_grip_style,
            start_position: config.start_position,
            auto_scale_mode: config.auto_scale_mode,
            window_state: config.window_state,
            right_to_left_layout: config.right_to_left_layout,
            auto_size: config.auto_size,
            auto_size_mode: config.auto_size_mode,
        }
    }

    pub fn border_style(&self) -> BorderStyle {
        self.border_style
    }

    pub(crate) fn set_border_style(&mut self, value: BorderStyle) -> bool {
        replace(&mut self.border_style, value)
    }

    pub fn control_box(&self) -> bool {
        self.control_box
    }

    pub(crate) fn set_control_box(&mut self, value: bool) -> bool {
        replace(&mut self.control_box, value)
    }

    pub fn minimize_box(&self) -> bool {
        self.minimize_box
    }

    pub(crate) fn set_minimize_box(&mut self, value: bool) -> bool {
        replace(&mut self.minimize_box, value)
    }

    pub fn maximize_box(&self) -> bool {
        self.maximize_box
    }

    pub(crate) fn set_maximize_box(&mut self, value: bool) -> bool {
        replace(&mut self.maximize_box, value)
    }

    pub fn help_button(&self) -> bool {
        self.help_button
    }

    pub(crate) fn set_help_button(&mut self, value: bool) -> bool {
        replace(&mut self.help_button, value)
    }

    pub fn key_preview(&self) -> bool {
        self.key_preview
    }

    pub(crate) fn set_key_preview(&mut self, value: bool) -> bool {
        replace(&mut self.key_preview, value)
    }

    pub fn show_in_taskbar(&self) -> bool {
        self.show_in_taskbar
    }

    pub(crate) fn set_show_in_taskbar(&mut self, value: bool) -> bool {
        replace(&mut self.show_in_taskbar, value)
    }

    pub fn show_icon(&self) -> bool {
        self.show_icon
    }

    pub(crate) fn set_show_icon(&mut self, value: bool) -> bool {
        replace(&mut self.show_icon, value)
    }

    pub fn top_most(&self) -> bool {
        self.top_most
    }

    pub(crate) fn set_top_most(&mut self, value: bool) -> bool {
        replace(&mut self.top_most, value)
    }

    pub fn allow_transparency(&self) -> bool {
        self.allow_transparency
    }

    pub(crate) fn set_allow_transparency(&mut self, value: bool) -> bool {
        let changed = replace(&mut self.allow_transparency, value);
        if !value {
            self.layered = false;
        }
        changed
    }

    pub fn layered(&self) -> bool {
        self.layered
    }

    pub(crate) fn set_layered(&mut self, value: bool) -> bool {
        replace(&mut self.layered, value)
    }

    pub fn size_grip_style(&self) -> SizeGripStyle {
        self.size_grip_style
    }

    pub(crate) fn set_size_grip_style(&mut self, value: SizeGripStyle) -> bool {
        replace(&mut self.size_grip_style, value)
    }

    pub fn start_position(&self) -> StartPosition {
        self.start_position
    }

    pub(crate) fn set_start_position(&mut self, value: StartPosition) -> bool {
        replace(&mut self.start_position, value)
    }

    pub fn auto_scale_mode(&self) -> AutoScaleMode {
        self.auto_scale_mode
    }

    pub(crate) fn set_auto_scale_mode(&mut self, value: AutoScaleMode) -> bool {
        replace(&mut self.auto_scale_mode, value)
    }

    pub fn window_state(&self) -> WindowState {
        self.window_state
    }

    pub(crate) fn set_window_state(&mut self, value: WindowState) -> bool {
        replace(&mut self.window_state, value)
    }

    pub fn right_to_left_layout(&self) -> bool {
        self.right_to_left_layout
    }

    pub(crate) fn set_right_to_left_layout(&mut self, value: bool) -> bool {
        replace(&mut self.right_to_left_layout, value)
    }

    pub fn auto_size(&self) -> bool {
        self.auto_size
    }

    pub(crate) fn set_auto_size(&mut self, value: bool) -> bool {
        replace(&mut self.auto_size, value)
    }

    pub fn auto_size_mode(&self) -> AutoSizeMode {
        self.auto_size_mode
    }

    pub(crate) fn set_auto_size_mode(&mut self, value: AutoSizeMode) -> bool {
        replace(&mut self.auto_size_mode, value)
    }

    /// True when the frame resizes on its own only by growing and shrinking to
    /// content, so user resize edges must be suppressed.
    pub fn grows_and_shrinks(&self) -> bool {
        self.auto_size && self.auto_size_mode == AutoSizeMode::GrowAndShrink
    }
}

/// Short-lived processing state; logically independent from `FormFlags`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransientFlags {
    pub(crate) closing: bool,
    pub(crate) creating_handle: bool,
    pub(crate) recreating_handle: bool,
    pub(crate) button_invocation_suspended: bool,
    pub(crate) menu_update_suspend_count: u32,
    pub(crate) menu_update_pending: bool,
    pub(crate) menu_update_force_redraw: bool,
    pub(crate) in_scale: bool,
    pub(crate) in_modal_size_loop: bool,
    pub(crate) called_closing: bool,
    pub(crate) called_on_load: bool,
    pub(crate) shown_raised: bool,
    pub(crate) show_on_create: bool,
    pub(crate) mdi_child_max_on_create: bool,
    pub(crate) layout_suspended_for_minimize: bool,
    pub(crate) close_reason: CloseReason,
}

impl Default for TransientFlags {
    fn default() -> Self {
        Self {
            closing: false,
            creating_handle: false,
            recreating_handle: false,
            button_invocation_suspended: false,
            menu_update_suspend_count: 0,
            menu_update_pending: false,
            menu_update_force_redraw: false,
            in_scale: false,
            in_modal_size_loop: false,
            called_closing: false,
            called_on_load: false,
            shown_raised: false,
            show_on_create: false,
            mdi_child_max_on_create: false,
            layout_suspended_for_minimize: false,
            close_reason: CloseReason::None,
        }
    }
}

impl TransientFlags {
    pub fn is_closing(&self) -> bool {
        self.closing
    }

    pub fn is_creating_handle(&self) -> bool {
        self.creating_handle
    }

    pub fn is_in_modal_size_loop(&self) -> bool {
        self.in_modal_size_loop
    }

    pub fn is_in_scale(&self) -> bool {
        self.in_scale
    }

    pub fn menu_updates_suspended(&self) -> bool {
        self.menu_update_suspend_count > 0
    }

    pub fn close_reason(&self) -> CloseReason {
        self.close_reason
    }
}
