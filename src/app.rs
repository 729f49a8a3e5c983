/*
 * Owns every top-level window of the process and the native host they are
 * realized through.
 *
 * `FormManager` is the arena: windows live in a map keyed by a stable `WindowId`,
 * and a second map from native handle to `HandleTarget` is updated exactly when
 * native handles are created or destroyed. All public operations take a
 * `WindowId`; protocols that span several windows (close cascades, MDI activation,
 * menu merging, modal display) are implemented in the `handlers` modules as further
 * `impl FormManager` blocks.
 *
 * The manager is `!Send`: a window may only be manipulated from the
 * thread that created it, which is the thread that owns the manager.
 */

use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::{LogErrorSink, UnhandledErrorSink};
use crate::form_state::{FormFlags, TransientFlags};
use crate::menu::Menu;
use crate::native::{FormAdapter, NativeHost};
use crate::types::{
    AutoScaleMode, AutoSizeMode, BorderStyle, Color, DialogResult, FormConfig, HostEnvironment,
    IconHandle, MenuId, NativeHandle, Rect, Size, SizeGripStyle, StartPosition, WindowId,
};
use crate::window_common::FormWindowData;

/// What a registered native handle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleTarget {
    Form(WindowId),
    /// The child-hosting area of the given MDI container.
    MdiClient(WindowId),
    /// The hidden owner of the given window.
    OwnerProxy(WindowId),
}

pub struct FormManager {
    pub(crate) host: Box<dyn NativeHost>,
    pub(crate) environment: HostEnvironment,
    pub(crate) windows: HashMap<WindowId, FormWindowData>,
    pub(crate) handle_map: HashMap<NativeHandle, HandleTarget>,
    pub(crate) open_forms: Vec<WindowId>,
    pub(crate) menus: HashMap<MenuId, Menu>,
    pub(crate) adapters: HashMap<WindowId, Box<dyn FormAdapter>>,
    pub(crate) error_sink: Rc<dyn UnhandledErrorSink>,
    pub(crate) startup_state_applied: bool,
    pub(crate) default_icon: Option<IconHandle>,
    next_window_id: usize,
    next_menu_id: usize,
}

impl FormManager {
    pub fn new(host: Box<dyn NativeHost>, environment: HostEnvironment) -> Self {
        log::debug!("FormManager: Created with environment {environment:?}");
        Self {
            host,
            environment,
            windows: HashMap::new(),
            handle_map: HashMap::new(),
            open_forms: Vec::new(),
            menus: HashMap::new(),
            adapters: HashMap::new(),
            error_sink: Rc::new(LogErrorSink),
            startup_state_applied: false,
            default_icon: None,
            next_window_id: 1,
            next_menu_id: 1,
        }
    }

    /// Registers a new window. No native handle is created until first needed.
    pub fn create_form(&mut self, config: FormConfig) -> WindowId {
        let window_id = WindowId::new(self.next_window_id);
        self.next_window_id += 1;
        log::debug!(
            "FormManager: Registered {window_id:?} '{}' with {:?} border",
            config.title,
            config.border_style
        );
        self.windows
            .insert(window_id, FormWindowData::new(window_id, &config));
        window_id
    }

    pub(crate) fn allocate_menu_id(&mut self) -> MenuId {
        let menu_id = MenuId::new(self.next_menu_id);
        self.next_menu_id += 1;
        menu_id
    }

    pub fn set_adapter(
        &mut self,
        window_id: WindowId,
        adapter: Box<dyn FormAdapter>,
    ) -> PlatformResult<()> {
        self.ensure_exists(window_id)?;
        self.adapters.insert(window_id, adapter);
        Ok(())
    }

    pub fn set_error_sink(&mut self, sink: Rc<dyn UnhandledErrorSink>) {
        self.error_sink = sink;
    }

    pub fn environment(&self) -> &HostEnvironment {
        &self.environment
    }

    pub(crate) fn report_error(
        &self,
        window_id: WindowId,
        error: &(dyn std::error::Error + 'static),
    ) {
        self.error_sink.report(window_id, error);
    }

    pub fn exists(&self, window_id: WindowId) -> bool {
        self.windows.contains_key(&window_id)
    }

    pub(crate) fn ensure_exists(&self, window_id: WindowId) -> PlatformResult<()> {
        if self.exists(window_id) {
            Ok(())
        } else {
            Err(not_found(window_id))
        }
    }

    pub(crate) fn with_form_read<R>(
        &self,
        window_id: WindowId,
        f: impl FnOnce(&FormWindowData) -> PlatformResult<R>,
    ) -> PlatformResult<R> {
        match self.windows.get(&window_id) {
            Some(form) => f(form),
            None => {
                log::warn!("FormManager: WindowId {window_id:?} not found for read access.");
                Err(not_found(window_id))
            }
        }
    }

    pub(crate) fn with_form_write<R>(
        &mut self,
        window_id: WindowId,
        f: impl FnOnce(&mut FormWindowData) -> PlatformResult<R>,
    ) -> PlatformResult<R> {
        match self.windows.get_mut(&window_id) {
            Some(form) => f(form),
            None => {
                log::warn!("FormManager: WindowId {window_id:?} not found for write access.");
                Err(not_found(window_id))
            }
        }
    }

    pub(crate) fn form(&self, window_id: WindowId) -> PlatformResult<&FormWindowData> {
        self.windows.get(&window_id).ok_or_else(|| not_found(window_id))
    }

    pub(crate) fn form_mut(&mut self, window_id: WindowId) -> PlatformResult<&mut FormWindowData> {
        self.windows
            .get_mut(&window_id)
            .ok_or_else(|| not_found(window_id))
    }

    pub fn window_for_handle(&self, handle: NativeHandle) -> Option<HandleTarget> {
        self.handle_map.get(&handle).copied()
    }

    /// Windows currently owning a live native handle, in creation order.
    pub fn open_forms(&self) -> &[WindowId] {
        &self.open_forms
    }

    pub fn handle(&self, window_id: WindowId) -> PlatformResult<Option<NativeHandle>> {
        self.with_form_read(window_id, |form| Ok(form.handle))
    }

    pub fn flags(&self, window_id: WindowId) -> PlatformResult<&FormFlags> {
        Ok(&self.form(window_id)?.flags)
    }

    pub fn transient_flags(&self, window_id: WindowId) -> PlatformResult<&TransientFlags> {
        Ok(&self.form(window_id)?.transient)
    }

    pub fn title(&self, window_id: WindowId) -> PlatformResult<String> {
        self.with_form_read(window_id, |form| Ok(form.title.clone()))
    }

    pub fn set_title(&mut self, window_id: WindowId, title: &str) -> PlatformResult<()> {
        let handle = self.with_form_write(window_id, |form| {
            form.title = title.to_string();
            Ok(form.handle)
        })?;
        if let Some(handle) = handle {
            self.host.set_text(handle, title)?;
        }
        Ok(())
    }

    pub fn is_visible(&self, window_id: WindowId) -> PlatformResult<bool> {
        self.with_form_read(window_id, |form| Ok(form.visible))
    }

    pub fn is_enabled(&self, window_id: WindowId) -> PlatformResult<bool> {
        self.with_form_read(window_id, |form| Ok(form.enabled))
    }

    pub fn set_enabled(&mut self, window_id: WindowId, enabled: bool) -> PlatformResult<()> {
        let handle = self.with_form_write(window_id, |form| {
            form.enabled = enabled;
            Ok(form.handle)
        })?;
        if let Some(handle) = handle {
            self.host.set_enabled(handle, enabled)?;
        }
        Ok(())
    }

    pub fn is_active(&self, window_id: WindowId) -> PlatformResult<bool> {
        self.with_form_read(window_id, |form| Ok(form.active))
    }

    pub fn is_mdi_child_focusable(&self, window_id: WindowId) -> PlatformResult<bool> {
        self.with_form_read(window_id, |form| Ok(form.mdi_focusable))
    }

    pub fn dialog_result(&self, window_id: WindowId) -> PlatformResult<DialogResult> {
        self.with_form_read(window_id, |form| Ok(form.dialog_result))
    }

    /// Setting a result on a modal window ends its nested display loop.
    pub fn set_dialog_result(
        &mut self,
        window_id: WindowId,
        result: DialogResult,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.dialog_result = result;
            Ok(())
        })
    }

    pub fn set_accept_result(
        &mut self,
        window_id: WindowId,
        result: Option<DialogResult>,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.accept_result = result;
            Ok(())
        })
    }

    pub fn set_cancel_result(
        &mut self,
        window_id: WindowId,
        result: Option<DialogResult>,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.cancel_result = result;
            Ok(())
        })
    }

    /// While suspended, accept/cancel keys do not set a dialog result.
    pub fn set_button_invocation_suspended(
        &mut self,
        window_id: WindowId,
        suspended: bool,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.transient.button_invocation_suspended = suspended;
            Ok(())
        })
    }

    /*
     * Re-derives the native styles from the current flags and applies them to the
     * existing handle. Setters call this only when their value actually changed.
     */
    pub(crate) fn update_styles(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let Some(handle) = self.handle(window_id)? else {
            return Ok(());
        };
        let params = self.build_create_params(window_id)?;
        let mut style = params.style;
        if self.host.is_visible(handle) {
            style |= crate::native::WindowStyles::VISIBLE;
        }
        log::debug!("FormManager: Restyling {window_id:?} to {style:?} / {:?}", params.ex_style);
        self.host.apply_styles(handle, style, params.ex_style)?;
        self.apply_layered(window_id)
    }

    fn set_flag_and_restyle(
        &mut self,
        window_id: WindowId,
        set: impl FnOnce(&mut FormFlags) -> bool,
    ) -> PlatformResult<()> {
        let changed = self.with_form_write(window_id, |form| Ok(set(&mut form.flags)))?;
        if changed {
            self.update_styles(window_id)?;
        }
        Ok(())
    }

    fn set_flag_and_recreate(
        &mut self,
        window_id: WindowId,
        set: impl FnOnce(&mut FormFlags) -> bool,
    ) -> PlatformResult<()> {
        let changed = self.with_form_write(window_id, |form| Ok(set(&mut form.flags)))?;
        if changed {
            self.recreate_handle(window_id)?;
        }
        Ok(())
    }

    pub fn set_border_style(
        &mut self,
        window_id: WindowId,
        value: BorderStyle,
    ) -> PlatformResult<()> {
        self.set_flag_and_restyle(window_id, |flags| flags.set_border_style(value))
    }

    pub fn set_control_box(&mut self, window_id: WindowId, value: bool) -> PlatformResult<()> {
        self.set_flag_and_restyle(window_id, |flags| flags.set_control_box(value))
    }

    pub fn set_minimize_box(&mut self, window_id: WindowId, value: bool) -> PlatformResult<()> {
        self.set_flag_and_restyle(window_id, |flags| flags.set_minimize_box(value))
    }

    pub fn set_maximize_box(&mut self, window_id: WindowId, value: bool) -> PlatformResult<()> {
        self.set_flag_and_restyle(window_id, |flags| flags.set_maximize_box(value))
    }

    pub fn set_help_button(&mut self, window_id: WindowId, value: bool) -> PlatformResult<()> {
        self.set_flag_and_restyle(window_id, |flags| flags.set_help_button(value))
    }

    pub fn set_key_preview(&mut self, window_id: WindowId, value: bool) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.flags.set_key_preview(value);
            Ok(())
        })
    }

    /// Changing taskbar presence swaps the native owner, which needs a new handle.
    pub fn set_show_in_taskbar(&mut self, window_id: WindowId, value: bool) -> PlatformResult<()> {
        self.set_flag_and_recreate(window_id, |flags| flags.set_show_in_taskbar(value))
    }

    pub fn set_right_to_left_layout(
        &mut self,
        window_id: WindowId,
        value: bool,
    ) -> PlatformResult<()> {
        self.set_flag_and_recreate(window_id, |flags| flags.set_right_to_left_layout(value))
    }

    pub fn set_top_most(&mut self, window_id: WindowId, value: bool) -> PlatformResult<()> {
        let (changed, handle) =
            self.with_form_write(window_id, |form| {
                Ok((form.flags.set_top_most(value), form.handle))
            })?;
        if let (true, Some(handle)) = (changed, handle) {
            self.host.set_top_most(handle, value)?;
        }
        Ok(())
    }

    pub fn set_size_grip_style(
        &mut self,
        window_id: WindowId,
        value: SizeGripStyle,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.flags.set_size_grip_style(value);
            Ok(())
        })
    }

    /// Only consulted at the next handle creation.
    pub fn set_start_position(
        &mut self,
        window_id: WindowId,
        value: StartPosition,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.flags.set_start_position(value);
            Ok(())
        })
    }

    pub fn set_auto_scale_mode(
        &mut self,
        window_id: WindowId,
        value: AutoScaleMode,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.flags.set_auto_scale_mode(value);
            Ok(())
        })
    }

    pub fn set_auto_size(
        &mut self,
        window_id: WindowId,
        auto_size: bool,
        mode: AutoSizeMode,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.flags.set_auto_size(auto_size);
            form.flags.set_auto_size_mode(mode);
            Ok(())
        })
    }

    pub fn set_allow_transparency(
        &mut self,
        window_id: WindowId,
        value: bool,
    ) -> PlatformResult<()> {
        self.set_flag_and_restyle(window_id, |flags| flags.set_allow_transparency(value))
    }

    pub fn opacity(&self, window_id: WindowId) -> PlatformResult<f32> {
        self.with_form_read(window_id, |form| Ok(form.opacity))
    }

    /*
     * Opacity is clamped to 0.0..=1.0. Anything below fully opaque turns on
     * transparency and the layered style.
     */
    pub fn set_opacity(&mut self, window_id: WindowId, opacity: f32) -> PlatformResult<()> {
        if opacity.is_nan() {
            return Err(PlatformError::InvalidArgument(
                "Opacity must be a number".to_string(),
            ));
        }
        let opacity = opacity.clamp(0.0, 1.0);
        self.with_form_write(window_id, |form| {
            form.opacity = opacity;
            Ok(())
        })?;
        self.refresh_layered(window_id)
    }

    pub fn set_transparency_key(
        &mut self,
        window_id: WindowId,
        key: Option<Color>,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.transparency_key = key;
            Ok(())
        })?;
        self.refresh_layered(window_id)
    }

    fn refresh_layered(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let changed = self.with_form_write(window_id, |form| {
            let layered = form.opacity < 1.0 || form.transparency_key.is_some();
            let mut changed = false;
            if layered {
                changed |= form.flags.set_allow_transparency(true);
            }
            changed |= form.flags.set_layered(layered && form.flags.allow_transparency());
            Ok(changed)
        })?;
        if changed {
            self.update_styles(window_id)
        } else {
            self.apply_layered(window_id)
        }
    }

    pub(crate) fn apply_layered(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (handle, layered, opacity, key) = self.with_form_read(window_id, |form| {
            Ok((form.handle, form.flags.layered(), form.opacity, form.transparency_key))
        })?;
        if let (Some(handle), true) = (handle, layered) {
            self.host.set_layered_attributes(handle, opacity, key)?;
        }
        Ok(())
    }

    pub fn minimum_size(&self, window_id: WindowId) -> PlatformResult<Size> {
        self.with_form_read(window_id, |form| Ok(form.minimum_size))
    }

    pub fn maximum_size(&self, window_id: WindowId) -> PlatformResult<Size> {
        self.with_form_read(window_id, |form| Ok(form.maximum_size))
    }

    /// A zero size means "no constraint". Current bounds are re-clamped.
    pub fn set_minimum_size(&mut self, window_id: WindowId, size: Size) -> PlatformResult<()> {
        let bounds = self.with_form_write(window_id, |form| {
            form.minimum_size = size;
            if !form.maximum_size.is_empty() {
                form.maximum_size.width = form.maximum_size.width.max(size.width);
                form.maximum_size.height = form.maximum_size.height.max(size.height);
            }
            Ok(form.bounds)
        })?;
        self.set_bounds(window_id, bounds)
    }

    pub fn set_maximum_size(&mut self, window_id: WindowId, size: Size) -> PlatformResult<()> {
        let bounds = self.with_form_write(window_id, |form| {
            form.maximum_size = size;
            if !size.is_empty() {
                form.minimum_size.width = form.minimum_size.width.min(size.width);
                form.minimum_size.height = form.minimum_size.height.min(size.height);
            }
            Ok(form.bounds)
        })?;
        self.set_bounds(window_id, bounds)
    }

    pub fn maximized_bounds(&self, window_id: WindowId) -> PlatformResult<Option<Rect>> {
        self.with_form_read(window_id, |form| Ok(form.maximized_bounds))
    }

    pub fn set_maximized_bounds(
        &mut self,
        window_id: WindowId,
        bounds: Option<Rect>,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.maximized_bounds = bounds;
            Ok(())
        })
    }

    pub(crate) fn notify_layout(&mut self, window_id: WindowId) {
        let (handle, suspended, logical) = match self.windows.get(&window_id) {
            Some(form) => (
                form.handle,
                form.transient.layout_suspended_for_minimize,
                form.bounds.size(),
            ),
            None => return,
        };
        if suspended {
            return;
        }
        let client = match handle {
            Some(handle) => self.host.client_size(handle).unwrap_or(logical),
            None => logical,
        };
        if let Some(adapter) = self.adapters.get_mut(&window_id) {
            adapter.layout_requested(window_id, client);
        }
    }
}

pub(crate) fn not_found(window_id: WindowId) -> PlatformError {
    PlatformError::InvalidHandle(format!("WindowId {window_id:?} not found"))
}
