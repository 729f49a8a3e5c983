/*
 * Native handle lifecycle: deriving creation parameters, creating, destroying and
 * recreating the handle, and the visibility operations built on top of them.
 *
 * The logical window outlives any number of handles. Everything the native side
 * needs (owner links, icons, menus, top-most, layering, show state) is reapplied
 * after each creation. Destruction may cascade natively to child and owned
 * windows; every handle reported gone is unregistered through
 * `on_native_destroyed`.
 */

use crate::app::{FormManager, HandleTarget};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::{CreateParams, ExtendedStyles, ShowCommand, WindowClass, WindowStyles};
use crate::types::{
    BorderStyle, DialogResult, NativeHandle, StartPosition, WindowId, WindowState,
};

impl FormManager {
    /*
     * Derives the declarative creation parameters from the current flags,
     * geometry and relationships. Does not touch the native side.
     */
    pub(crate) fn build_create_params(&self, window_id: WindowId) -> PlatformResult<CreateParams> {
        let form = self.form(window_id)?;
        let flags = &form.flags;
        let border = flags.border_style();
        let mut style = WindowStyles::CLIPCHILDREN | WindowStyles::CLIPSIBLINGS;
        let mut ex_style = ExtendedStyles::CONTROLPARENT;

        match border {
            BorderStyle::None | BorderStyle::FixedSingle => {}
            BorderStyle::Fixed3D => ex_style |= ExtendedStyles::CLIENTEDGE,
            BorderStyle::FixedDialog => ex_style |= ExtendedStyles::DLGMODALFRAME,
            BorderStyle::Sizable => style |= WindowStyles::THICKFRAME,
            BorderStyle::FixedToolWindow => ex_style |= ExtendedStyles::TOOLWINDOW,
            BorderStyle::SizableToolWindow => {
                style |= WindowStyles::THICKFRAME;
                ex_style |= ExtendedStyles::TOOLWINDOW;
            }
        }
        if border == BorderStyle::None {
            if !form.is_mdi_child() {
                style |= WindowStyles::POPUP;
            }
        } else if flags.control_box() || !form.title.is_empty() {
            style |= WindowStyles::CAPTION;
        } else {
            style |= WindowStyles::BORDER;
        }

        if flags.control_box() && border != BorderStyle::None {
            style |= WindowStyles::SYSMENU;
            if flags.minimize_box() {
                style |= WindowStyles::MINIMIZEBOX;
            }
            if flags.maximize_box() {
                style |= WindowStyles::MAXIMIZEBOX;
            }
            if flags.help_button() && !flags.minimize_box() && !flags.maximize_box() {
                ex_style |= ExtendedStyles::CONTEXTHELP;
            }
        }

        match form.window_state() {
            // MDI children are created normal and maximized afterwards.
            WindowState::Maximized if !form.is_mdi_child() => style |= WindowStyles::MAXIMIZE,
            WindowState::Minimized => style |= WindowStyles::MINIMIZE,
            _ => {}
        }
        if !form.enabled {
            style |= WindowStyles::DISABLED;
        }
        if form.is_mdi_child() {
            ex_style |= ExtendedStyles::MDICHILD;
        } else if flags.show_in_taskbar() {
            ex_style |= ExtendedStyles::APPWINDOW;
        }
        if flags.top_most() {
            ex_style |= ExtendedStyles::TOPMOST;
        }
        if flags.allow_transparency() && flags.layered() {
            ex_style |= ExtendedStyles::LAYERED;
        }
        if flags.right_to_left_layout() {
            ex_style |= ExtendedStyles::LAYOUTRTL | ExtendedStyles::NOINHERITLAYOUT;
        }

        let has_menu = form.menu.is_some() && !form.is_mdi_child();
        let frame = self.host.non_client_extent(style, ex_style, has_menu);
        let bounds = if form.window_state() == WindowState::Normal {
            form.bounds
        } else {
            form.restore.peek_restored(form.bounds, frame).unwrap_or(form.bounds)
        };

        let mut params = CreateParams::new(WindowClass::Form);
        params.caption = form.title.clone();
        params.style = style;
        params.ex_style = ex_style;
        match flags.start_position() {
            StartPosition::Manual => {
                params.x = Some(bounds.x);
                params.y = Some(bounds.y);
                params.width = Some(bounds.width);
                params.height = Some(bounds.height);
            }
            StartPosition::CenterScreen | StartPosition::CenterParent => {
                let area = match (flags.start_position(), form.owner) {
                    (StartPosition::CenterParent, Some(owner)) => self
                        .windows
                        .get(&owner)
                        .map(|owner| owner.bounds)
                        .unwrap_or_else(|| self.host.work_area()),
                    _ => self.host.work_area(),
                };
                let centered = area.center(bounds.size());
                params.x = Some(centered.x);
                params.y = Some(centered.y);
                params.width = Some(bounds.width);
                params.height = Some(bounds.height);
            }
            StartPosition::WindowsDefaultLocation => {
                params.width = Some(bounds.width);
                params.height = Some(bounds.height);
            }
            StartPosition::WindowsDefaultBounds => {}
        }

        params.parent = match (form.mdi_parent, form.owner) {
            (Some(container), _) => {
                let client = self
                    .windows
                    .get(&container)
                    .and_then(|container| container.mdi.as_ref())
                    .and_then(|mdi| mdi.client_handle);
                match client {
                    Some(client) => Some(client),
                    None => {
                        return Err(PlatformError::InvalidOperation(format!(
                            "MDI container {container:?} of {window_id:?} has no client area"
                        )));
                    }
                }
            }
            (None, Some(owner)) => self.windows.get(&owner).and_then(|owner| owner.handle),
            (None, None) => form.owner_proxy,
        };
        Ok(params)
    }

    /*
     * Creates the native handle if it does not exist yet. Fails with
     * `InvalidOperation` when called while the same window is already being
     * created.
     */
    pub fn create_handle(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (creating, handle, mdi_parent) = self.with_form_read(window_id, |form| {
            Ok((form.transient.creating_handle, form.handle, form.mdi_parent))
        })?;
        if creating {
            return Err(PlatformError::InvalidOperation(format!(
                "Handle creation for {window_id:?} is already in progress"
            )));
        }
        if handle.is_some() {
            return Ok(());
        }
        if let Some(container) = mdi_parent
            && self.handle(container)?.is_none()
        {
            self.create_handle(container)?;
        }

        self.form_mut(window_id)?.transient.creating_handle = true;
        let created = self.create_native_window(window_id);
        if let Some(form) = self.windows.get_mut(&window_id) {
            form.transient.creating_handle = false;
        }
        let handle = created?;
        self.finish_handle_creation(window_id, handle)
    }

    fn create_native_window(&mut self, window_id: WindowId) -> PlatformResult<NativeHandle> {
        self.ensure_owner_proxy(window_id)?;
        let mut params = self.build_create_params(window_id)?;
        {
            let form = self.form_mut(window_id)?;
            form.transient.mdi_child_max_on_create =
                form.is_mdi_child() && form.window_state() == WindowState::Maximized;
        }
        if let Some(adapter) = self.adapters.get_mut(&window_id) {
            adapter.adjust_create_params(window_id, &mut params);
        }

        let handle = self.host.create_window(&params)?;
        self.handle_map.insert(handle, HandleTarget::Form(window_id));
        self.form_mut(window_id)?.handle = Some(handle);
        if !self.open_forms.contains(&window_id) {
            self.open_forms.push(window_id);
        }
        log::debug!(
            "Lifecycle: Created handle {handle:?} for {window_id:?} ({:?} / {:?})",
            params.style,
            params.ex_style
        );
        Ok(handle)
    }

    /*
     * Reapplies the logical state that the new handle does not carry by itself
     * and replays a deferred show request.
     */
    fn finish_handle_creation(
        &mut self,
        window_id: WindowId,
        handle: NativeHandle,
    ) -> PlatformResult<()> {
        let (state, pending_restore) = self.with_form_read(window_id, |form| {
            Ok((form.window_state(), form.restore.has_pending_restore()))
        })?;
        if state != WindowState::Normal && !pending_restore {
            let placement = self.host.placement(handle)?;
            let frame = self.frame_extent(window_id);
            let normal = placement.normal_bounds;
            let client = crate::types::Size::new(
                (normal.width - frame.width).max(0),
                (normal.height - frame.height).max(0),
            );
            self.form_mut(window_id)?.restore.snapshot(normal, client);
        }
        let current = self.host.window_bounds(handle)?;
        self.form_mut(window_id)?.bounds = current;

        let owned: Vec<NativeHandle> = self
            .form(window_id)?
            .owned
            .iter()
            .filter_map(|owned| self.windows.get(owned).and_then(|owned| owned.handle))
            .collect();
        for owned_handle in owned {
            self.host.set_owner(owned_handle, Some(handle))?;
        }

        self.apply_icons(window_id)?;

        let (is_container, has_menu, top_most) = self.with_form_read(window_id, |form| {
            Ok((form.is_mdi_container(), form.menu.is_some(), form.flags.top_most()))
        })?;
        if is_container {
            self.create_mdi_client(window_id)?;
        }
        if has_menu || is_container {
            self.update_menu_handles(window_id, false)?;
        }
        if top_most {
            self.host.set_top_most(handle, true)?;
        }
        self.apply_layered(window_id)?;

        let replay_show = {
            let form = self.form_mut(window_id)?;
            form.transient.mdi_child_max_on_create = false;
            std::mem::take(&mut form.transient.show_on_create)
        };
        if let Some(adapter) = self.adapters.get_mut(&window_id) {
            adapter.handle_created(window_id, handle);
        }

        if is_container {
            self.realize_visible_mdi_children(window_id)?;
        }
        if replay_show {
            self.show_native(window_id)?;
        }
        Ok(())
    }

    fn realize_visible_mdi_children(&mut self, container: WindowId) -> PlatformResult<()> {
        let (children, active_child) = self
            .form(container)?
            .mdi
            .as_ref()
            .map(|mdi| (mdi.children.clone(), mdi.active_child))
            .unwrap_or_default();
        for child in children {
            let pending = self.with_form_write(child, |form| {
                let pending =
                    form.visible && form.handle.is_none() && !form.transient.creating_handle;
                if pending {
                    form.transient.show_on_create = true;
                }
                Ok(pending)
            })?;
            if pending {
                self.create_handle(child)?;
            }
        }
        // Showing the children moves activation along; hand it back to the child
        // that was active before the container got its new handle.
        if let Some(active) = active_child
            && self.active_mdi_child(container)? != Some(active)
            && self.windows.get(&active).is_some_and(|form| form.visible && form.handle.is_some())
        {
            self.activate_mdi_child(container, active)?;
        }
        Ok(())
    }

    /*
     * A window kept out of the taskbar without an owner is natively owned by a
     * hidden proxy window.
     */
    fn ensure_owner_proxy(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (needed, existing) = self.with_form_read(window_id, |form| {
            Ok((
                !form.flags.show_in_taskbar() && form.owner.is_none() && !form.is_mdi_child(),
                form.owner_proxy,
            ))
        })?;
        if !needed || existing.is_some_and(|proxy| self.host.is_window(proxy)) {
            return Ok(());
        }
        let mut params = CreateParams::new(WindowClass::OwnerProxy);
        params.style = WindowStyles::POPUP;
        let proxy = self.host.create_window(&params)?;
        self.handle_map.insert(proxy, HandleTarget::OwnerProxy(window_id));
        self.form_mut(window_id)?.owner_proxy = Some(proxy);
        log::debug!("Lifecycle: Owner proxy {proxy:?} created for {window_id:?}");
        Ok(())
    }

    /*
     * Destroys the native handle (and whatever the platform destroys along with
     * it) and the owner proxy. The logical window stays registered.
     */
    pub fn destroy_handle(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let handle = self.handle(window_id)?;
        if let Some(handle) = handle {
            let destroyed = match self.host.destroy_window(handle) {
                Ok(destroyed) => destroyed,
                Err(e) => {
                    log::warn!("Lifecycle: Native destroy of {handle:?} failed: {e}");
                    vec![handle]
                }
            };
            for gone in destroyed {
                self.on_native_destroyed(gone);
            }
        }

        let proxy = self
            .windows
            .get_mut(&window_id)
            .and_then(|form| form.owner_proxy.take());
        if let Some(proxy) = proxy {
            self.handle_map.remove(&proxy);
            if self.host.is_window(proxy) {
                let destroyed = self.host.destroy_window(proxy).unwrap_or_default();
                for gone in destroyed {
                    self.on_native_destroyed(gone);
                }
            }
        }
        Ok(())
    }

    /*
     * Unregisters a handle the platform reports as gone. Idempotent: the handle
     * map entry is removed on first sight.
     */
    pub(crate) fn on_native_destroyed(&mut self, handle: NativeHandle) {
        let Some(target) = self.handle_map.remove(&handle) else {
            return;
        };
        match target {
            HandleTarget::Form(window_id) => {
                let dummy_menu = match self.windows.get_mut(&window_id) {
                    Some(form) if form.handle == Some(handle) => {
                        form.handle = None;
                        form.applied_menu = None;
                        form.active = false;
                        if form.modal
                            && form.dialog_result == DialogResult::None
                            && !form.transient.recreating_handle
                        {
                            form.dialog_result = DialogResult::Cancel;
                        }
                        form.dummy_menu.take()
                    }
                    _ => None,
                };
                if let Some(dummy) = dummy_menu {
                    self.host.destroy_menu(dummy);
                }
                self.open_forms.retain(|open| *open != window_id);
                if let Some(adapter) = self.adapters.get_mut(&window_id) {
                    adapter.handle_destroyed(window_id);
                }
                log::debug!("Lifecycle: Handle {handle:?} of {window_id:?} destroyed");
            }
            HandleTarget::MdiClient(container) => {
                if let Some(mdi) = self
                    .windows
                    .get_mut(&container)
                    .and_then(|form| form.mdi.as_mut())
                    && mdi.client_handle == Some(handle)
                {
                    mdi.client_handle = None;
                }
            }
            HandleTarget::OwnerProxy(window_id) => {
                if let Some(form) = self.windows.get_mut(&window_id)
                    && form.owner_proxy == Some(handle)
                {
                    form.owner_proxy = None;
                }
            }
        }
    }

    /*
     * Destroys and recreates the handle while keeping the show state, the
     * position and the windows this one owns. Owned windows are detached
     * natively first so the platform does not destroy them along with the old
     * handle.
     */
    pub fn recreate_handle(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (handle, creating, is_mdi_child, state, start_position, visible) =
            self.with_form_read(window_id, |form| {
                Ok((
                    form.handle,
                    form.transient.creating_handle,
                    form.is_mdi_child(),
                    form.window_state(),
                    form.flags.start_position(),
                    form.visible,
                ))
            })?;
        let Some(handle) = handle else {
            return Ok(());
        };
        if creating {
            return Err(PlatformError::InvalidOperation(format!(
                "Cannot recreate {window_id:?} while its handle is being created"
            )));
        }
        log::debug!("Lifecycle: Recreating handle of {window_id:?}");

        let placement = if !is_mdi_child && state != WindowState::Normal {
            self.host.placement(handle).ok()
        } else {
            None
        };
        // Every natively owned window, tracked or not, is detached before the
        // old handle goes.
        let detached = self.host.owned_windows(handle);
        for owned_handle in &detached {
            self.host.set_owner(*owned_handle, None)?;
        }
        {
            let form = self.form_mut(window_id)?;
            form.flags.set_start_position(StartPosition::Manual);
            form.transient.recreating_handle = true;
        }

        let result = self.destroy_handle(window_id).and_then(|()| {
            self.form_mut(window_id)?.transient.show_on_create = visible;
            self.create_handle(window_id)
        });

        if let Some(form) = self.windows.get_mut(&window_id) {
            form.flags.set_start_position(start_position);
            form.transient.recreating_handle = false;
            form.transient.show_on_create = false;
        }
        result?;

        // create_handle re-links the owned forms; windows the manager does not
        // track are re-linked here.
        if let Some(new_handle) = self.handle(window_id)? {
            for owned_handle in detached {
                if self.host.is_window(owned_handle) && self.host.owner(owned_handle).is_none() {
                    self.host.set_owner(owned_handle, Some(new_handle))?;
                }
            }
        }
        if let (Some(placement), Some(new_handle)) = (placement, self.handle(window_id)?) {
            self.host.set_placement(new_handle, &placement)?;
            self.update_window_state(window_id)?;
        }
        Ok(())
    }

    /// Realizes the handle and raises `load` once per realization cycle.
    pub fn create_control(&mut self, window_id: WindowId) -> PlatformResult<()> {
        if self.handle(window_id)?.is_none() {
            self.create_handle(window_id)?;
        }
        let first_load = self.with_form_write(window_id, |form| {
            Ok(!std::mem::replace(&mut form.transient.called_on_load, true))
        })?;
        if first_load {
            log::debug!("Lifecycle: Raising load for {window_id:?}");
            self.raise(window_id, |observers| &observers.load);
        }
        Ok(())
    }

    pub fn show(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (creating, handle) = self.with_form_write(window_id, |form| {
            form.visible = true;
            if form.transient.creating_handle {
                form.transient.show_on_create = true;
            }
            Ok((form.transient.creating_handle, form.handle))
        })?;
        if creating {
            log::debug!("Lifecycle: Show of {window_id:?} deferred until its handle exists");
            return Ok(());
        }
        if let Some(handle) = handle
            && self.host.is_visible(handle)
        {
            return Ok(());
        }

        self.create_control(window_id)?;
        // Load handlers may have hidden or disposed the window.
        let still_shown = self
            .windows
            .get(&window_id)
            .is_some_and(|form| form.visible && form.handle.is_some());
        if still_shown {
            self.show_native(window_id)?;
        }
        Ok(())
    }

    /*
     * Issues the show command matching the logical window state, then resyncs
     * state and activation.
     */
    pub(crate) fn show_native(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (handle, state, mdi_parent) = self.with_form_read(window_id, |form| {
            Ok((form.handle, form.window_state(), form.mdi_parent))
        })?;
        let Some(handle) = handle else {
            return Ok(());
        };
        let command = match state {
            WindowState::Normal => {
                let natively_normal = self
                    .host
                    .placement(handle)
                    .map(|placement| placement.show_command == ShowCommand::ShowNormal)
                    .unwrap_or(true);
                if natively_normal {
                    ShowCommand::Show
                } else {
                    ShowCommand::ShowNormal
                }
            }
            WindowState::Minimized => ShowCommand::ShowMinimized,
            WindowState::Maximized => ShowCommand::ShowMaximized,
        };
        self.host.show_window(handle, command)?;
        self.update_window_state(window_id)?;

        if let Some(container) = mdi_parent {
            self.activate_mdi_child(container, window_id)?;
        }
        self.notify_layout(window_id);

        let first_shown = self.with_form_write(window_id, |form| {
            Ok(!std::mem::replace(&mut form.transient.shown_raised, true))
        })?;
        if first_shown {
            self.raise(window_id, |observers| &observers.shown);
        }
        Ok(())
    }

    pub fn hide(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (handle, mdi_parent) = self.with_form_write(window_id, |form| {
            form.visible = false;
            form.transient.show_on_create = false;
            Ok((form.handle, form.mdi_parent))
        })?;
        if let Some(handle) = handle {
            self.host.show_window(handle, ShowCommand::Hide)?;
        }
        if let Some(container) = mdi_parent
            && self.active_mdi_child(container)? == Some(window_id)
        {
            self.activate_next_mdi_child(container, window_id)?;
        }
        Ok(())
    }

    pub fn set_visible(&mut self, window_id: WindowId, visible: bool) -> PlatformResult<()> {
        if visible {
            self.show(window_id)
        } else {
            self.hide(window_id)
        }
    }

    /*
     * Releases the window for good: owned windows and MDI children first, then
     * the relationships, the handle and the merged menu. Unknown ids are a no-op.
     */
    pub fn dispose(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let Some(form) = self.windows.get_mut(&window_id) else {
            log::debug!("Lifecycle: Dispose of unknown {window_id:?} ignored");
            return Ok(());
        };
        form.transient.closing = true;
        let owned = form.owned.clone();
        let children = form.mdi.as_ref().map(|mdi| mdi.children.clone()).unwrap_or_default();
        let owner = form.owner;
        let mdi_parent = form.mdi_parent;

        for dependent in owned.into_iter().chain(children) {
            if let Err(e) = self.dispose(dependent) {
                log::warn!("Lifecycle: Disposing {dependent:?} with {window_id:?} failed: {e}");
            }
        }
        if let Some(owner) = owner
            && let Some(owner) = self.windows.get_mut(&owner)
        {
            owner.owned.retain(|owned| *owned != window_id);
        }
        if let Err(e) = self.destroy_handle(window_id) {
            log::warn!("Lifecycle: Destroying handle of {window_id:?} failed: {e}");
        }

        if let Some(container) = mdi_parent {
            let was_active = match self.windows.get_mut(&container).and_then(|c| c.mdi.as_mut()) {
                Some(mdi) => {
                    mdi.children.retain(|child| *child != window_id);
                    mdi.active_child == Some(window_id)
                }
                None => false,
            };
            if was_active
                && let Err(e) = self.activate_next_mdi_child(container, window_id)
            {
                self.report_error(window_id, &e);
                if let Some(mdi) = self.windows.get_mut(&container).and_then(|c| c.mdi.as_mut())
                    && mdi.active_child == Some(window_id)
                {
                    mdi.active_child = None;
                }
            }
        }

        self.invalidate_merged_menu(window_id);
        self.adapters.remove(&window_id);
        self.open_forms.retain(|open| *open != window_id);
        self.windows.remove(&window_id);
        log::debug!("Lifecycle: {window_id:?} disposed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessHost, HeadlessShowState, HostCall};
    use crate::menu::MenuItem;
    use crate::native::{FormAdapter, NativeHost};
    use crate::types::{FormConfig, HostEnvironment, Rect};
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager_with_probe() -> (FormManager, HeadlessHost) {
        let host = HeadlessHost::new();
        let manager = FormManager::new(Box::new(host.clone()), HostEnvironment::default());
        (manager, host)
    }

    fn manual(bounds: Rect) -> FormConfig {
        FormConfig::default()
            .with_bounds(bounds)
            .with_start_position(StartPosition::Manual)
    }

    #[derive(Default)]
    struct RecordingAdapter {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl FormAdapter for RecordingAdapter {
        fn adjust_create_params(&mut self, _window_id: WindowId, params: &mut CreateParams) {
            params.caption.push_str(" [adapted]");
            self.log.borrow_mut().push("adjust".to_string());
        }

        fn handle_created(&mut self, _window_id: WindowId, _handle: NativeHandle) {
            self.log.borrow_mut().push("created".to_string());
        }

        fn handle_destroyed(&mut self, _window_id: WindowId) {
            self.log.borrow_mut().push("destroyed".to_string());
        }
    }

    #[test]
    fn border_and_box_flags_map_to_styles() {
        let (mut manager, _) = manager_with_probe();
        let mut config = FormConfig::default().with_border_style(BorderStyle::FixedToolWindow);
        config.maximize_box = false;
        config.top_most = true;
        config.right_to_left_layout = true;
        let form = manager.create_form(config);

        let params = manager.build_create_params(form).unwrap();

        assert!(params.style.contains(WindowStyles::CAPTION | WindowStyles::SYSMENU));
        assert!(params.style.contains(WindowStyles::MINIMIZEBOX));
        assert!(!params.style.contains(WindowStyles::MAXIMIZEBOX));
        assert!(!params.style.contains(WindowStyles::THICKFRAME));
        assert!(params.ex_style.contains(
            ExtendedStyles::TOOLWINDOW
                | ExtendedStyles::TOPMOST
                | ExtendedStyles::APPWINDOW
                | ExtendedStyles::LAYOUTRTL
                | ExtendedStyles::NOINHERITLAYOUT
        ));
    }

    #[test]
    fn start_positions_choose_coordinates() {
        let (mut manager, _) = manager_with_probe();
        let bounds = Rect::new(5, 6, 200, 100);
        let centered = manager.create_form(
            FormConfig::default()
                .with_bounds(bounds)
                .with_start_position(StartPosition::CenterScreen),
        );
        let defaulted = manager.create_form(
            FormConfig::default()
                .with_bounds(bounds)
                .with_start_position(StartPosition::WindowsDefaultBounds),
        );

        let params = manager.build_create_params(centered).unwrap();
        assert_eq!((params.x, params.y), (Some(860), Some(470)));
        assert_eq!((params.width, params.height), (Some(200), Some(100)));

        let params = manager.build_create_params(defaulted).unwrap();
        assert_eq!((params.x, params.y, params.width, params.height), (None, None, None, None));
    }

    #[test]
    fn adapter_hooks_run_around_creation() {
        let (mut manager, probe) = manager_with_probe();
        let form = manager.create_form(FormConfig::default().with_title("Main"));
        let adapter = RecordingAdapter::default();
        let log = adapter.log.clone();
        manager.set_adapter(form, Box::new(adapter)).unwrap();

        manager.create_handle(form).unwrap();
        let handle = manager.handle(form).unwrap().unwrap();
        assert_eq!(probe.window(handle).unwrap().caption, "Main [adapted]");
        manager.destroy_handle(form).unwrap();

        assert_eq!(*log.borrow(), vec!["adjust", "created", "destroyed"]);
        assert!(manager.open_forms().is_empty());
    }

    #[test]
    fn reentrant_creation_is_rejected() {
        let (mut manager, _) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        manager.form_mut(form).unwrap().transient.creating_handle = true;

        assert!(matches!(
            manager.create_handle(form),
            Err(PlatformError::InvalidOperation(_))
        ));
    }

    #[test]
    fn show_during_creation_is_replayed_afterwards() {
        let (mut manager, probe) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        manager.form_mut(form).unwrap().transient.creating_handle = true;
        manager.show(form).unwrap();
        assert!(manager.handle(form).unwrap().is_none());
        manager.form_mut(form).unwrap().transient.creating_handle = false;

        manager.create_handle(form).unwrap();

        let handle = manager.handle(form).unwrap().unwrap();
        assert!(probe.window(handle).unwrap().visible);
    }

    #[test]
    fn load_fires_once_and_shown_fires_on_first_show() {
        let (mut manager, _) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let load = log.clone();
        let shown = log.clone();
        manager.on_load(form, move |_, _| load.borrow_mut().push("load")).unwrap();
        manager.on_shown(form, move |_, _| shown.borrow_mut().push("shown")).unwrap();

        manager.show(form).unwrap();
        manager.hide(form).unwrap();
        manager.show(form).unwrap();

        assert_eq!(*log.borrow(), vec!["load", "shown"]);
    }

    #[test]
    fn hidden_taskbar_window_gets_owner_proxy() {
        let (mut manager, probe) = manager_with_probe();
        let mut config = FormConfig::default();
        config.show_in_taskbar = false;
        let form = manager.create_form(config);

        manager.create_handle(form).unwrap();
        let handle = manager.handle(form).unwrap().unwrap();
        let proxy = probe.window(handle).unwrap().owner.expect("proxy owner");
        assert_eq!(probe.window(proxy).unwrap().class, WindowClass::OwnerProxy);
        assert_eq!(manager.window_for_handle(proxy), Some(HandleTarget::OwnerProxy(form)));

        manager.destroy_handle(form).unwrap();
        assert!(!probe.is_window(proxy));
        assert_eq!(probe.live_windows(), 0);
    }

    #[test]
    fn recreation_keeps_owned_windows_alive_and_linked() {
        let (mut manager, probe) = manager_with_probe();
        let owner = manager.create_form(FormConfig::default());
        let owned = manager.create_form(FormConfig::default());
        manager.set_owner(owned, Some(owner)).unwrap();
        manager.show(owner).unwrap();
        manager.show(owned).unwrap();
        let owned_handle = manager.handle(owned).unwrap().unwrap();
        let old_owner_handle = manager.handle(owner).unwrap().unwrap();

        manager.set_show_in_taskbar(owner, false).unwrap();

        let new_owner_handle = manager.handle(owner).unwrap().unwrap();
        assert_ne!(new_owner_handle, old_owner_handle);
        assert!(probe.is_window(owned_handle));
        assert_eq!(probe.window(owned_handle).unwrap().owner, Some(new_owner_handle));
        assert!(probe.window(new_owner_handle).unwrap().visible);
        assert_eq!(
            manager.flags(owner).unwrap().start_position(),
            StartPosition::WindowsDefaultLocation
        );
    }

    #[test]
    fn recreation_relinks_natively_owned_windows_it_does_not_track() {
        let (mut manager, probe) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        manager.show(form).unwrap();
        let old_handle = manager.handle(form).unwrap().unwrap();
        let mut params = CreateParams::new(WindowClass::Form);
        params.parent = Some(old_handle);
        let tooltip = probe.clone().create_window(&params).unwrap();
        assert_eq!(probe.owner(tooltip), Some(old_handle));

        manager.recreate_handle(form).unwrap();

        let new_handle = manager.handle(form).unwrap().unwrap();
        assert_ne!(new_handle, old_handle);
        assert!(probe.is_window(tooltip));
        assert_eq!(probe.owner(tooltip), Some(new_handle));
        assert!(probe.calls().contains(&HostCall::SetOwner {
            handle: tooltip,
            owner: None
        }));
    }

    #[test]
    fn recreation_preserves_maximized_placement() {
        let (mut manager, probe) = manager_with_probe();
        let form = manager.create_form(manual(Rect::new(10, 20, 300, 200)));
        manager.show(form).unwrap();
        manager.set_window_state(form, WindowState::Maximized).unwrap();

        manager.recreate_handle(form).unwrap();
        let handle = manager.handle(form).unwrap().unwrap();
        assert_eq!(probe.window(handle).unwrap().show_state, HeadlessShowState::Maximized);
        assert_eq!(manager.flags(form).unwrap().window_state(), WindowState::Maximized);

        manager.set_window_state(form, WindowState::Normal).unwrap();
        assert_eq!(manager.bounds(form).unwrap(), Rect::new(10, 20, 300, 200));
    }

    #[test]
    fn destroying_a_modal_handle_cancels_pending_result() {
        let (mut manager, _) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        manager.create_handle(form).unwrap();
        manager.form_mut(form).unwrap().modal = true;

        manager.destroy_handle(form).unwrap();

        assert_eq!(manager.dialog_result(form).unwrap(), DialogResult::Cancel);
    }

    #[test]
    fn dispose_releases_owned_windows_and_handles() {
        let (mut manager, probe) = manager_with_probe();
        let owner = manager.create_form(FormConfig::default());
        let owned = manager.create_form(FormConfig::default());
        manager.set_owner(owned, Some(owner)).unwrap();
        manager.show(owner).unwrap();
        manager.show(owned).unwrap();

        manager.dispose(owner).unwrap();

        assert!(!manager.exists(owner));
        assert!(!manager.exists(owned));
        assert_eq!(probe.live_windows(), 0);
        assert!(manager.open_forms().is_empty());
        manager.dispose(owner).unwrap();
    }

    proptest! {
        #[test]
        fn destroy_then_create_preserves_logical_state(
            x in 0i32..400,
            y in 0i32..300,
            width in 200i32..700,
            height in 150i32..500,
            state in prop_oneof![
                Just(WindowState::Normal),
                Just(WindowState::Minimized),
                Just(WindowState::Maximized),
            ],
            with_owner in any::<bool>(),
            with_menu in any::<bool>(),
        ) {
            let (mut manager, _) = manager_with_probe();
            let owner = manager.create_form(FormConfig::default());
            let form = manager.create_form(manual(Rect::new(x, y, width, height)));
            if with_owner {
                manager.set_owner(form, Some(owner)).unwrap();
            }
            if with_menu {
                let menu = manager.create_menu(vec![MenuItem::new("&File")]);
                manager.set_menu(form, Some(menu)).unwrap();
            }
            manager.show(form).unwrap();
            manager.set_window_state(form, state).unwrap();

            let bounds = manager.bounds(form).unwrap();
            let owner_before = manager.owner(form).unwrap();
            let menu_before = manager.menu(form).unwrap();

            manager.destroy_handle(form).unwrap();
            manager.create_handle(form).unwrap();

            prop_assert_eq!(manager.bounds(form).unwrap(), bounds);
            prop_assert_eq!(manager.flags(form).unwrap().window_state(), state);
            prop_assert_eq!(manager.owner(form).unwrap(), owner_before);
            prop_assert_eq!(manager.menu(form).unwrap(), menu_before);
        }
    }

    #[test]
    fn mdi_client_is_created_for_containers() {
        let (mut manager, probe) = manager_with_probe();
        let container = manager.create_form(FormConfig::default());
        manager.set_is_mdi_container(container, true).unwrap();
        manager.create_handle(container).unwrap();

        let clients = probe.count_calls(|call| {
            matches!(call, HostCall::CreateWindow { class: WindowClass::MdiClient, .. })
        });
        assert_eq!(clients, 1);
    }
}
