/*
 * Per-window data and the native event router.
 *
 * `FormWindowData` is the logical model of one top-level window: its flags,
 * geometry, relationships, menu and icon state, and observers. It survives any
 * number of native handle recreations.
 *
 * `FormManager::dispatch` is the single entry point for native event records. It
 * resolves the handle to its logical target and routes each opcode either to a
 * small handler in this module or to the protocol handlers in `handlers/`
 * (close, MDI activation, menu popups, window-state synchronization). The
 * returned `Reply` carries the value the native caller expects, or asks for
 * default processing.
 */

use crate::app::{FormManager, HandleTarget};
use crate::bounds::RestoreTracker;
use crate::events::{FormObservers, HelpRequestedArgs};
use crate::form_state::{FormFlags, TransientFlags};
use crate::handlers::close_handler::CloseRequest;
use crate::native::{
    ActivationState, DialogKey, HitTest, MinMaxInfo, NativeEvent, NativeMessage, Reply, SysCommand,
};
use crate::types::{
    CloseReason, Color, DialogResult, FormConfig, IconHandle, MenuHandle, MenuId, NativeHandle,
    Point, Rect, Size, SizeGripStyle, WindowId, WindowState,
};

/// State held only by MDI containers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MdiContainerData {
    pub(crate) client_handle: Option<NativeHandle>,
    pub(crate) children: Vec<WindowId>,
    pub(crate) active_child: Option<WindowId>,
}

pub(crate) struct FormWindowData {
    pub(crate) id: WindowId,
    pub(crate) title: String,
    pub(crate) handle: Option<NativeHandle>,
    pub(crate) flags: FormFlags,
    pub(crate) transient: TransientFlags,
    /// Last known window bounds. While not Normal these are the minimized or
    /// maximized bounds; the way back lives in `restore`.
    pub(crate) bounds: Rect,
    pub(crate) restore: RestoreTracker,
    pub(crate) minimum_size: Size,
    pub(crate) maximum_size: Size,
    pub(crate) maximized_bounds: Option<Rect>,
    pub(crate) opacity: f32,
    pub(crate) transparency_key: Option<Color>,
    pub(crate) visible: bool,
    pub(crate) enabled: bool,
    pub(crate) active: bool,
    pub(crate) mdi_focusable: bool,
    pub(crate) modal: bool,
    pub(crate) dialog_result: DialogResult,
    pub(crate) accept_result: Option<DialogResult>,
    pub(crate) cancel_result: Option<DialogResult>,
    pub(crate) owner: Option<WindowId>,
    pub(crate) owned: Vec<WindowId>,
    pub(crate) owner_proxy: Option<NativeHandle>,
    pub(crate) mdi_parent: Option<WindowId>,
    pub(crate) mdi: Option<MdiContainerData>,
    pub(crate) menu: Option<MenuId>,
    /// Parent items followed by this child's items; only set on MDI children.
    pub(crate) merged_menu: Option<MenuId>,
    pub(crate) applied_menu: Option<MenuHandle>,
    pub(crate) dummy_menu: Option<MenuHandle>,
    pub(crate) icon: Option<IconHandle>,
    pub(crate) small_icon: Option<IconHandle>,
    pub(crate) observers: FormObservers,
}

impl FormWindowData {
    pub(crate) fn new(id: WindowId, config: &FormConfig) -> Self {
        Self {
            id,
            title: config.title.clone(),
            handle: None,
            flags: FormFlags::from_config(config),
            transient: TransientFlags::default(),
            bounds: config.bounds,
            restore: RestoreTracker::default(),
            minimum_size: config.minimum_size,
            maximum_size: config.maximum_size,
            maximized_bounds: config.maximized_bounds,
            opacity: config.opacity.clamp(0.0, 1.0),
            transparency_key: config.transparency_key,
            visible: false,
            enabled: true,
            active: false,
            mdi_focusable: true,
            modal: false,
            dialog_result: DialogResult::None,
            accept_result: None,
            cancel_result: None,
            owner: None,
            owned: Vec::new(),
            owner_proxy: None,
            mdi_parent: None,
            mdi: None,
            menu: None,
            merged_menu: None,
            applied_menu: None,
            dummy_menu: None,
            icon: None,
            small_icon: None,
            observers: FormObservers::default(),
        }
    }

    pub(crate) fn is_mdi_container(&self) -> bool {
        self.mdi.is_some()
    }

    pub(crate) fn is_mdi_child(&self) -> bool {
        self.mdi_parent.is_some()
    }

    pub(crate) fn window_state(&self) -> WindowState {
        self.flags.window_state()
    }
}

impl FormManager {
    /*
     * Routes one native event record. Events for handles the manager does not know
     * are left to default processing.
     */
    pub fn dispatch(&mut self, event: &mut NativeEvent) -> Reply {
        let handle = event.handle;
        let Some(target) = self.handle_map.get(&handle).copied() else {
            log::trace!(
                "Dispatch: Ignoring {:?} for unregistered handle {handle:?}",
                event.message
            );
            return Reply::Default;
        };
        match target {
            HandleTarget::Form(window_id) => self.dispatch_form_message(window_id, handle, event),
            HandleTarget::MdiClient(_) | HandleTarget::OwnerProxy(_) => {
                if event.message == NativeMessage::Destroyed {
                    self.on_native_destroyed(handle);
                }
                Reply::Default
            }
        }
    }

    fn dispatch_form_message(
        &mut self,
        window_id: WindowId,
        handle: NativeHandle,
        event: &mut NativeEvent,
    ) -> Reply {
        log::trace!("Dispatch: {window_id:?} <- {:?}", event.message);
        match &mut event.message {
            NativeMessage::Activate { state } => self.handle_activate(window_id, *state),
            NativeMessage::Close => {
                self.handle_close_request(window_id, CloseRequest::Close);
                Reply::Value(0)
            }
            NativeMessage::QueryEndSession => {
                let cancelled = self.handle_close_request(window_id, CloseRequest::QueryEndSession);
                Reply::Value(if cancelled { 0 } else { 1 })
            }
            NativeMessage::EndSession { ending } => {
                self.handle_close_request(window_id, CloseRequest::EndSession { ending: *ending });
                Reply::Value(0)
            }
            NativeMessage::EnterSizeMove => {
                self.set_in_modal_size_loop(window_id, true);
                self.raise(window_id, |observers| &observers.resize_begin);
                Reply::Default
            }
            NativeMessage::ExitSizeMove => {
                self.set_in_modal_size_loop(window_id, false);
                self.raise(window_id, |observers| &observers.resize_end);
                Reply::Default
            }
            NativeMessage::Created => self.handle_created(window_id),
            NativeMessage::EraseBackground => {
                self.sync_window_state(window_id);
                Reply::Default
            }
            NativeMessage::Size { .. } => {
                self.sync_window_state(window_id);
                self.notify_layout(window_id);
                Reply::Default
            }
            NativeMessage::Move => {
                self.sync_bounds_from_native(window_id);
                Reply::Default
            }
            NativeMessage::InitMenuPopup { menu } => self.handle_init_menu_popup(window_id, *menu),
            NativeMessage::UninitMenuPopup { menu } => {
                self.handle_uninit_menu_popup(window_id, *menu)
            }
            NativeMessage::MenuChar { ch } => self.handle_menu_char(window_id, *ch),
            NativeMessage::MenuCommand { action } => self.handle_menu_command(window_id, *action),
            NativeMessage::MdiActivate {
                deactivated,
                activated,
            } => self.handle_mdi_activate(window_id, handle, *deactivated, *activated),
            NativeMessage::GetMinMaxInfo(info) => self.handle_get_min_max_info(window_id, info),
            NativeMessage::HitTest { point } => self.handle_hit_test(window_id, handle, *point),
            NativeMessage::SysCommand(command) => self.handle_sys_command(window_id, *command),
            NativeMessage::DialogKey(key) => self.handle_dialog_key(window_id, *key),
            NativeMessage::Destroyed => {
                self.on_native_destroyed(handle);
                Reply::Default
            }
        }
    }

    fn handle_activate(&mut self, window_id: WindowId, state: ActivationState) -> Reply {
        let active = state != ActivationState::Inactive;
        let changed = self
            .with_form_write(window_id, |form| {
                let changed = form.active != active;
                form.active = active;
                Ok(changed)
            })
            .unwrap_or(false);
        if changed {
            if active {
                self.raise(window_id, |observers| &observers.activated);
            } else {
                self.raise(window_id, |observers| &observers.deactivate);
            }
        }
        Reply::Default
    }

    fn set_in_modal_size_loop(&mut self, window_id: WindowId, value: bool) {
        if let Some(form) = self.windows.get_mut(&window_id) {
            form.transient.in_modal_size_loop = value;
        }
    }

    /*
     * Applies the show state requested by the launching process to the first
     * top-level window that gets created.
     */
    fn handle_created(&mut self, window_id: WindowId) -> Reply {
        if self.startup_state_applied {
            return Reply::Default;
        }
        let Some(state) = self.environment.startup_window_state else {
            return Reply::Default;
        };
        let is_mdi_child = self
            .with_form_read(window_id, |form| Ok(form.is_mdi_child()))
            .unwrap_or(true);
        if is_mdi_child {
            return Reply::Default;
        }
        self.startup_state_applied = true;
        log::debug!("Dispatch: Applying start-up window state {state:?} to {window_id:?}");
        if let Err(e) = self.set_window_state(window_id, state) {
            log::warn!("Dispatch: Could not apply start-up state to {window_id:?}: {e}");
        }
        Reply::Default
    }

    fn handle_get_min_max_info(&mut self, window_id: WindowId, info: &mut MinMaxInfo) -> Reply {
        let Ok(form) = self.form(window_id) else {
            return Reply::Default;
        };
        let mut written = false;
        if !form.minimum_size.is_empty() {
            info.min_track_size = Some(form.minimum_size);
            written = true;
        }
        if !form.maximum_size.is_empty() {
            info.max_track_size = Some(form.maximum_size);
            written = true;
        }
        if let Some(maximized) = form.maximized_bounds {
            info.max_position = Some(maximized.location());
            info.max_size = Some(maximized.size());
            written = true;
        }
        if written { Reply::Value(0) } else { Reply::Default }
    }

    /*
     * A size grip is drawn in the bottom client corner when requested (or
     * automatically for modal windows) on a sizable frame. Clicking it must
     * behave like the frame corner. Windows that grow and shrink with their
     * content never offer resize edges.
     */
    fn handle_hit_test(
        &mut self,
        window_id: WindowId,
        handle: NativeHandle,
        point: Point,
    ) -> Reply {
        let Ok(form) = self.form(window_id) else {
            return Reply::Default;
        };
        let grip_visible = match form.flags.size_grip_style() {
            SizeGripStyle::Show => true,
            SizeGripStyle::Hide => false,
            SizeGripStyle::Auto => form.modal,
        } && form.flags.border_style().is_sizable()
            && form.window_state() == WindowState::Normal;

        if grip_visible {
            let rtl = form.flags.right_to_left_layout();
            let bounds = form.bounds;
            let border = self.frame_extent(window_id).width / 2;
            let extent = self.environment.size_grip_extent;
            let top = bounds.bottom() - border - extent;
            let grip = if rtl {
                Rect::new(bounds.x + border, top, extent, extent)
            } else {
                Rect::new(bounds.right() - border - extent, top, extent, extent)
            };
            if grip.contains(point) {
                let corner = if rtl { HitTest::BottomLeft } else { HitTest::BottomRight };
                return Reply::Value(corner.code());
            }
        }

        let grows_and_shrinks = form.flags.grows_and_shrinks();
        let hit = self.host.default_hit_test(handle, point);
        if grows_and_shrinks && hit.is_resize_edge() {
            return Reply::Value(HitTest::Border.code());
        }
        Reply::Value(hit.code())
    }

    fn handle_sys_command(&mut self, window_id: WindowId, command: SysCommand) -> Reply {
        let Ok((is_mdi_child, control_box)) = self.with_form_read(window_id, |form| {
            Ok((form.is_mdi_child(), form.flags.control_box()))
        }) else {
            return Reply::Default;
        };
        let suppress_for_mdi_child = is_mdi_child && !control_box;
        match command {
            SysCommand::Close => {
                if let Some(form) = self.windows.get_mut(&window_id) {
                    form.transient.close_reason = CloseReason::UserClosing;
                }
                if suppress_for_mdi_child { Reply::Value(0) } else { Reply::Default }
            }
            SysCommand::KeyMenu => {
                if suppress_for_mdi_child { Reply::Value(0) } else { Reply::Default }
            }
            SysCommand::Size | SysCommand::Move => {
                self.set_in_modal_size_loop(window_id, true);
                Reply::Default
            }
            SysCommand::ContextHelp => {
                let mut args = HelpRequestedArgs::default();
                self.raise_with(window_id, &mut args, |observers| &observers.help_requested);
                if args.handled { Reply::Value(0) } else { Reply::Default }
            }
            SysCommand::Minimize
            | SysCommand::Maximize
            | SysCommand::Restore
            | SysCommand::Other(_) => Reply::Default,
        }
    }

    fn handle_dialog_key(&mut self, window_id: WindowId, key: DialogKey) -> Reply {
        let handled = self
            .with_form_write(window_id, |form| {
                if form.transient.button_invocation_suspended {
                    return Ok(false);
                }
                let result = match key {
                    DialogKey::Enter => form.accept_result,
                    DialogKey::Escape => form.cancel_result,
                };
                Ok(match result {
                    Some(result) => {
                        form.dialog_result = result;
                        true
                    }
                    None => false,
                })
            })
            .unwrap_or(false);
        if handled {
            log::debug!("Dispatch: {key:?} set the dialog result of {window_id:?}");
            Reply::Value(1)
        } else {
            Reply::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use crate::types::{AutoSizeMode, BorderStyle, HostEnvironment, StartPosition};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn realized_form(config: FormConfig) -> (FormManager, HeadlessHost, WindowId, NativeHandle) {
        let host = HeadlessHost::new();
        let mut manager = FormManager::new(Box::new(host.clone()), HostEnvironment::default());
        let form = manager.create_form(config);
        manager.create_control(form).unwrap();
        let handle = manager.handle(form).unwrap().unwrap();
        (manager, host, form, handle)
    }

    fn manual(bounds: Rect) -> FormConfig {
        FormConfig::default()
            .with_bounds(bounds)
            .with_start_position(StartPosition::Manual)
    }

    #[test]
    fn size_grip_reports_bottom_right_corner() {
        let mut config = manual(Rect::new(100, 100, 400, 300));
        config.size_grip_style = SizeGripStyle::Show;
        let (mut manager, _, _, handle) = realized_form(config);

        // Resize border is 8, grip extent 16: the grip spans x 476..492, y 376..392.
        let mut inside = NativeEvent::new(
            handle,
            NativeMessage::HitTest {
                point: Point::new(480, 380),
            },
        );
        assert_eq!(manager.dispatch(&mut inside), Reply::Value(HitTest::BottomRight.code()));

        let mut outside = NativeEvent::new(
            handle,
            NativeMessage::HitTest {
                point: Point::new(200, 200),
            },
        );
        assert_eq!(manager.dispatch(&mut outside), Reply::Value(HitTest::Client.code()));
    }

    #[test]
    fn grow_and_shrink_downgrades_resize_edges() {
        let mut config = manual(Rect::new(100, 100, 400, 300));
        config.auto_size = true;
        config.auto_size_mode = AutoSizeMode::GrowAndShrink;
        let (mut manager, _, _, handle) = realized_form(config);

        let mut edge = NativeEvent::new(
            handle,
            NativeMessage::HitTest {
                point: Point::new(102, 250),
            },
        );
        assert_eq!(manager.dispatch(&mut edge), Reply::Value(HitTest::Border.code()));
    }

    #[test]
    fn min_max_info_is_written_only_when_constrained() {
        let (mut manager, _, form, handle) = realized_form(manual(Rect::new(0, 0, 400, 300)));

        let mut event =
            NativeEvent::new(handle, NativeMessage::GetMinMaxInfo(MinMaxInfo::default()));
        assert_eq!(manager.dispatch(&mut event), Reply::Default);

        manager.set_minimum_size(form, Size::new(200, 100)).unwrap();
        manager
            .set_maximized_bounds(form, Some(Rect::new(10, 20, 800, 600)))
            .unwrap();
        let mut event =
            NativeEvent::new(handle, NativeMessage::GetMinMaxInfo(MinMaxInfo::default()));
        assert_eq!(manager.dispatch(&mut event), Reply::Value(0));
        let NativeMessage::GetMinMaxInfo(info) = event.message else {
            panic!("payload changed kind");
        };
        assert_eq!(info.min_track_size, Some(Size::new(200, 100)));
        assert_eq!(info.max_track_size, None);
        assert_eq!(info.max_position, Some(Point::new(10, 20)));
        assert_eq!(info.max_size, Some(Size::new(800, 600)));
    }

    #[test]
    fn size_move_loop_sets_flag_and_fires_notifications() {
        let (mut manager, _, form, handle) = realized_form(FormConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let begin = log.clone();
        let end = log.clone();
        manager
            .on_resize_begin(form, move |_, _| begin.borrow_mut().push("begin"))
            .unwrap();
        manager
            .on_resize_end(form, move |_, _| end.borrow_mut().push("end"))
            .unwrap();

        manager.dispatch(&mut NativeEvent::new(handle, NativeMessage::EnterSizeMove));
        assert!(manager.transient_flags(form).unwrap().is_in_modal_size_loop());
        manager.dispatch(&mut NativeEvent::new(handle, NativeMessage::ExitSizeMove));
        assert!(!manager.transient_flags(form).unwrap().is_in_modal_size_loop());
        assert_eq!(*log.borrow(), vec!["begin", "end"]);
    }

    #[test]
    fn activation_notifications_fire_on_change_only() {
        let (mut manager, _, form, handle) = realized_form(FormConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let activated = log.clone();
        let deactivated = log.clone();
        manager
            .on_activated(form, move |_, _| activated.borrow_mut().push("activated"))
            .unwrap();
        manager
            .on_deactivate(form, move |_, _| deactivated.borrow_mut().push("deactivate"))
            .unwrap();

        let active = NativeMessage::Activate { state: ActivationState::Active };
        manager.dispatch(&mut NativeEvent::new(handle, active.clone()));
        manager.dispatch(&mut NativeEvent::new(handle, active));
        manager.dispatch(&mut NativeEvent::new(
            handle,
            NativeMessage::Activate { state: ActivationState::Inactive },
        ));

        assert_eq!(*log.borrow(), vec!["activated", "deactivate"]);
        assert!(!manager.is_active(form).unwrap());
    }

    #[test]
    fn dialog_keys_map_to_accept_and_cancel_results() {
        let (mut manager, _, form, handle) = realized_form(FormConfig::default());
        manager.set_accept_result(form, Some(DialogResult::Ok)).unwrap();
        manager.set_cancel_result(form, Some(DialogResult::Cancel)).unwrap();

        manager.set_button_invocation_suspended(form, true).unwrap();
        let reply = manager.dispatch(&mut NativeEvent::new(
            handle,
            NativeMessage::DialogKey(DialogKey::Enter),
        ));
        assert_eq!(reply, Reply::Default);
        assert_eq!(manager.dialog_result(form).unwrap(), DialogResult::None);

        manager.set_button_invocation_suspended(form, false).unwrap();
        manager.dispatch(&mut NativeEvent::new(
            handle,
            NativeMessage::DialogKey(DialogKey::Escape),
        ));
        assert_eq!(manager.dialog_result(form).unwrap(), DialogResult::Cancel);
        manager.dispatch(&mut NativeEvent::new(handle, NativeMessage::DialogKey(DialogKey::Enter)));
        assert_eq!(manager.dialog_result(form).unwrap(), DialogResult::Ok);
    }

    #[test]
    fn system_close_on_mdi_child_without_control_box_is_suppressed() {
        let host = HeadlessHost::new();
        let mut manager = FormManager::new(Box::new(host.clone()), HostEnvironment::default());
        let container = manager.create_form(FormConfig::default());
        manager.set_is_mdi_container(container, true).unwrap();
        let mut child_config = FormConfig::default();
        child_config.control_box = false;
        let child = manager.create_form(child_config);
        manager.set_mdi_parent(child, Some(container)).unwrap();
        manager.show(container).unwrap();
        manager.show(child).unwrap();
        let handle = manager.handle(child).unwrap().unwrap();

        let reply = manager.dispatch(&mut NativeEvent::new(
            handle,
            NativeMessage::SysCommand(SysCommand::Close),
        ));
        assert_eq!(reply, Reply::Value(0));
        assert_eq!(
            manager.transient_flags(child).unwrap().close_reason(),
            CloseReason::UserClosing
        );
        let reply = manager.dispatch(&mut NativeEvent::new(
            handle,
            NativeMessage::SysCommand(SysCommand::KeyMenu),
        ));
        assert_eq!(reply, Reply::Value(0));
    }

    #[test]
    fn help_request_reply_follows_handled_flag() {
        let mut config = FormConfig::default().with_border_style(BorderStyle::FixedDialog);
        config.help_button = true;
        config.minimize_box = false;
        config.maximize_box = false;
        let (mut manager, _, form, handle) = realized_form(config);
        let help = NativeMessage::SysCommand(SysCommand::ContextHelp);

        assert_eq!(manager.dispatch(&mut NativeEvent::new(handle, help.clone())), Reply::Default);

        manager
            .on_help_requested(form, |_, _, args| args.handled = true)
            .unwrap();
        assert_eq!(manager.dispatch(&mut NativeEvent::new(handle, help)), Reply::Value(0));
    }

    #[test]
    fn startup_state_applies_to_first_created_window_only() {
        let host = HeadlessHost::new();
        let environment = HostEnvironment {
            startup_window_state: Some(WindowState::Maximized),
            ..HostEnvironment::default()
        };
        let mut manager = FormManager::new(Box::new(host.clone()), environment);
        let first = manager.create_form(FormConfig::default());
        let second = manager.create_form(FormConfig::default());
        manager.show(first).unwrap();
        manager.show(second).unwrap();

        for form in [first, second] {
            let handle = manager.handle(form).unwrap().unwrap();
            manager.dispatch(&mut NativeEvent::new(handle, NativeMessage::Created));
        }

        assert_eq!(manager.flags(first).unwrap().window_state(), WindowState::Maximized);
        assert_eq!(manager.flags(second).unwrap().window_state(), WindowState::Normal);
    }

    #[test]
    fn unregistered_handles_get_default_processing() {
        let (mut manager, _, _, _) = realized_form(FormConfig::default());
        let mut event = NativeEvent::new(NativeHandle(0xdead), NativeMessage::Close);
        assert_eq!(manager.dispatch(&mut event), Reply::Default);
    }
}
