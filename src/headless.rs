/*
 * In-memory implementation of `NativeHost`.
 *
 * The headless host keeps a small model of native windows (styles, show state,
 * placement, native owner and parent links, menus, icons) and reproduces the
 * platform behaviours the lifecycle core depends on: destroying a window also
 * destroys its children and the windows it owns, maximizing remembers the normal
 * placement, and a scripted event queue feeds nested loops. Every call is recorded
 * so tests can assert on exactly what the core asked the platform to do.
 *
 * Cloning a `HeadlessHost` shares the underlying state, which lets a test keep a
 * probe while the `FormManager` owns the host.
 */

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::{
    CreateParams, ExtendedStyles, HitTest, NativeEvent, NativeHost, NativeMenuItem, ShowCommand,
    WindowClass, WindowPlacement, WindowStyles,
};
use crate::types::{Color, IconHandle, MenuHandle, NativeHandle, Point, Rect, Size};

const WORK_AREA: Rect = Rect::new(0, 0, 1920, 1040);
const MINIMIZED_BOUNDS: Rect = Rect::new(-32000, -32000, 160, 28);
const DEFAULT_SIZE: Size = Size::new(640, 480);
const DEFAULT_ICON: IconHandle = IconHandle(1);
const RESIZE_BORDER: i32 = 8;
const FIXED_BORDER: i32 = 3;
const CAPTION_HEIGHT: i32 = 23;
const TOOL_CAPTION_HEIGHT: i32 = 17;
const MENU_BAR_HEIGHT: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessShowState {
    Normal,
    Minimized,
    Maximized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessWindow {
    pub class: WindowClass,
    pub caption: String,
    pub style: WindowStyles,
    pub ex_style: ExtendedStyles,
    pub parent: Option<NativeHandle>,
    pub owner: Option<NativeHandle>,
    pub visible: bool,
    pub enabled: bool,
    pub show_state: HeadlessShowState,
    pub bounds: Rect,
    pub normal_bounds: Rect,
    pub menu: Option<MenuHandle>,
    pub top_most: bool,
    pub icons: (Option<IconHandle>, Option<IconHandle>),
    pub layered: Option<(f32, Option<Color>)>,
}

/// One recorded request made by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    CreateWindow {
        handle: NativeHandle,
        class: WindowClass,
        style: WindowStyles,
        ex_style: ExtendedStyles,
    },
    DestroyWindow(NativeHandle),
    SetText {
        handle: NativeHandle,
        text: String,
    },
    ApplyStyles(NativeHandle),
    SetOwner {
        handle: NativeHandle,
        owner: Option<NativeHandle>,
    },
    ShowWindow {
        handle: NativeHandle,
        command: ShowCommand,
    },
    SetPlacement(NativeHandle),
    SetBounds {
        handle: NativeHandle,
        bounds: Rect,
    },
    SetTopMost {
        handle: NativeHandle,
        top_most: bool,
    },
    SetLayered(NativeHandle),
    SetEnabled {
        handle: NativeHandle,
        enabled: bool,
    },
    SetIcons {
        handle: NativeHandle,
        big: Option<IconHandle>,
        small: Option<IconHandle>,
    },
    CreateMenu(MenuHandle),
    DestroyMenu(MenuHandle),
    SetMenu {
        handle: NativeHandle,
        menu: Option<MenuHandle>,
    },
    MdiSetMenu {
        client: NativeHandle,
        menu: MenuHandle,
    },
    DrawMenuBar(NativeHandle),
    Activate(NativeHandle),
    MdiActivate {
        client: NativeHandle,
        child: NativeHandle,
    },
    SetFocus(NativeHandle),
    ReleaseCapture(NativeHandle),
}

#[derive(Debug, Default)]
struct HeadlessState {
    next_handle: usize,
    next_menu: usize,
    windows: HashMap<NativeHandle, HeadlessWindow>,
    menus: HashMap<MenuHandle, Vec<NativeMenuItem>>,
    calls: Vec<HostCall>,
    events: VecDeque<NativeEvent>,
    active: Option<NativeHandle>,
    focus: Option<NativeHandle>,
    capture: Option<NativeHandle>,
    fail_small_icons: bool,
    default_icon: Option<IconHandle>,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    state: Rc<RefCell<HeadlessState>>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        let host = Self::default();
        {
            let mut state = host.state.borrow_mut();
            state.next_handle = 0x100;
            state.next_menu = 0x800;
        }
        host
    }

    pub fn push_event(&self, event: NativeEvent) {
        self.state.borrow_mut().events.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.state.borrow().events.len()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn count_calls(&self, predicate: impl Fn(&HostCall) -> bool) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    pub fn window(&self, handle: NativeHandle) -> Option<HeadlessWindow> {
        self.state.borrow().windows.get(&handle).cloned()
    }

    pub fn live_windows(&self) -> usize {
        self.state.borrow().windows.len()
    }

    pub fn menu_items(&self, menu: MenuHandle) -> Option<Vec<NativeMenuItem>> {
        self.state.borrow().menus.get(&menu).cloned()
    }

    pub fn focused(&self) -> Option<NativeHandle> {
        self.state.borrow().focus
    }

    pub fn set_capture(&self, handle: Option<NativeHandle>) {
        self.state.borrow_mut().capture = handle;
    }

    pub fn set_fail_small_icons(&self, fail: bool) {
        self.state.borrow_mut().fail_small_icons = fail;
    }

    pub fn set_default_icon(&self, icon: IconHandle) {
        self.state.borrow_mut().default_icon = Some(icon);
    }

    /// Changes the show state the way a user clicking a caption button would,
    /// without going through the core.
    pub fn simulate_user_show(&self, handle: NativeHandle, command: ShowCommand) {
        let mut state = self.state.borrow_mut();
        apply_show(&mut state, handle, command);
    }

    fn record(&self, call: HostCall) {
        log::trace!("HeadlessHost: {call:?}");
        self.state.borrow_mut().calls.push(call);
    }

    fn with_window<R>(
        &self,
        handle: NativeHandle,
        f: impl FnOnce(&HeadlessWindow) -> R,
    ) -> PlatformResult<R> {
        let state = self.state.borrow();
        state.windows.get(&handle).map(f).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("Headless window {handle:?} does not exist"))
        })
    }

    fn with_window_mut<R>(
        &self,
        handle: NativeHandle,
        f: impl FnOnce(&mut HeadlessWindow) -> R,
    ) -> PlatformResult<R> {
        let mut state = self.state.borrow_mut();
        state.windows.get_mut(&handle).map(f).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("Headless window {handle:?} does not exist"))
        })
    }
}

fn apply_show(state: &mut HeadlessState, handle: NativeHandle, command: ShowCommand) {
    let Some(window) = state.windows.get_mut(&handle) else {
        return;
    };
    match command {
        ShowCommand::Hide => window.visible = false,
        ShowCommand::Show | ShowCommand::ShowNoActivate => window.visible = true,
        ShowCommand::ShowNormal | ShowCommand::Restore => {
            window.visible = true;
            if window.show_state != HeadlessShowState::Normal {
                window.show_state = HeadlessShowState::Normal;
                window.bounds = window.normal_bounds;
            }
        }
        ShowCommand::ShowMinimized => {
            window.visible = true;
            if window.show_state == HeadlessShowState::Normal {
                window.normal_bounds = window.bounds;
            }
            window.show_state = HeadlessShowState::Minimized;
            window.bounds = MINIMIZED_BOUNDS;
        }
        ShowCommand::ShowMaximized => {
            window.visible = true;
            if window.show_state == HeadlessShowState::Normal {
                window.normal_bounds = window.bounds;
            }
            window.show_state = HeadlessShowState::Maximized;
            window.bounds = WORK_AREA;
        }
    }
    if !matches!(command, ShowCommand::Hide | ShowCommand::ShowNoActivate) {
        state.active = Some(handle);
    }
}

fn frame_extent(style: WindowStyles, ex_style: ExtendedStyles, has_menu: bool) -> Size {
    let border = if style.contains(WindowStyles::THICKFRAME) {
        RESIZE_BORDER
    } else if style.intersects(WindowStyles::BORDER | WindowStyles::DLGFRAME) {
        FIXED_BORDER
    } else {
        0
    };
    let caption = if style.contains(WindowStyles::CAPTION) {
        if ex_style.contains(ExtendedStyles::TOOLWINDOW) {
            TOOL_CAPTION_HEIGHT
        } else {
            CAPTION_HEIGHT
        }
    } else {
        0
    };
    let menu = if has_menu { MENU_BAR_HEIGHT } else { 0 };
    Size::new(border * 2, border * 2 + caption + menu)
}

impl NativeHost for HeadlessHost {
    fn create_window(&mut self, params: &CreateParams) -> PlatformResult<NativeHandle> {
        let handle = {
            let mut state = self.state.borrow_mut();
            let handle = NativeHandle(state.next_handle);
            state.next_handle += 1;
            if let Some(parent) = params.parent
                && !state.windows.contains_key(&parent)
            {
                return Err(PlatformError::WindowCreationFailed(format!(
                    "Parent {parent:?} does not exist"
                )));
            }
            let cascade = (state.windows.len() as i32 % 8) * 24;
            let bounds = Rect::new(
                params.x.unwrap_or(40 + cascade),
                params.y.unwrap_or(40 + cascade),
                params.width.unwrap_or(DEFAULT_SIZE.width),
                params.height.unwrap_or(DEFAULT_SIZE.height),
            );
            let is_child = params.style.contains(WindowStyles::CHILD)
                || params.ex_style.contains(ExtendedStyles::MDICHILD);
            let (parent, owner) = if is_child {
                (params.parent, None)
            } else {
                (None, params.parent)
            };
            let mut window = HeadlessWindow {
                class: params.class,
                caption: params.caption.clone(),
                style: params.style,
                ex_style: params.ex_style,
                parent,
                owner,
                visible: params.style.contains(WindowStyles::VISIBLE),
                enabled: !params.style.contains(WindowStyles::DISABLED),
                show_state: HeadlessShowState::Normal,
                bounds,
                normal_bounds: bounds,
                menu: None,
                top_most: params.ex_style.contains(ExtendedStyles::TOPMOST),
                icons: (None, None),
                layered: None,
            };
            if params.style.contains(WindowStyles::MAXIMIZE) {
                window.show_state = HeadlessShowState::Maximized;
                window.bounds = WORK_AREA;
            } else if params.style.contains(WindowStyles::MINIMIZE) {
                window.show_state = HeadlessShowState::Minimized;
                window.bounds = MINIMIZED_BOUNDS;
            }
            state.windows.insert(handle, window);
            handle
        };
        self.record(HostCall::CreateWindow {
            handle,
            class: params.class,
            style: params.style,
            ex_style: params.ex_style,
        });
        Ok(handle)
    }

    fn destroy_window(&mut self, handle: NativeHandle) -> PlatformResult<Vec<NativeHandle>> {
        let destroyed = {
            let mut state = self.state.borrow_mut();
            if !state.windows.contains_key(&handle) {
                return Err(PlatformError::InvalidHandle(format!(
                    "Headless window {handle:?} does not exist"
                )));
            }
            let mut destroyed = vec![handle];
            let mut index = 0;
            while index < destroyed.len() {
                let current = destroyed[index];
                let dependents: Vec<NativeHandle> = state
                    .windows
                    .iter()
                    .filter(|(candidate, window)| {
                        (window.parent == Some(current) || window.owner == Some(current))
                            && !destroyed.contains(candidate)
                    })
                    .map(|(candidate, _)| *candidate)
                    .collect();
                destroyed.extend(dependents);
                index += 1;
            }
            for gone in &destroyed {
                state.windows.remove(gone);
                if state.active == Some(*gone) {
                    state.active = None;
                }
                if state.focus == Some(*gone) {
                    state.focus = None;
                }
                if state.capture == Some(*gone) {
                    state.capture = None;
                }
            }
            destroyed
        };
        self.record(HostCall::DestroyWindow(handle));
        Ok(destroyed)
    }

    fn is_window(&self, handle: NativeHandle) -> bool {
        self.state.borrow().windows.contains_key(&handle)
    }

    fn set_text(&mut self, handle: NativeHandle, text: &str) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| window.caption = text.to_string())?;
        self.record(HostCall::SetText {
            handle,
            text: text.to_string(),
        });
        Ok(())
    }

    fn apply_styles(
        &mut self,
        handle: NativeHandle,
        style: WindowStyles,
        ex_style: ExtendedStyles,
    ) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| {
            window.style = style;
            window.ex_style = ex_style;
            window.top_most = ex_style.contains(ExtendedStyles::TOPMOST);
        })?;
        self.record(HostCall::ApplyStyles(handle));
        Ok(())
    }

    fn set_owner(
        &mut self,
        handle: NativeHandle,
        owner: Option<NativeHandle>,
    ) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| window.owner = owner)?;
        self.record(HostCall::SetOwner { handle, owner });
        Ok(())
    }

    fn owner(&self, handle: NativeHandle) -> Option<NativeHandle> {
        self.with_window(handle, |window| window.owner).ok().flatten()
    }

    fn owned_windows(&self, handle: NativeHandle) -> Vec<NativeHandle> {
        self.state
            .borrow()
            .windows
            .iter()
            .filter(|(_, window)| window.owner == Some(handle))
            .map(|(owned, _)| *owned)
            .collect()
    }

    fn show_window(&mut self, handle: NativeHandle, command: ShowCommand) -> PlatformResult<()> {
        self.with_window(handle, |_| ())?;
        apply_show(&mut self.state.borrow_mut(), handle, command);
        self.record(HostCall::ShowWindow { handle, command });
        Ok(())
    }

    fn is_visible(&self, handle: NativeHandle) -> bool {
        self.with_window(handle, |window| window.visible)
            .unwrap_or(false)
    }

    fn placement(&self, handle: NativeHandle) -> PlatformResult<WindowPlacement> {
        self.with_window(handle, |window| {
            let (show_command, normal_bounds) = match window.show_state {
                HeadlessShowState::Normal => (ShowCommand::ShowNormal, window.bounds),
                HeadlessShowState::Minimized => (ShowCommand::ShowMinimized, window.normal_bounds),
                HeadlessShowState::Maximized => (ShowCommand::ShowMaximized, window.normal_bounds),
            };
            WindowPlacement {
                show_command,
                normal_bounds,
            }
        })
    }

    fn set_placement(
        &mut self,
        handle: NativeHandle,
        placement: &WindowPlacement,
    ) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| {
            window.normal_bounds = placement.normal_bounds;
            match placement.show_command {
                ShowCommand::ShowMaximized => {
                    window.show_state = HeadlessShowState::Maximized;
                    window.bounds = WORK_AREA;
                }
                ShowCommand::ShowMinimized => {
                    window.show_state = HeadlessShowState::Minimized;
                    window.bounds = MINIMIZED_BOUNDS;
                }
                _ => {
                    window.show_state = HeadlessShowState::Normal;
                    window.bounds = placement.normal_bounds;
                }
            }
        })?;
        self.record(HostCall::SetPlacement(handle));
        Ok(())
    }

    fn window_bounds(&self, handle: NativeHandle) -> PlatformResult<Rect> {
        self.with_window(handle, |window| window.bounds)
    }

    fn set_window_bounds(&mut self, handle: NativeHandle, bounds: Rect) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| {
            if window.show_state == HeadlessShowState::Normal {
                window.bounds = bounds;
            }
            window.normal_bounds = bounds;
        })?;
        self.record(HostCall::SetBounds { handle, bounds });
        Ok(())
    }

    fn client_size(&self, handle: NativeHandle) -> PlatformResult<Size> {
        self.with_window(handle, |window| {
            let frame = frame_extent(window.style, window.ex_style, window.menu.is_some());
            Size::new(
                (window.bounds.width - frame.width).max(0),
                (window.bounds.height - frame.height).max(0),
            )
        })
    }

    fn non_client_extent(
        &self,
        style: WindowStyles,
        ex_style: ExtendedStyles,
        has_menu: bool,
    ) -> Size {
        frame_extent(style, ex_style, has_menu)
    }

    fn set_top_most(&mut self, handle: NativeHandle, top_most: bool) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| {
            window.top_most = top_most;
            window.ex_style.set(ExtendedStyles::TOPMOST, top_most);
        })?;
        self.record(HostCall::SetTopMost { handle, top_most });
        Ok(())
    }

    fn set_layered_attributes(
        &mut self,
        handle: NativeHandle,
        opacity: f32,
        key: Option<Color>,
    ) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| window.layered = Some((opacity, key)))?;
        self.record(HostCall::SetLayered(handle));
        Ok(())
    }

    fn set_enabled(&mut self, handle: NativeHandle, enabled: bool) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| window.enabled = enabled)?;
        self.record(HostCall::SetEnabled { handle, enabled });
        Ok(())
    }

    fn set_icons(
        &mut self,
        handle: NativeHandle,
        big: Option<IconHandle>,
        small: Option<IconHandle>,
    ) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| window.icons = (big, small))?;
        self.record(HostCall::SetIcons { handle, big, small });
        Ok(())
    }

    fn load_default_icon(&mut self) -> PlatformResult<IconHandle> {
        Ok(self.state.borrow().default_icon.unwrap_or(DEFAULT_ICON))
    }

    fn derive_small_icon(&mut self, icon: IconHandle) -> PlatformResult<IconHandle> {
        if self.state.borrow().fail_small_icons {
            return Err(PlatformError::OperationFailed(format!(
                "Cannot duplicate icon {icon:?} at small size"
            )));
        }
        Ok(IconHandle(icon.0 + 0x1000))
    }

    fn create_menu(&mut self, items: &[NativeMenuItem]) -> PlatformResult<MenuHandle> {
        let menu = {
            let mut state = self.state.borrow_mut();
            let menu = MenuHandle(state.next_menu);
            state.next_menu += 1;
            state.menus.insert(menu, items.to_vec());
            menu
        };
        self.record(HostCall::CreateMenu(menu));
        Ok(menu)
    }

    fn destroy_menu(&mut self, menu: MenuHandle) {
        self.state.borrow_mut().menus.remove(&menu);
        self.record(HostCall::DestroyMenu(menu));
    }

    fn set_menu(&mut self, handle: NativeHandle, menu: Option<MenuHandle>) -> PlatformResult<()> {
        self.with_window_mut(handle, |window| window.menu = menu)?;
        self.record(HostCall::SetMenu { handle, menu });
        Ok(())
    }

    fn mdi_set_menu(
        &mut self,
        client: NativeHandle,
        frame_menu: MenuHandle,
        _window_list: Option<MenuHandle>,
    ) -> PlatformResult<()> {
        let frame = self.with_window(client, |window| window.parent)?;
        if let Some(frame) = frame {
            self.with_window_mut(frame, |window| window.menu = Some(frame_menu))?;
        }
        self.record(HostCall::MdiSetMenu {
            client,
            menu: frame_menu,
        });
        Ok(())
    }

    fn draw_menu_bar(&mut self, handle: NativeHandle) -> PlatformResult<()> {
        self.with_window(handle, |_| ())?;
        self.record(HostCall::DrawMenuBar(handle));
        Ok(())
    }

    fn activate(&mut self, handle: NativeHandle) -> PlatformResult<()> {
        self.with_window(handle, |_| ())?;
        self.state.borrow_mut().active = Some(handle);
        self.record(HostCall::Activate(handle));
        Ok(())
    }

    fn active_window(&self) -> Option<NativeHandle> {
        self.state.borrow().active
    }

    fn mdi_activate(&mut self, client: NativeHandle, child: NativeHandle) -> PlatformResult<()> {
        self.with_window(child, |_| ())?;
        self.record(HostCall::MdiActivate { client, child });
        Ok(())
    }

    fn set_focus(&mut self, handle: NativeHandle) -> PlatformResult<()> {
        self.with_window(handle, |_| ())?;
        self.state.borrow_mut().focus = Some(handle);
        self.record(HostCall::SetFocus(handle));
        Ok(())
    }

    fn release_capture(&mut self) -> Option<NativeHandle> {
        let released = self.state.borrow_mut().capture.take();
        if let Some(handle) = released {
            self.record(HostCall::ReleaseCapture(handle));
        }
        released
    }

    fn work_area(&self) -> Rect {
        WORK_AREA
    }

    fn default_hit_test(&self, handle: NativeHandle, point: Point) -> HitTest {
        self.with_window(handle, |window| {
            let bounds = window.bounds;
            if !bounds.contains(point) {
                return HitTest::Nowhere;
            }
            if window.style.contains(WindowStyles::THICKFRAME) {
                let left = point.x < bounds.x + RESIZE_BORDER;
                let right = point.x >= bounds.right() - RESIZE_BORDER;
                let top = point.y < bounds.y + RESIZE_BORDER;
                let bottom = point.y >= bounds.bottom() - RESIZE_BORDER;
                match (left, right, top, bottom) {
                    (true, _, true, _) => return HitTest::TopLeft,
                    (_, true, true, _) => return HitTest::TopRight,
                    (true, _, _, true) => return HitTest::BottomLeft,
                    (_, true, _, true) => return HitTest::BottomRight,
                    (true, _, _, _) => return HitTest::Left,
                    (_, true, _, _) => return HitTest::Right,
                    (_, _, true, _) => return HitTest::Top,
                    (_, _, _, true) => return HitTest::Bottom,
                    _ => {}
                }
            }
            let frame = frame_extent(window.style, window.ex_style, false);
            if window.style.contains(WindowStyles::CAPTION)
                && point.y < bounds.y + frame.height - frame.width / 2
            {
                HitTest::Caption
            } else {
                HitTest::Client
            }
        })
        .unwrap_or(HitTest::Nowhere)
    }

    fn next_event(&mut self) -> Option<NativeEvent> {
        self.state.borrow_mut().events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn top_level(host: &mut HeadlessHost, owner: Option<NativeHandle>) -> NativeHandle {
        let mut params = CreateParams::new(WindowClass::Form);
        params.style = WindowStyles::CAPTION | WindowStyles::THICKFRAME;
        params.x = Some(10);
        params.y = Some(10);
        params.width = Some(300);
        params.height = Some(200);
        params.parent = owner;
        host.create_window(&params).expect("create")
    }

    #[test]
    fn destroying_an_owner_destroys_owned_windows() {
        let mut host = HeadlessHost::new();
        let owner = top_level(&mut host, None);
        let owned = top_level(&mut host, Some(owner));
        let unrelated = top_level(&mut host, None);

        let destroyed = host.destroy_window(owner).expect("destroy");

        assert!(destroyed.contains(&owner));
        assert!(destroyed.contains(&owned));
        assert!(host.is_window(unrelated));
        assert!(!host.is_window(owned));
    }

    #[test]
    fn maximize_then_restore_returns_to_normal_bounds() {
        let mut host = HeadlessHost::new();
        let handle = top_level(&mut host, None);

        host.show_window(handle, ShowCommand::ShowMaximized).unwrap();
        assert_eq!(host.window_bounds(handle).unwrap(), WORK_AREA);
        assert_eq!(
            host.placement(handle).unwrap().show_command,
            ShowCommand::ShowMaximized
        );

        host.show_window(handle, ShowCommand::Restore).unwrap();
        assert_eq!(
            host.window_bounds(handle).unwrap(),
            Rect::new(10, 10, 300, 200)
        );
    }

    #[test]
    fn client_size_excludes_frame() {
        let mut host = HeadlessHost::new();
        let handle = top_level(&mut host, None);
        let client = host.client_size(handle).unwrap();
        assert_eq!(client, Size::new(300 - 16, 200 - 16 - CAPTION_HEIGHT));
    }

    #[test]
    fn hit_test_reports_bottom_right_corner_on_sizable_frame() {
        let mut host = HeadlessHost::new();
        let handle = top_level(&mut host, None);
        assert_eq!(
            host.default_hit_test(handle, Point::new(308, 208)),
            HitTest::BottomRight
        );
        assert_eq!(
            host.default_hit_test(handle, Point::new(150, 150)),
            HitTest::Client
        );
    }
}
