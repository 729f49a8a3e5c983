/*
 * Win32 implementation of `NativeHost`.
 *
 * Every window created here shares one registered class whose window procedure
 * translates the messages the core cares about into `NativeEvent` records and
 * queues them on a thread-local queue. `next_event` drains that queue and, when
 * it is empty, pumps the thread's message loop until the procedure has queued
 * something new. Messages are answered with their default processing at the
 * time they arrive; the core sees them afterwards through the queue.
 *
 * Handles cross the trait boundary as plain integers: `NativeHandle` carries the
 * `HWND`, `MenuHandle` the `HMENU` and `IconHandle` the `HICON`.
 */

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::ffi::c_void;

use windows::Win32::Foundation::{
    COLORREF, GetLastError, HANDLE, HINSTANCE, HWND, LPARAM, LRESULT, RECT, WPARAM,
};
use windows::Win32::Graphics::Gdi::{COLOR_WINDOW, HBRUSH};
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    EnableWindow, GetActiveWindow, GetCapture, ReleaseCapture, SetActiveWindow, SetFocus,
    VK_ESCAPE, VK_RETURN,
};
use windows::Win32::UI::WindowsAndMessaging::*;
use windows::core::{BOOL, HSTRING, PCWSTR, w};

use crate::error::{PlatformError, Result as PlatformResult};
use crate::native::{
    ActivationState, CreateParams, DialogKey, ExtendedStyles, HitTest, NativeEvent, NativeHost,
    NativeMenuItem, NativeMessage, ShowCommand, SizeKind, SysCommand, WindowClass,
    WindowPlacement, WindowStyles,
};
use crate::types::{Color, IconHandle, MenuActionId, MenuHandle, NativeHandle, Point, Rect, Size};

const MDI_FIRST_CHILD_ID: u32 = 0xFF00;

thread_local! {
    static EVENT_QUEUE: RefCell<VecDeque<NativeEvent>> = const { RefCell::new(VecDeque::new()) };
    // Frame window -> its MDI client area, for DefFrameProcW.
    static MDI_CLIENTS: RefCell<HashMap<usize, HWND>> = RefCell::new(HashMap::new());
    // Handles destroyed during an explicit `destroy_window` call.
    static DESTROY_SWEEP: RefCell<Option<Vec<NativeHandle>>> = const { RefCell::new(None) };
    static QUIT_RECEIVED: Cell<bool> = const { Cell::new(false) };
}

fn hwnd(handle: NativeHandle) -> HWND {
    HWND(handle.0 as *mut c_void)
}

fn native(hwnd: HWND) -> NativeHandle {
    NativeHandle(hwnd.0 as usize)
}

fn hmenu(menu: MenuHandle) -> HMENU {
    HMENU(menu.0 as *mut c_void)
}

fn to_rect(rect: &RECT) -> Rect {
    Rect::new(rect.left, rect.top, rect.right - rect.left, rect.bottom - rect.top)
}

fn from_rect(rect: Rect) -> RECT {
    RECT {
        left: rect.x,
        top: rect.y,
        right: rect.x + rect.width,
        bottom: rect.y + rect.height,
    }
}

fn low_word(value: usize) -> u16 {
    (value & 0xFFFF) as u16
}

fn high_word(value: usize) -> u16 {
    ((value >> 16) & 0xFFFF) as u16
}

fn show_command_to_native(command: ShowCommand) -> SHOW_WINDOW_CMD {
    match command {
        ShowCommand::Hide => SW_HIDE,
        ShowCommand::Show => SW_SHOW,
        ShowCommand::ShowNormal => SW_SHOWNORMAL,
        ShowCommand::ShowNoActivate => SW_SHOWNOACTIVATE,
        ShowCommand::ShowMinimized => SW_SHOWMINIMIZED,
        ShowCommand::ShowMaximized => SW_SHOWMAXIMIZED,
        ShowCommand::Restore => SW_RESTORE,
    }
}

fn show_command_from_native(command: u32) -> ShowCommand {
    match SHOW_WINDOW_CMD(command as i32) {
        SW_HIDE => ShowCommand::Hide,
        SW_SHOWMINIMIZED | SW_MINIMIZE | SW_SHOWMINNOACTIVE => ShowCommand::ShowMinimized,
        SW_SHOWMAXIMIZED => ShowCommand::ShowMaximized,
        _ => ShowCommand::ShowNormal,
    }
}

fn hit_test_from_native(code: isize) -> HitTest {
    match code as u32 {
        HTCLIENT => HitTest::Client,
        HTCAPTION => HitTest::Caption,
        HTSYSMENU => HitTest::SysMenu,
        HTLEFT => HitTest::Left,
        HTRIGHT => HitTest::Right,
        HTTOP => HitTest::Top,
        HTTOPLEFT => HitTest::TopLeft,
        HTTOPRIGHT => HitTest::TopRight,
        HTBOTTOM => HitTest::Bottom,
        HTBOTTOMLEFT => HitTest::BottomLeft,
        HTBOTTOMRIGHT => HitTest::BottomRight,
        HTBORDER => HitTest::Border,
        _ => HitTest::Nowhere,
    }
}

fn sys_command_from_native(command: usize) -> SysCommand {
    match (command & 0xFFF0) as u32 {
        SC_CLOSE => SysCommand::Close,
        SC_KEYMENU => SysCommand::KeyMenu,
        SC_SIZE => SysCommand::Size,
        SC_MOVE => SysCommand::Move,
        SC_CONTEXTHELP => SysCommand::ContextHelp,
        SC_MINIMIZE => SysCommand::Minimize,
        SC_MAXIMIZE => SysCommand::Maximize,
        SC_RESTORE => SysCommand::Restore,
        other => SysCommand::Other(other),
    }
}

fn optional_hwnd(raw: isize) -> Option<NativeHandle> {
    (raw != 0).then_some(NativeHandle(raw as usize))
}

/*
 * Maps a window message to the event the core consumes. Messages the core does
 * not observe return `None` and only get default processing.
 */
fn translate_message(msg: u32, wparam: WPARAM, lparam: LPARAM) -> Option<NativeMessage> {
    let message = match msg {
        WM_ACTIVATE => NativeMessage::Activate {
            state: match u32::from(low_word(wparam.0)) {
                WA_ACTIVE => ActivationState::Active,
                WA_CLICKACTIVE => ActivationState::ClickActive,
                _ => ActivationState::Inactive,
            },
        },
        WM_CLOSE => NativeMessage::Close,
        WM_QUERYENDSESSION => NativeMessage::QueryEndSession,
        WM_ENDSESSION => NativeMessage::EndSession {
            ending: wparam.0 != 0,
        },
        WM_ENTERSIZEMOVE => NativeMessage::EnterSizeMove,
        WM_EXITSIZEMOVE => NativeMessage::ExitSizeMove,
        WM_CREATE => NativeMessage::Created,
        WM_SIZE => NativeMessage::Size {
            kind: match wparam.0 as u32 {
                SIZE_MINIMIZED => SizeKind::Minimized,
                SIZE_MAXIMIZED => SizeKind::Maximized,
                SIZE_RESTORED => SizeKind::Restored,
                _ => return None,
            },
        },
        WM_MOVE => NativeMessage::Move,
        WM_INITMENUPOPUP => NativeMessage::InitMenuPopup {
            menu: MenuHandle(wparam.0),
        },
        WM_UNINITMENUPOPUP => NativeMessage::UninitMenuPopup {
            menu: MenuHandle(wparam.0),
        },
        WM_MENUCHAR => NativeMessage::MenuChar {
            ch: char::from_u32(u32::from(low_word(wparam.0)))?,
        },
        WM_COMMAND if high_word(wparam.0) == 0 && lparam.0 == 0 => NativeMessage::MenuCommand {
            action: MenuActionId(u32::from(low_word(wparam.0))),
        },
        WM_MDIACTIVATE => NativeMessage::MdiActivate {
            deactivated: optional_hwnd(wparam.0 as isize),
            activated: optional_hwnd(lparam.0),
        },
        WM_SYSCOMMAND => NativeMessage::SysCommand(sys_command_from_native(wparam.0)),
        WM_NCDESTROY => NativeMessage::Destroyed,
        _ => return None,
    };
    Some(message)
}

fn default_processing(window: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        let ex_style = WINDOW_EX_STYLE(GetWindowLongPtrW(window, GWL_EXSTYLE) as u32);
        if ex_style.contains(WS_EX_MDICHILD) {
            return DefMDIChildProcW(window, msg, wparam, lparam);
        }
        let client =
            MDI_CLIENTS.with(|clients| clients.borrow().get(&(window.0 as usize)).copied());
        match client {
            Some(client) => DefFrameProcW(window, Some(client), msg, wparam, lparam),
            None => DefWindowProcW(window, msg, wparam, lparam),
        }
    }
}

/*
 * Window procedure shared by every form and owner proxy. Queues the translated
 * event, then answers the message. Close requests are left to the core: the
 * default processing would destroy the window before the close protocol ran.
 */
unsafe extern "system" fn form_wnd_proc(
    window: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if let Some(message) = translate_message(msg, wparam, lparam) {
        let handle = native(window);
        let sweeping = DESTROY_SWEEP.with(|sweep| {
            let mut sweep = sweep.borrow_mut();
            match (sweep.as_mut(), &message) {
                (Some(destroyed), NativeMessage::Destroyed) => {
                    destroyed.push(handle);
                    true
                }
                _ => false,
            }
        });
        if !sweeping {
            log::trace!("Win32Host: Queued {message:?} for {handle:?}");
            EVENT_QUEUE.with(|queue| {
                queue.borrow_mut().push_back(NativeEvent::new(handle, message))
            });
        }
    }

    match msg {
        WM_CLOSE => LRESULT(0),
        WM_QUERYENDSESSION => LRESULT(1),
        WM_NCDESTROY => {
            MDI_CLIENTS.with(|clients| clients.borrow_mut().remove(&(window.0 as usize)));
            default_processing(window, msg, wparam, lparam)
        }
        _ => default_processing(window, msg, wparam, lparam),
    }
}

unsafe extern "system" fn collect_owned(window: HWND, lparam: LPARAM) -> BOOL {
    let search = unsafe { &mut *(lparam.0 as *mut (HWND, Vec<NativeHandle>)) };
    if let Ok(owner) = unsafe { GetWindow(window, GW_OWNER) }
        && owner == search.0
    {
        search.1.push(native(window));
    }
    BOOL(1)
}

pub struct Win32Host {
    instance: HINSTANCE,
    class_name: HSTRING,
}

impl Win32Host {
    /*
     * Registers the shared window class (once per process and class name) and
     * returns a host bound to the calling thread's message queue.
     */
    pub fn new(app_name: &str) -> PlatformResult<Self> {
        let module = unsafe { GetModuleHandleW(None)? };
        let instance = HINSTANCE(module.0);
        let class_name = HSTRING::from(format!("{app_name}_FormWindowClass"));
        let class_name_pcwstr = PCWSTR(class_name.as_ptr());

        unsafe {
            let mut existing = WNDCLASSEXW::default();
            if GetClassInfoExW(Some(instance), class_name_pcwstr, &mut existing).is_ok() {
                log::debug!("Win32Host: Window class for '{app_name}' already registered");
                return Ok(Self {
                    instance,
                    class_name,
                });
            }
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(form_wnd_proc),
                hInstance: instance,
                hIcon: LoadIconW(None, IDI_APPLICATION)?,
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                hbrBackground: HBRUSH((COLOR_WINDOW.0 + 1) as *mut c_void),
                lpszClassName: class_name_pcwstr,
                ..Default::default()
            };
            if RegisterClassExW(&wc) == 0 {
                let error = GetLastError();
                log::error!("Win32Host: RegisterClassExW failed: {error:?}");
                return Err(PlatformError::OperationFailed(format!(
                    "RegisterClassExW failed: {error:?}"
                )));
            }
        }
        log::debug!("Win32Host: Registered window class for '{app_name}'");
        Ok(Self {
            instance,
            class_name,
        })
    }

    fn append_items(menu: HMENU, items: &[NativeMenuItem]) -> PlatformResult<()> {
        for item in items {
            let text = HSTRING::from(item.text.as_str());
            if item.children.is_empty() {
                let id = item.action.map_or(0, |action| action.0 as usize);
                unsafe { AppendMenuW(menu, MF_STRING, id, &text)? };
            } else {
                let popup = unsafe { CreatePopupMenu()? };
                Self::append_items(popup, &item.children)?;
                unsafe { AppendMenuW(menu, MF_POPUP, popup.0 as usize, &text)? };
            }
        }
        Ok(())
    }
}

impl NativeHost for Win32Host {
    fn create_window(&mut self, params: &CreateParams) -> PlatformResult<NativeHandle> {
        let style = WINDOW_STYLE(params.style.bits());
        let ex_style = WINDOW_EX_STYLE(params.ex_style.bits());
        let x = params.x.unwrap_or(CW_USEDEFAULT);
        let y = params.y.unwrap_or(CW_USEDEFAULT);
        let width = params.width.unwrap_or(CW_USEDEFAULT);
        let height = params.height.unwrap_or(CW_USEDEFAULT);
        let parent = params.parent.map(hwnd);
        let caption = HSTRING::from(params.caption.as_str());

        let created = unsafe {
            match params.class {
                WindowClass::MdiClient => {
                    let client_create = CLIENTCREATESTRUCT {
                        hWindowMenu: HANDLE::default(),
                        idFirstChild: MDI_FIRST_CHILD_ID,
                    };
                    CreateWindowExW(
                        ex_style,
                        w!("MDICLIENT"),
                        &caption,
                        style,
                        x,
                        y,
                        width,
                        height,
                        parent,
                        None,
                        Some(self.instance),
                        Some(&client_create as *const CLIENTCREATESTRUCT as *const c_void),
                    )
                }
                WindowClass::Form | WindowClass::OwnerProxy => CreateWindowExW(
                    ex_style,
                    &self.class_name,
                    &caption,
                    style,
                    x,
                    y,
                    width,
                    height,
                    parent,
                    None,
                    Some(self.instance),
                    None,
                ),
            }
        };
        let window = created.map_err(|e| {
            log::error!("Win32Host: CreateWindowExW failed for {:?}: {e:?}", params.class);
            PlatformError::WindowCreationFailed(format!("CreateWindowExW failed: {e}"))
        })?;

        if params.class == WindowClass::MdiClient
            && let Some(frame) = parent
        {
            MDI_CLIENTS.with(|clients| clients.borrow_mut().insert(frame.0 as usize, window));
        }
        log::debug!("Win32Host: Created {:?} as {window:?}", params.class);
        Ok(native(window))
    }

    fn destroy_window(&mut self, handle: NativeHandle) -> PlatformResult<Vec<NativeHandle>> {
        DESTROY_SWEEP.with(|sweep| *sweep.borrow_mut() = Some(Vec::new()));
        let result = unsafe { DestroyWindow(hwnd(handle)) };
        let destroyed = DESTROY_SWEEP
            .with(|sweep| sweep.borrow_mut().take())
            .unwrap_or_default();
        result?;
        Ok(destroyed)
    }

    fn is_window(&self, handle: NativeHandle) -> bool {
        unsafe { IsWindow(Some(hwnd(handle))).as_bool() }
    }

    fn set_text(&mut self, handle: NativeHandle, text: &str) -> PlatformResult<()> {
        unsafe { SetWindowTextW(hwnd(handle), &HSTRING::from(text))? };
        Ok(())
    }

    fn apply_styles(
        &mut self,
        handle: NativeHandle,
        style: WindowStyles,
        ex_style: ExtendedStyles,
    ) -> PlatformResult<()> {
        let window = hwnd(handle);
        unsafe {
            SetWindowLongPtrW(window, GWL_STYLE, style.bits() as isize);
            SetWindowLongPtrW(window, GWL_EXSTYLE, ex_style.bits() as isize);
            SetWindowPos(
                window,
                None,
                0,
                0,
                0,
                0,
                SWP_FRAMECHANGED | SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }

    fn set_owner(
        &mut self,
        handle: NativeHandle,
        owner: Option<NativeHandle>,
    ) -> PlatformResult<()> {
        let raw = owner.map_or(0, |owner| owner.0 as isize);
        unsafe { SetWindowLongPtrW(hwnd(handle), GWLP_HWNDPARENT, raw) };
        Ok(())
    }

    fn owner(&self, handle: NativeHandle) -> Option<NativeHandle> {
        unsafe { GetWindow(hwnd(handle), GW_OWNER) }.ok().map(native)
    }

    fn owned_windows(&self, handle: NativeHandle) -> Vec<NativeHandle> {
        let mut search: (HWND, Vec<NativeHandle>) = (hwnd(handle), Vec::new());
        let lparam = LPARAM(&mut search as *mut (HWND, Vec<NativeHandle>) as isize);
        if let Err(e) = unsafe { EnumWindows(Some(collect_owned), lparam) } {
            log::warn!("Win32Host: EnumWindows failed: {e:?}");
        }
        search.1
    }

    fn show_window(&mut self, handle: NativeHandle, command: ShowCommand) -> PlatformResult<()> {
        // The return value reports the previous visibility, not success.
        let _ = unsafe { ShowWindow(hwnd(handle), show_command_to_native(command)) };
        Ok(())
    }

    fn is_visible(&self, handle: NativeHandle) -> bool {
        unsafe { IsWindowVisible(hwnd(handle)).as_bool() }
    }

    fn placement(&self, handle: NativeHandle) -> PlatformResult<WindowPlacement> {
        let mut placement = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            ..Default::default()
        };
        unsafe { GetWindowPlacement(hwnd(handle), &mut placement)? };
        Ok(WindowPlacement {
            show_command: show_command_from_native(placement.showCmd),
            normal_bounds: to_rect(&placement.rcNormalPosition),
        })
    }

    fn set_placement(
        &mut self,
        handle: NativeHandle,
        placement: &WindowPlacement,
    ) -> PlatformResult<()> {
        let native_placement = WINDOWPLACEMENT {
            length: std::mem::size_of::<WINDOWPLACEMENT>() as u32,
            showCmd: show_command_to_native(placement.show_command).0 as u32,
            rcNormalPosition: from_rect(placement.normal_bounds),
            ..Default::default()
        };
        unsafe { SetWindowPlacement(hwnd(handle), &native_placement)? };
        Ok(())
    }

    fn window_bounds(&self, handle: NativeHandle) -> PlatformResult<Rect> {
        let mut rect = RECT::default();
        unsafe { GetWindowRect(hwnd(handle), &mut rect)? };
        Ok(to_rect(&rect))
    }

    fn set_window_bounds(&mut self, handle: NativeHandle, bounds: Rect) -> PlatformResult<()> {
        unsafe {
            SetWindowPos(
                hwnd(handle),
                None,
                bounds.x,
                bounds.y,
                bounds.width,
                bounds.height,
                SWP_NOZORDER | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }

    fn client_size(&self, handle: NativeHandle) -> PlatformResult<Size> {
        let mut rect = RECT::default();
        unsafe { GetClientRect(hwnd(handle), &mut rect)? };
        Ok(Size::new(rect.right - rect.left, rect.bottom - rect.top))
    }

    fn non_client_extent(
        &self,
        style: WindowStyles,
        ex_style: ExtendedStyles,
        has_menu: bool,
    ) -> Size {
        let mut rect = RECT::default();
        let adjusted = unsafe {
            AdjustWindowRectEx(
                &mut rect,
                WINDOW_STYLE(style.bits()),
                has_menu,
                WINDOW_EX_STYLE(ex_style.bits()),
            )
        };
        if let Err(e) = adjusted {
            log::warn!("Win32Host: AdjustWindowRectEx failed: {e:?}");
            return Size::default();
        }
        Size::new(rect.right - rect.left, rect.bottom - rect.top)
    }

    fn set_top_most(&mut self, handle: NativeHandle, top_most: bool) -> PlatformResult<()> {
        let insert_after = if top_most {
            HWND_TOPMOST
        } else {
            HWND_NOTOPMOST
        };
        unsafe {
            SetWindowPos(
                hwnd(handle),
                Some(insert_after),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }

    fn set_layered_attributes(
        &mut self,
        handle: NativeHandle,
        opacity: f32,
        key: Option<Color>,
    ) -> PlatformResult<()> {
        let mut flags = LWA_ALPHA;
        let mut color = COLORREF(0);
        if let Some(key) = key {
            flags |= LWA_COLORKEY;
            color = COLORREF(
                u32::from(key.r) | (u32::from(key.g) << 8) | (u32::from(key.b) << 16),
            );
        }
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        unsafe { SetLayeredWindowAttributes(hwnd(handle), color, alpha, flags)? };
        Ok(())
    }

    fn set_enabled(&mut self, handle: NativeHandle, enabled: bool) -> PlatformResult<()> {
        // Returns the previous disabled state.
        let _ = unsafe { EnableWindow(hwnd(handle), enabled) };
        Ok(())
    }

    fn set_icons(
        &mut self,
        handle: NativeHandle,
        big: Option<IconHandle>,
        small: Option<IconHandle>,
    ) -> PlatformResult<()> {
        let window = hwnd(handle);
        for (kind, icon) in [(ICON_BIG, big), (ICON_SMALL, small)] {
            let raw = icon.map_or(0, |icon| icon.0 as isize);
            unsafe {
                SendMessageW(
                    window,
                    WM_SETICON,
                    Some(WPARAM(kind as usize)),
                    Some(LPARAM(raw)),
                )
            };
        }
        Ok(())
    }

    fn load_default_icon(&mut self) -> PlatformResult<IconHandle> {
        let icon = unsafe { LoadIconW(None, IDI_APPLICATION)? };
        Ok(IconHandle(icon.0 as usize))
    }

    fn derive_small_icon(&mut self, icon: IconHandle) -> PlatformResult<IconHandle> {
        let (width, height) =
            unsafe { (GetSystemMetrics(SM_CXSMICON), GetSystemMetrics(SM_CYSMICON)) };
        let copy = unsafe {
            CopyImage(
                HANDLE(icon.0 as *mut c_void),
                IMAGE_ICON,
                width,
                height,
                IMAGE_FLAGS(0),
            )?
        };
        Ok(IconHandle(copy.0 as usize))
    }

    fn create_menu(&mut self, items: &[NativeMenuItem]) -> PlatformResult<MenuHandle> {
        let menu = unsafe { CreateMenu()? };
        if let Err(e) = Self::append_items(menu, items) {
            let _ = unsafe { DestroyMenu(menu) };
            return Err(e);
        }
        Ok(MenuHandle(menu.0 as usize))
    }

    fn destroy_menu(&mut self, menu: MenuHandle) {
        if let Err(e) = unsafe { DestroyMenu(hmenu(menu)) } {
            log::warn!("Win32Host: DestroyMenu failed for {menu:?}: {e:?}");
        }
    }

    fn set_menu(&mut self, handle: NativeHandle, menu: Option<MenuHandle>) -> PlatformResult<()> {
        unsafe { SetMenu(hwnd(handle), menu.map(hmenu))? };
        Ok(())
    }

    fn mdi_set_menu(
        &mut self,
        client: NativeHandle,
        frame_menu: MenuHandle,
        window_list: Option<MenuHandle>,
    ) -> PlatformResult<()> {
        let list = window_list.map_or(0, |menu| menu.0 as isize);
        unsafe {
            SendMessageW(
                hwnd(client),
                WM_MDISETMENU,
                Some(WPARAM(frame_menu.0)),
                Some(LPARAM(list)),
            )
        };
        Ok(())
    }

    fn draw_menu_bar(&mut self, handle: NativeHandle) -> PlatformResult<()> {
        unsafe { DrawMenuBar(hwnd(handle))? };
        Ok(())
    }

    fn activate(&mut self, handle: NativeHandle) -> PlatformResult<()> {
        unsafe { SetActiveWindow(hwnd(handle))? };
        Ok(())
    }

    fn active_window(&self) -> Option<NativeHandle> {
        let active = unsafe { GetActiveWindow() };
        (!active.is_invalid()).then(|| native(active))
    }

    fn mdi_activate(&mut self, client: NativeHandle, child: NativeHandle) -> PlatformResult<()> {
        unsafe {
            SendMessageW(
                hwnd(client),
                WM_MDIACTIVATE,
                Some(WPARAM(child.0)),
                Some(LPARAM(0)),
            )
        };
        Ok(())
    }

    fn set_focus(&mut self, handle: NativeHandle) -> PlatformResult<()> {
        unsafe { SetFocus(Some(hwnd(handle)))? };
        Ok(())
    }

    fn release_capture(&mut self) -> Option<NativeHandle> {
        let holder = unsafe { GetCapture() };
        if holder.is_invalid() {
            return None;
        }
        if let Err(e) = unsafe { ReleaseCapture() } {
            log::warn!("Win32Host: ReleaseCapture failed: {e:?}");
        }
        Some(native(holder))
    }

    fn work_area(&self) -> Rect {
        let mut rect = RECT::default();
        let queried = unsafe {
            SystemParametersInfoW(
                SPI_GETWORKAREA,
                0,
                Some(&mut rect as *mut RECT as *mut c_void),
                SYSTEM_PARAMETERS_INFO_UPDATE_FLAGS(0),
            )
        };
        if let Err(e) = queried {
            log::warn!("Win32Host: Work area query failed: {e:?}");
        }
        to_rect(&rect)
    }

    fn default_hit_test(&self, handle: NativeHandle, point: Point) -> HitTest {
        let packed = ((point.y as u16 as isize) << 16) | (point.x as u16 as isize);
        let code = unsafe { DefWindowProcW(hwnd(handle), WM_NCHITTEST, WPARAM(0), LPARAM(packed)) };
        hit_test_from_native(code.0)
    }

    /*
     * Returns the next queued event, pumping the message loop while the queue is
     * empty. Enter and Escape key presses are turned into dialog-key events for
     * their top-level window instead of being dispatched. `WM_QUIT` ends the
     * source; it is re-posted so an enclosing loop sees it too.
     */
    fn next_event(&mut self) -> Option<NativeEvent> {
        loop {
            if let Some(event) = EVENT_QUEUE.with(|queue| queue.borrow_mut().pop_front()) {
                return Some(event);
            }
            if QUIT_RECEIVED.with(Cell::get) {
                return None;
            }

            let mut msg = MSG::default();
            let status = unsafe { GetMessageW(&mut msg, None, 0, 0) };
            if status.0 == 0 {
                log::debug!("Win32Host: WM_QUIT received");
                QUIT_RECEIVED.with(|quit| quit.set(true));
                unsafe { PostQuitMessage(msg.wParam.0 as i32) };
                return None;
            }
            if status.0 == -1 {
                log::error!("Win32Host: GetMessageW failed");
                return None;
            }

            if msg.message == WM_KEYDOWN {
                let key = match low_word(msg.wParam.0) {
                    code if code == VK_RETURN.0 => Some(DialogKey::Enter),
                    code if code == VK_ESCAPE.0 => Some(DialogKey::Escape),
                    _ => None,
                };
                if let Some(key) = key {
                    let root = unsafe { GetAncestor(msg.hwnd, GA_ROOT) };
                    return Some(NativeEvent::new(native(root), NativeMessage::DialogKey(key)));
                }
            }
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
    }
}
