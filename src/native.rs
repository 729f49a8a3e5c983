/*
 * The contract between the window lifecycle core and the native windowing subsystem.
 *
 * `NativeHost` stands in for the generic windowed-control base: it creates and
 * destroys native windows from a declarative `CreateParams`, applies styles, show
 * commands, placement, owner links, menus and icons, and pumps native events for
 * nested loops. `FormAdapter` is the per-window lifecycle capability set the core
 * calls back into. Native event records (`NativeEvent`) carry an opcode-specific
 * payload and are answered with a `Reply`.
 *
 * Style bits use the Win32 encoding so the Windows adapter can pass them through
 * untouched; other hosts only need to interpret the subset they care about.
 */

use bitflags::bitflags;

use crate::error::Result as PlatformResult;
use crate::types::{
    Color, IconHandle, MenuActionId, MenuHandle, NativeHandle, Point, Rect, Size, WindowId,
};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowStyles: u32 {
        const POPUP = 0x8000_0000;
        const CHILD = 0x4000_0000;
        const MINIMIZE = 0x2000_0000;
        const VISIBLE = 0x1000_0000;
        const DISABLED = 0x0800_0000;
        const CLIPSIBLINGS = 0x0400_0000;
        const CLIPCHILDREN = 0x0200_0000;
        const MAXIMIZE = 0x0100_0000;
        const BORDER = 0x0080_0000;
        const DLGFRAME = 0x0040_0000;
        const CAPTION = Self::BORDER.bits() | Self::DLGFRAME.bits();
        const VSCROLL = 0x0020_0000;
        const HSCROLL = 0x0010_0000;
        const SYSMENU = 0x0008_0000;
        const THICKFRAME = 0x0004_0000;
        const MINIMIZEBOX = 0x0002_0000;
        const MAXIMIZEBOX = 0x0001_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ExtendedStyles: u32 {
        const DLGMODALFRAME = 0x0000_0001;
        const TOPMOST = 0x0000_0008;
        const MDICHILD = 0x0000_0040;
        const TOOLWINDOW = 0x0000_0080;
        const CLIENTEDGE = 0x0000_0200;
        const CONTEXTHELP = 0x0000_0400;
        const RTLREADING = 0x0000_2000;
        const LEFTSCROLLBAR = 0x0000_4000;
        const CONTROLPARENT = 0x0001_0000;
        const APPWINDOW = 0x0004_0000;
        const LAYERED = 0x0008_0000;
        const NOINHERITLAYOUT = 0x0010_0000;
        const LAYOUTRTL = 0x0040_0000;
    }
}

/// Which kind of native window a `CreateParams` describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowClass {
    Form,
    /// The child-hosting area of an MDI container.
    MdiClient,
    /// Hidden window that owns a top-level window kept out of the taskbar.
    OwnerProxy,
}

/// Declarative native creation parameters. `None` coordinates mean "let the
/// platform choose".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    pub class: WindowClass,
    pub caption: String,
    pub style: WindowStyles,
    pub ex_style: ExtendedStyles,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub parent: Option<NativeHandle>,
}

impl CreateParams {
    pub fn new(class: WindowClass) -> Self {
        Self {
            class,
            caption: String::new(),
            style: WindowStyles::empty(),
            ex_style: ExtendedStyles::empty(),
            x: None,
            y: None,
            width: None,
            height: None,
            parent: None,
        }
    }
}

/// Native show commands issued by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowCommand {
    Hide,
    Show,
    ShowNormal,
    ShowNoActivate,
    ShowMinimized,
    ShowMaximized,
    Restore,
}

/// Snapshot of a window's native placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlacement {
    pub show_command: ShowCommand,
    pub normal_bounds: Rect,
}

/// Native hit-test codes the core produces or rewrites.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTest {
    Nowhere,
    Client,
    Caption,
    SysMenu,
    Left,
    Right,
    Top,
    TopLeft,
    TopRight,
    Bottom,
    BottomLeft,
    BottomRight,
    Border,
}

impl HitTest {
    pub const fn code(self) -> isize {
        match self {
            HitTest::Nowhere => 0,
            HitTest::Client => 1,
            HitTest::Caption => 2,
            HitTest::SysMenu => 3,
            HitTest::Left => 10,
            HitTest::Right => 11,
            HitTest::Top => 12,
            HitTest::TopLeft => 13,
            HitTest::TopRight => 14,
            HitTest::Bottom => 15,
            HitTest::BottomLeft => 16,
            HitTest::BottomRight => 17,
            HitTest::Border => 18,
        }
    }

    pub const fn is_resize_edge(self) -> bool {
        matches!(
            self,
            HitTest::Left
                | HitTest::Right
                | HitTest::Top
                | HitTest::TopLeft
                | HitTest::TopRight
                | HitTest::Bottom
                | HitTest::BottomLeft
                | HitTest::BottomRight
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Inactive,
    Active,
    ClickActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeKind {
    Restored,
    Minimized,
    Maximized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysCommand {
    Close,
    KeyMenu,
    Size,
    Move,
    ContextHelp,
    Minimize,
    Maximize,
    Restore,
    Other(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogKey {
    Enter,
    Escape,
}

/// Size constraints written back by the *get min/max info* handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MinMaxInfo {
    pub min_track_size: Option<Size>,
    pub max_track_size: Option<Size>,
    pub max_position: Option<Point>,
    pub max_size: Option<Size>,
}

/// Opcode and opcode-specific payload of a native event record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeMessage {
    Activate { state: ActivationState },
    Close,
    QueryEndSession,
    EndSession { ending: bool },
    EnterSizeMove,
    ExitSizeMove,
    Created,
    EraseBackground,
    Size { kind: SizeKind },
    Move,
    InitMenuPopup { menu: MenuHandle },
    UninitMenuPopup { menu: MenuHandle },
    MenuChar { ch: char },
    MenuCommand { action: MenuActionId },
    MdiActivate {
        deactivated: Option<NativeHandle>,
        activated: Option<NativeHandle>,
    },
    GetMinMaxInfo(MinMaxInfo),
    HitTest { point: Point },
    SysCommand(SysCommand),
    DialogKey(DialogKey),
    /// The native window is gone (final destruction notification).
    Destroyed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeEvent {
    pub handle: NativeHandle,
    pub message: NativeMessage,
}

impl NativeEvent {
    pub fn new(handle: NativeHandle, message: NativeMessage) -> Self {
        Self { handle, message }
    }
}

/// Answer produced by the dispatcher. `Default` asks the host to run its own
/// default processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Default,
    Value(isize),
}

/// Item description handed to the host when a menu is materialized natively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeMenuItem {
    pub text: String,
    pub action: Option<MenuActionId>,
    pub children: Vec<NativeMenuItem>,
}

/*
 * Capability set of the native windowing subsystem. All calls happen on the UI
 * thread that owns the `FormManager`; implementations are free to be `!Send`.
 */
pub trait NativeHost {
    fn create_window(&mut self, params: &CreateParams) -> PlatformResult<NativeHandle>;

    /// Destroys `handle` and returns every native handle destroyed as a
    /// consequence (the window itself, its children, and windows it owns).
    fn destroy_window(&mut self, handle: NativeHandle) -> PlatformResult<Vec<NativeHandle>>;

    fn is_window(&self, handle: NativeHandle) -> bool;

    fn set_text(&mut self, handle: NativeHandle, text: &str) -> PlatformResult<()>;

    /// Re-applies styles to an existing handle without recreating it.
    fn apply_styles(
        &mut self,
        handle: NativeHandle,
        style: WindowStyles,
        ex_style: ExtendedStyles,
    ) -> PlatformResult<()>;

    fn set_owner(&mut self, handle: NativeHandle, owner: Option<NativeHandle>)
    -> PlatformResult<()>;

    fn owner(&self, handle: NativeHandle) -> Option<NativeHandle>;

    /// Top-level windows whose native owner is `handle`.
    fn owned_windows(&self, handle: NativeHandle) -> Vec<NativeHandle>;

    fn show_window(&mut self, handle: NativeHandle, command: ShowCommand) -> PlatformResult<()>;

    fn is_visible(&self, handle: NativeHandle) -> bool;

    fn placement(&self, handle: NativeHandle) -> PlatformResult<WindowPlacement>;

    fn set_placement(
        &mut self,
        handle: NativeHandle,
        placement: &WindowPlacement,
    ) -> PlatformResult<()>;

    fn window_bounds(&self, handle: NativeHandle) -> PlatformResult<Rect>;

    fn set_window_bounds(&mut self, handle: NativeHandle, bounds: Rect) -> PlatformResult<()>;

    fn client_size(&self, handle: NativeHandle) -> PlatformResult<Size>;

    /// Size of the non-client frame (caption, borders, menu bar) for a style set.
    fn non_client_extent(&self, style: WindowStyles, ex_style: ExtendedStyles, has_menu: bool)
    -> Size;

    fn set_top_most(&mut self, handle: NativeHandle, top_most: bool) -> PlatformResult<()>;

    fn set_layered_attributes(
        &mut self,
        handle: NativeHandle,
        opacity: f32,
        key: Option<Color>,
    ) -> PlatformResult<()>;

    fn set_enabled(&mut self, handle: NativeHandle, enabled: bool) -> PlatformResult<()>;

    fn set_icons(
        &mut self,
        handle: NativeHandle,
        big: Option<IconHandle>,
        small: Option<IconHandle>,
    ) -> PlatformResult<()>;

    fn load_default_icon(&mut self) -> PlatformResult<IconHandle>;

    fn derive_small_icon(&mut self, icon: IconHandle) -> PlatformResult<IconHandle>;

    fn create_menu(&mut self, items: &[NativeMenuItem]) -> PlatformResult<MenuHandle>;

    fn destroy_menu(&mut self, menu: MenuHandle);

    fn set_menu(&mut self, handle: NativeHandle, menu: Option<MenuHandle>) -> PlatformResult<()>;

    /// Menu path used when an MDI client area owns the frame menu.
    fn mdi_set_menu(
        &mut self,
        client: NativeHandle,
        frame_menu: MenuHandle,
        window_list: Option<MenuHandle>,
    ) -> PlatformResult<()>;

    fn draw_menu_bar(&mut self, handle: NativeHandle) -> PlatformResult<()>;

    fn activate(&mut self, handle: NativeHandle) -> PlatformResult<()>;

    fn active_window(&self) -> Option<NativeHandle>;

    /// Asks the MDI client area to activate one of its children.
    fn mdi_activate(&mut self, client: NativeHandle, child: NativeHandle) -> PlatformResult<()>;

    fn set_focus(&mut self, handle: NativeHandle) -> PlatformResult<()>;

    /// Releases pointer capture, returning the window that held it.
    fn release_capture(&mut self) -> Option<NativeHandle>;

    fn work_area(&self) -> Rect;

    fn default_hit_test(&self, handle: NativeHandle, point: Point) -> HitTest;

    /// Blocks until the next native event is available. `None` means the
    /// event source is exhausted (the nested loop must end).
    fn next_event(&mut self) -> Option<NativeEvent>;
}

/*
 * Per-window lifecycle hooks. Every method has a no-op default so an adapter only
 * overrides what it needs.
 */
pub trait FormAdapter {
    fn adjust_create_params(&mut self, _window_id: WindowId, _params: &mut CreateParams) {}

    fn handle_created(&mut self, _window_id: WindowId, _handle: NativeHandle) {}

    fn handle_destroyed(&mut self, _window_id: WindowId) {}

    fn layout_requested(&mut self, _window_id: WindowId, _client: Size) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caption_is_border_plus_dialog_frame() {
        assert!(WindowStyles::CAPTION.contains(WindowStyles::BORDER));
        assert!(WindowStyles::CAPTION.contains(WindowStyles::DLGFRAME));
        assert_eq!(WindowStyles::CAPTION.bits(), 0x00C0_0000);
    }

    #[test]
    fn only_edges_and_corners_are_resize_hits() {
        assert!(HitTest::BottomRight.is_resize_edge());
        assert!(HitTest::Left.is_resize_edge());
        assert!(!HitTest::Caption.is_resize_edge());
        assert!(!HitTest::Border.is_resize_edge());
        assert_eq!(HitTest::BottomRight.code(), 17);
    }
}
