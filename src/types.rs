/*
 * Platform-agnostic types shared by the window lifecycle core: logical ids, native
 * handle wrappers, geometry, the enumerations describing a top-level window's
 * configuration, and the declarative configuration records (`FormConfig`,
 * `HostEnvironment`). Nothing here touches a native API, so these types compile
 * and test on every platform.
 */

use crate::error::PlatformError;

/// Logical identifier of a window managed by `FormManager`. Stable for the
/// lifetime of the window, independent of native handle recreation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub(crate) usize);

impl WindowId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

/// Logical identifier of a menu owned by `FormManager`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MenuId(pub(crate) usize);

impl MenuId {
    pub const fn new(raw: usize) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> usize {
        self.0
    }
}

/// Semantic action attached to a menu item; reported back to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuActionId(pub u32);

/// Opaque native window handle. May be absent or destroyed at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(pub usize);

/// Opaque native menu handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MenuHandle(pub usize);

/// Opaque native icon handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IconHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 && self.height == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn location(self) -> Point {
        Point::new(self.x, self.y)
    }

    pub const fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    pub const fn right(self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub const fn bottom(self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub const fn contains(self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 && self.height == 0 && self.x == 0 && self.y == 0
    }

    /// Centers a rectangle of `size` inside `self`.
    pub const fn center(self, size: Size) -> Rect {
        Rect::new(
            self.x + (self.width - size.width) / 2,
            self.y + (self.height - size.height) / 2,
            size.width,
            size.height,
        )
    }
}

/// Simple RGB color, used for the layered-window transparency key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/*
 * Enumerations with a stable integer encoding. Values arriving from outside the
 * crate (FFI, persisted settings) must go through `TryFrom<i32>`, which rejects
 * out-of-range values with `InvalidArgument`.
 */
macro_rules! int_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $value:expr),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant = $value),+
        }

        impl TryFrom<i32> for $name {
            type Error = PlatformError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $(v if v == $value => Ok($name::$variant),)+
                    other => Err(PlatformError::InvalidArgument(format!(
                        "{} is not a valid {}",
                        other,
                        stringify!($name)
                    ))),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }
    };
}

int_enum! {
    /// Frame style of a top-level window.
    BorderStyle {
        None = 0,
        FixedSingle = 1,
        Fixed3D = 2,
        FixedDialog = 3,
        Sizable = 4,
        FixedToolWindow = 5,
        SizableToolWindow = 6,
    }
}

impl BorderStyle {
    pub const fn is_sizable(self) -> bool {
        matches!(self, BorderStyle::Sizable | BorderStyle::SizableToolWindow)
    }

    pub const fn is_tool_window(self) -> bool {
        matches!(
            self,
            BorderStyle::FixedToolWindow | BorderStyle::SizableToolWindow
        )
    }
}

int_enum! {
    /// Tri-state show condition of a top-level window.
    WindowState {
        Normal = 0,
        Minimized = 1,
        Maximized = 2,
    }
}

int_enum! {
    /// Where a window is placed when its handle is first created.
    StartPosition {
        Manual = 0,
        CenterScreen = 1,
        WindowsDefaultLocation = 2,
        WindowsDefaultBounds = 3,
        CenterParent = 4,
    }
}

int_enum! {
    SizeGripStyle {
        Auto = 0,
        Show = 1,
        Hide = 2,
    }
}

int_enum! {
    /// Outcome of a modal display.
    DialogResult {
        None = 0,
        Ok = 1,
        Cancel = 2,
        Abort = 3,
        Retry = 4,
        Ignore = 5,
        Yes = 6,
        No = 7,
    }
}

int_enum! {
    AutoScaleMode {
        None = 0,
        Font = 1,
        Dpi = 2,
        Inherit = 3,
    }
}

int_enum! {
    AutoSizeMode {
        GrowAndShrink = 0,
        GrowOnly = 1,
    }
}

int_enum! {
    /// Why a close sequence was started.
    CloseReason {
        None = 0,
        WindowsShutDown = 1,
        MdiFormClosing = 2,
        UserClosing = 3,
        TaskManagerClosing = 4,
        FormOwnerClosing = 5,
        ApplicationExitCall = 6,
    }
}

/// Declarative initial configuration of a top-level window.
#[derive(Debug, Clone, PartialEq)]
pub struct FormConfig {
    pub title: String,
    pub bounds: Rect,
    pub border_style: BorderStyle,
    pub control_box: bool,
    pub minimize_box: bool,
    pub maximize_box: bool,
    pub help_button: bool,
    pub key_preview: bool,
    pub show_in_taskbar: bool,
    pub show_icon: bool,
    pub top_most: bool,
    pub start_position: StartPosition,
    pub window_state: WindowState,
    pub size_grip_style: SizeGripStyle,
    pub auto_scale_mode: AutoScaleMode,
    pub minimum_size: Size,
    pub maximum_size: Size,
    pub maximized_bounds: Option<Rect>,
    pub opacity: f32,
    pub transparency_key: Option<Color>,
    pub right_to_left_layout: bool,
    pub auto_size: bool,
    pub auto_size_mode: AutoSizeMode,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            bounds: Rect::new(0, 0, 300, 300),
            border_style: BorderStyle::Sizable,
            control_box: true,
            minimize_box: true,
            maximize_box: true,
            help_button: false,
            key_preview: false,
            show_in_taskbar: true,
            show_icon: true,
            top_most: false,
            start_position: StartPosition::WindowsDefaultLocation,
            window_state: WindowState::Normal,
            size_grip_style: SizeGripStyle::Auto,
            auto_scale_mode: AutoScaleMode::Font,
            minimum_size: Size::default(),
            maximum_size: Size::default(),
            maximized_bounds: None,
            opacity: 1.0,
            transparency_key: None,
            right_to_left_layout: false,
            auto_size: false,
            auto_size_mode: AutoSizeMode::GrowOnly,
        }
    }
}

impl FormConfig {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_start_position(mut self, start_position: StartPosition) -> Self {
        self.start_position = start_position;
        self
    }

    pub fn with_border_style(mut self, border_style: BorderStyle) -> Self {
        self.border_style = border_style;
        self
    }

    pub fn with_window_state(mut self, window_state: WindowState) -> Self {
        self.window_state = window_state;
        self
    }
}

/// Process-level facts the core consults but does not own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEnvironment {
    /// Modal display is refused when the session is not interactive.
    pub user_interactive: bool,
    /// Initial show command requested by the launching process, applied to
    /// top-level windows when their handle is created.
    pub startup_window_state: Option<WindowState>,
    /// Edge length of the size grip square drawn in the bottom corner.
    pub size_grip_extent: i32,
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self {
            user_interactive: true,
            startup_window_state: None,
            size_grip_extent: 16,
        }
    }
}
