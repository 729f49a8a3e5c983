/*
 * Provides the public entry point for the formductui crate: the lifecycle core of
 * top-level windows in a Win32-style UI toolkit. `FormManager` owns every window
 * and implements handle creation and recreation, the tri-state window state,
 * owner/owned and MDI relationships, menu merging, modal display and the two-phase
 * close protocol on top of an abstract `NativeHost`.
 *
 * The core is platform independent. `HeadlessHost` is an in-memory host for tests
 * and for embedders testing their own handlers; `Win32Host` (Windows only) drives
 * real windows through the `windows` crate.
 */
pub mod app;
pub mod bounds;
pub(crate) mod command_executor;
pub mod error;
pub mod events;
pub mod form_state;
pub(crate) mod handlers;
pub mod headless;
pub(crate) mod icon;
pub mod menu;
pub mod native;
pub mod types;
pub(crate) mod window_common;
#[cfg(target_os = "windows")]
pub mod win32_host;

pub use app::{FormManager, HandleTarget};
pub use bounds::BoundsSpecified;
pub use command_executor::FormCommand;
pub use error::{HandlerResult, PlatformError, Result as PlatformResult};
pub use events::{
    FormClosedArgs, FormClosingArgs, HelpRequestedArgs, LogErrorSink, MdiChildActivateArgs,
    MenuCommandArgs, MenuLoopArgs, UnhandledErrorSink, WindowStateChangedArgs,
};
pub use form_state::{FormFlags, TransientFlags};
pub use headless::{HeadlessHost, HeadlessShowState, HeadlessWindow, HostCall};
pub use menu::{MenuItem, MergeType};
pub use native::{
    CreateParams, DialogKey, ExtendedStyles, FormAdapter, NativeEvent, NativeHost, NativeMessage,
    Reply, ShowCommand, WindowClass, WindowPlacement, WindowStyles,
};
pub use types::{
    AutoScaleMode, AutoSizeMode, BorderStyle, CloseReason, Color, DialogResult, FormConfig,
    HostEnvironment, IconHandle, MenuActionId, MenuHandle, MenuId, NativeHandle, Point, Rect,
    Size, SizeGripStyle, StartPosition, WindowId, WindowState,
};
#[cfg(target_os = "windows")]
pub use win32_host::Win32Host;
