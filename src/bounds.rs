/*
 * Restored-bounds bookkeeping for minimized and maximized windows.
 *
 * While a window is not Normal, the bounds the platform reports are not the ones
 * the window returns to. `RestoreTracker` keeps the "restored" rectangle together
 * with a mask of which components are valid and whether width/height were
 * captured as client size (so they can be widened back by the frame extent when
 * the window returns to Normal). `restore_bounds` is the public value reported to
 * callers and is independent of the internal restore mechanism.
 */

use bitflags::bitflags;

use crate::types::{Rect, Size};

bitflags! {
    /// Which components of a bounds request are meaningful.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BoundsSpecified: u8 {
        const X = 0b0001;
        const Y = 0b0010;
        const WIDTH = 0b0100;
        const HEIGHT = 0b1000;
        const LOCATION = Self::X.bits() | Self::Y.bits();
        const SIZE = Self::WIDTH.bits() | Self::HEIGHT.bits();
        const ALL = Self::LOCATION.bits() | Self::SIZE.bits();
    }
}

const UNSET: Rect = Rect::new(-1, -1, -1, -1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTracker {
    restored: Rect,
    specified: BoundsSpecified,
    width_is_client_size: bool,
    height_is_client_size: bool,
    restore_bounds: Option<Rect>,
}

impl Default for RestoreTracker {
    fn default() -> Self {
        Self {
            restored: UNSET,
            specified: BoundsSpecified::empty(),
            width_is_client_size: false,
            height_is_client_size: false,
            restore_bounds: None,
        }
    }
}

impl RestoreTracker {
    /*
     * Captures the state of a Normal window that is about to become minimized or
     * maximized. The size is stored as client size; the location is raw.
     */
    pub fn snapshot(&mut self, window_bounds: Rect, client_size: Size) {
        self.restored = Rect::new(
            window_bounds.x,
            window_bounds.y,
            client_size.width,
            client_size.height,
        );
        self.specified = BoundsSpecified::ALL;
        self.width_is_client_size = true;
        self.height_is_client_size = true;
        self.restore_bounds = Some(window_bounds);
        log::trace!("RestoreTracker: snapshot window={window_bounds:?} client={client_size:?}");
    }

    /*
     * Records a bounds request made while the window is not Normal. Explicitly
     * requested width/height are raw window sizes, so they clear the client-size
     * markers for that component.
     */
    pub fn record_request(&mut self, requested: Rect, specified: BoundsSpecified) {
        if specified.contains(BoundsSpecified::X) {
            self.restored.x = requested.x;
        }
        if specified.contains(BoundsSpecified::Y) {
            self.restored.y = requested.y;
        }
        if specified.contains(BoundsSpecified::WIDTH) {
            self.restored.width = requested.width;
            self.width_is_client_size = false;
        }
        if specified.contains(BoundsSpecified::HEIGHT) {
            self.restored.height = requested.height;
            self.height_is_client_size = false;
        }
        self.specified |= specified;

        let mut public = self.restore_bounds.unwrap_or(requested);
        if specified.contains(BoundsSpecified::X) {
            public.x = requested.x;
        }
        if specified.contains(BoundsSpecified::Y) {
            public.y = requested.y;
        }
        if specified.contains(BoundsSpecified::WIDTH) {
            public.width = requested.width;
        }
        if specified.contains(BoundsSpecified::HEIGHT) {
            public.height = requested.height;
        }
        self.restore_bounds = Some(public);
    }

    pub fn has_pending_restore(&self) -> bool {
        !self.specified.is_empty()
    }

    pub fn specified(&self) -> BoundsSpecified {
        self.specified
    }

    /*
     * Resolves the rectangle a window returning to Normal should occupy without
     * consuming it. Components never specified keep the value from `current`;
     * client-size components are widened by `frame`.
     */
    pub fn peek_restored(&self, current: Rect, frame: Size) -> Option<Rect> {
        if self.specified.is_empty() {
            return None;
        }
        let mut resolved = current;
        if self.specified.contains(BoundsSpecified::X) {
            resolved.x = self.restored.x;
        }
        if self.specified.contains(BoundsSpecified::Y) {
            resolved.y = self.restored.y;
        }
        if self.specified.contains(BoundsSpecified::WIDTH) {
            resolved.width = if self.width_is_client_size {
                self.restored.width + frame.width
            } else {
                self.restored.width
            };
        }
        if self.specified.contains(BoundsSpecified::HEIGHT) {
            resolved.height = if self.height_is_client_size {
                self.restored.height + frame.height
            } else {
                self.restored.height
            };
        }
        Some(resolved)
    }

    /// Like `peek_restored`, but clears the pending restore.
    pub fn take_restored(&mut self, current: Rect, frame: Size) -> Option<Rect> {
        let resolved = self.peek_restored(current, frame)?;
        self.restored = UNSET;
        self.specified = BoundsSpecified::empty();
        self.width_is_client_size = false;
        self.height_is_client_size = false;
        Some(resolved)
    }

    /// Public restore bounds; falls back to the current bounds when nothing was
    /// captured.
    pub fn restore_bounds(&self, current: Rect) -> Rect {
        self.restore_bounds.unwrap_or(current)
    }
}
