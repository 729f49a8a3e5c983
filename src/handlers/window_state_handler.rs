/*
 * Window state (Normal / Minimized / Maximized) and bounds.
 *
 * The logical state is the flag stored on the window; the native placement is
 * the source of truth while a handle exists. `update_window_state` reconciles
 * the two after every show command and whenever the platform reports a size
 * change, snapshotting the Normal bounds on the way out of Normal and restoring
 * them on the way back.
 */

use crate::app::FormManager;
use crate::bounds::BoundsSpecified;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::WindowStateChangedArgs;
use crate::native::ShowCommand;
use crate::types::{Point, Rect, Size, WindowId, WindowState};

fn state_from_placement(command: ShowCommand) -> WindowState {
    match command {
        ShowCommand::ShowMinimized => WindowState::Minimized,
        ShowCommand::ShowMaximized => WindowState::Maximized,
        _ => WindowState::Normal,
    }
}

fn shrink(bounds: Rect, frame: Size) -> Size {
    Size::new(
        (bounds.width - frame.width).max(0),
        (bounds.height - frame.height).max(0),
    )
}

fn clamp_size(size: Size, minimum: Size, maximum: Size) -> Size {
    let mut clamped = size;
    if maximum.width > 0 {
        clamped.width = clamped.width.min(maximum.width);
    }
    if maximum.height > 0 {
        clamped.height = clamped.height.min(maximum.height);
    }
    clamped.width = clamped.width.max(minimum.width);
    clamped.height = clamped.height.max(minimum.height);
    clamped
}

impl FormManager {
    pub fn window_state(&self, window_id: WindowId) -> PlatformResult<WindowState> {
        self.with_form_read(window_id, |form| Ok(form.window_state()))
    }

    pub fn bounds(&self, window_id: WindowId) -> PlatformResult<Rect> {
        self.with_form_read(window_id, |form| Ok(form.bounds))
    }

    pub fn client_size(&self, window_id: WindowId) -> PlatformResult<Size> {
        let (handle, bounds) =
            self.with_form_read(window_id, |form| Ok((form.handle, form.bounds)))?;
        match handle {
            Some(handle) => self.host.client_size(handle),
            None => Ok(shrink(bounds, self.frame_extent(window_id))),
        }
    }

    /// Bounds the window returns to when it becomes Normal again.
    pub fn restore_bounds(&self, window_id: WindowId) -> PlatformResult<Rect> {
        self.with_form_read(window_id, |form| {
            Ok(match form.window_state() {
                WindowState::Normal => form.bounds,
                _ => form.restore.restore_bounds(form.bounds),
            })
        })
    }

    /*
     * Frame extent for the window's current styles. Used to convert between
     * window and client sizes; falls back to no frame when the styles cannot be
     * derived.
     */
    pub(crate) fn frame_extent(&self, window_id: WindowId) -> Size {
        let Ok(params) = self.build_create_params(window_id) else {
            return Size::default();
        };
        let has_menu = self
            .windows
            .get(&window_id)
            .map(|form| {
                !form.is_mdi_child()
                    && match form.handle {
                        Some(_) => form.applied_menu.is_some(),
                        None => form.menu.is_some(),
                    }
            })
            .unwrap_or(false);
        self.host
            .non_client_extent(params.style, params.ex_style, has_menu)
    }

    /*
     * Requests a new state. A visible window is driven natively and then
     * resynced; a hidden or handle-less window only records the state and takes
     * it on when it is next shown.
     */
    pub fn set_window_state(
        &mut self,
        window_id: WindowId,
        state: WindowState,
    ) -> PlatformResult<()> {
        let (old, handle, visible) = self.with_form_read(window_id, |form| {
            Ok((form.window_state(), form.handle, form.visible))
        })?;
        if old == state {
            return Ok(());
        }
        log::debug!("WindowState: {window_id:?} requested {old:?} -> {state:?}");

        if let Some(handle) = handle {
            if visible && self.host.is_visible(handle) {
                let command = match state {
                    WindowState::Normal => ShowCommand::ShowNormal,
                    WindowState::Minimized => ShowCommand::ShowMinimized,
                    WindowState::Maximized => ShowCommand::ShowMaximized,
                };
                self.host.show_window(handle, command)?;
                self.update_window_state(window_id)?;
            } else if old == WindowState::Normal
                && self
                    .host
                    .placement(handle)
                    .is_ok_and(|placement| placement.show_command == ShowCommand::ShowNormal)
            {
                let frame = self.frame_extent(window_id);
                let form = self.form_mut(window_id)?;
                let bounds = form.bounds;
                form.restore.snapshot(bounds, shrink(bounds, frame));
            }
        }

        let changed =
            self.with_form_write(window_id, |form| Ok(form.flags.set_window_state(state)))?;
        if changed {
            let mut args = WindowStateChangedArgs { old, new: state };
            self.raise_with(window_id, &mut args, |observers| &observers.window_state_changed);
        }
        Ok(())
    }

    /*
     * Reads the native placement and brings the logical state and bounds in line
     * with it. No-op without a handle.
     */
    pub(crate) fn update_window_state(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (handle, old, max_on_create, cached) = self.with_form_read(window_id, |form| {
            Ok((
                form.handle,
                form.window_state(),
                form.transient.mdi_child_max_on_create,
                form.bounds,
            ))
        })?;
        let Some(handle) = handle else {
            return Ok(());
        };
        let placement = self.host.placement(handle)?;
        let mut new = state_from_placement(placement.show_command);
        if max_on_create && new != WindowState::Minimized {
            new = old;
        }

        if new == old {
            let current = self.host.window_bounds(handle)?;
            self.form_mut(window_id)?.bounds = current;
            return Ok(());
        }

        let frame = self.frame_extent(window_id);
        if old == WindowState::Normal {
            self.form_mut(window_id)?
                .restore
                .snapshot(cached, shrink(cached, frame));
        }
        let resume_layout = {
            let form = self.form_mut(window_id)?;
            form.flags.set_window_state(new);
            if new == WindowState::Minimized {
                form.transient.layout_suspended_for_minimize = true;
                false
            } else {
                std::mem::replace(&mut form.transient.layout_suspended_for_minimize, false)
            }
        };

        let current = self.host.window_bounds(handle)?;
        let mut bounds = current;
        if new == WindowState::Normal {
            let restored = self.form_mut(window_id)?.restore.take_restored(current, frame);
            if let Some(restored) = restored
                && restored != current
            {
                self.host.set_window_bounds(handle, restored)?;
                bounds = self.host.window_bounds(handle)?;
            }
        }
        self.form_mut(window_id)?.bounds = bounds;
        log::debug!("WindowState: {window_id:?} is now {new:?} at {bounds:?}");

        if resume_layout {
            self.notify_layout(window_id);
        }
        let mut args = WindowStateChangedArgs { old, new };
        self.raise_with(window_id, &mut args, |observers| &observers.window_state_changed);
        Ok(())
    }

    pub(crate) fn sync_window_state(&mut self, window_id: WindowId) {
        if let Err(e) = self.update_window_state(window_id) {
            log::warn!("WindowState: Could not sync {window_id:?} with its placement: {e}");
        }
    }

    pub(crate) fn sync_bounds_from_native(&mut self, window_id: WindowId) {
        let Some(form) = self.windows.get(&window_id) else {
            return;
        };
        let Some(handle) = form.handle else {
            return;
        };
        if form.window_state() != WindowState::Normal {
            return;
        }
        match self.host.window_bounds(handle) {
            Ok(bounds) => {
                if let Some(form) = self.windows.get_mut(&window_id) {
                    form.bounds = bounds;
                }
            }
            Err(e) => log::warn!("WindowState: Bounds of {window_id:?} unavailable: {e}"),
        }
    }

    pub fn set_bounds(&mut self, window_id: WindowId, bounds: Rect) -> PlatformResult<()> {
        self.set_bounds_specified(window_id, bounds, BoundsSpecified::ALL)
    }

    pub fn set_location(&mut self, window_id: WindowId, location: Point) -> PlatformResult<()> {
        let bounds = Rect::new(location.x, location.y, 0, 0);
        self.set_bounds_specified(window_id, bounds, BoundsSpecified::LOCATION)
    }

    pub fn set_size(&mut self, window_id: WindowId, size: Size) -> PlatformResult<()> {
        let bounds = Rect::new(0, 0, size.width, size.height);
        self.set_bounds_specified(window_id, bounds, BoundsSpecified::SIZE)
    }

    /*
     * Applies the components of `requested` named by `specified`. While the
     * window is minimized or maximized the request is remembered and applied when
     * it returns to Normal.
     */
    pub fn set_bounds_specified(
        &mut self,
        window_id: WindowId,
        requested: Rect,
        specified: BoundsSpecified,
    ) -> PlatformResult<()> {
        let (handle, target, deferred) = self.with_form_write(window_id, |form| {
            let mut target = form.bounds;
            if specified.contains(BoundsSpecified::X) {
                target.x = requested.x;
            }
            if specified.contains(BoundsSpecified::Y) {
                target.y = requested.y;
            }
            if specified.contains(BoundsSpecified::WIDTH) {
                target.width = requested.width;
            }
            if specified.contains(BoundsSpecified::HEIGHT) {
                target.height = requested.height;
            }
            if !form.transient.in_scale {
                let size = clamp_size(target.size(), form.minimum_size, form.maximum_size);
                target.width = size.width;
                target.height = size.height;
            }

            let deferred = form.window_state() != WindowState::Normal
                && (form.handle.is_some() || form.restore.has_pending_restore());
            if deferred {
                form.restore.record_request(target, specified);
            } else if form.handle.is_none() {
                form.bounds = target;
            }
            Ok((form.handle, target, deferred))
        })?;
        if deferred {
            log::debug!("WindowState: {window_id:?} will restore to {target:?}");
            return Ok(());
        }

        if let Some(handle) = handle {
            self.host.set_window_bounds(handle, target)?;
            let current = self.host.window_bounds(handle)?;
            self.form_mut(window_id)?.bounds = current;
        }
        self.notify_layout(window_id);
        Ok(())
    }

    /// Scales size and size constraints by `factor`; the location is kept.
    pub fn scale(&mut self, window_id: WindowId, factor: f32) -> PlatformResult<()> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(PlatformError::InvalidArgument(format!(
                "Scale factor {factor} must be positive"
            )));
        }
        let scale = |size: Size| {
            Size::new(
                (size.width as f32 * factor).round() as i32,
                (size.height as f32 * factor).round() as i32,
            )
        };
        let target = self.with_form_write(window_id, |form| {
            form.transient.in_scale = true;
            form.minimum_size = scale(form.minimum_size);
            form.maximum_size = scale(form.maximum_size);
            let size = scale(form.bounds.size());
            Ok(Rect::new(0, 0, size.width, size.height))
        })?;
        let result = self.set_bounds_specified(window_id, target, BoundsSpecified::SIZE);
        if let Some(form) = self.windows.get_mut(&window_id) {
            form.transient.in_scale = false;
        }
        result
    }
}
