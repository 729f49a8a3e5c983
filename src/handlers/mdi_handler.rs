/*
 * Multiple-document interface: containers, their client area, child membership
 * and child activation.
 *
 * A container owns a client-area window that hosts the native child windows.
 * Exactly one visible child is active at a time (or none). Activation changes
 * raise `deactivate` on the previous child, `activated` on the new one and
 * `mdi_child_activate` on the container, then refresh the container's menu bar
 * since the merged menu depends on the active child.
 */

use crate::app::{FormManager, HandleTarget};
use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::MdiChildActivateArgs;
use crate::native::{CreateParams, ExtendedStyles, Reply, WindowClass, WindowStyles};
use crate::types::{NativeHandle, WindowId};
use crate::window_common::MdiContainerData;

impl FormManager {
    pub fn is_mdi_container(&self, window_id: WindowId) -> PlatformResult<bool> {
        self.with_form_read(window_id, |form| Ok(form.is_mdi_container()))
    }

    pub fn mdi_parent(&self, window_id: WindowId) -> PlatformResult<Option<WindowId>> {
        self.with_form_read(window_id, |form| Ok(form.mdi_parent))
    }

    pub fn mdi_children(&self, container: WindowId) -> PlatformResult<Vec<WindowId>> {
        self.with_form_read(container, |form| {
            Ok(form.mdi.as_ref().map(|mdi| mdi.children.clone()).unwrap_or_default())
        })
    }

    pub fn active_mdi_child(&self, container: WindowId) -> PlatformResult<Option<WindowId>> {
        self.with_form_read(container, |form| {
            Ok(form.mdi.as_ref().and_then(|mdi| mdi.active_child))
        })
    }

    pub fn set_is_mdi_container(&mut self, window_id: WindowId, value: bool) -> PlatformResult<()> {
        let (is_container, is_child, handle) = self.with_form_read(window_id, |form| {
            Ok((form.is_mdi_container(), form.is_mdi_child(), form.handle))
        })?;
        if is_container == value {
            return Ok(());
        }
        if value {
            if is_child {
                return Err(PlatformError::InvalidArgument(format!(
                    "MDI child {window_id:?} cannot be an MDI container"
                )));
            }
            self.form_mut(window_id)?.mdi = Some(MdiContainerData::default());
            log::debug!("Mdi: {window_id:?} is now an MDI container");
            if handle.is_some() {
                self.create_mdi_client(window_id)?;
                self.update_menu_handles(window_id, true)?;
            }
            return Ok(());
        }

        if let Some(active) = self.active_mdi_child(window_id)? {
            if let Some(mdi) = self.form_mut(window_id)?.mdi.as_mut() {
                mdi.active_child = None;
            }
            self.deactivate_mdi_child(active);
        }
        for child in self.mdi_children(window_id)? {
            self.dispose(child)?;
        }
        let client = self
            .form_mut(window_id)?
            .mdi
            .take()
            .and_then(|mdi| mdi.client_handle);
        if let Some(client) = client {
            self.handle_map.remove(&client);
            if self.host.is_window(client) {
                for gone in self.host.destroy_window(client)? {
                    self.on_native_destroyed(gone);
                }
            }
        }
        log::debug!("Mdi: {window_id:?} is no longer an MDI container");
        if handle.is_some() {
            self.update_menu_handles(window_id, true)?;
        }
        Ok(())
    }

    /// Creates the client area of a realized container if it does not exist yet.
    pub(crate) fn create_mdi_client(&mut self, container: WindowId) -> PlatformResult<()> {
        let (handle, client) = self.with_form_read(container, |form| {
            Ok((form.handle, form.mdi.as_ref().and_then(|mdi| mdi.client_handle)))
        })?;
        let Some(handle) = handle else {
            return Ok(());
        };
        if client.is_some_and(|client| self.host.is_window(client)) {
            return Ok(());
        }
        let mut params = CreateParams::new(WindowClass::MdiClient);
        params.style = WindowStyles::CHILD
            | WindowStyles::VISIBLE
            | WindowStyles::CLIPCHILDREN
            | WindowStyles::CLIPSIBLINGS;
        params.ex_style = ExtendedStyles::CLIENTEDGE;
        params.parent = Some(handle);
        let client = self.host.create_window(&params)?;
        self.handle_map.insert(client, HandleTarget::MdiClient(container));
        if let Some(mdi) = self.form_mut(container)?.mdi.as_mut() {
            mdi.client_handle = Some(client);
        }
        log::debug!("Mdi: Client area {client:?} created for {container:?}");
        Ok(())
    }

    /*
     * Moves a window into (or out of) an MDI container. A realized window is
     * recreated so its native parent matches.
     */
    pub fn set_mdi_parent(
        &mut self,
        child: WindowId,
        parent: Option<WindowId>,
    ) -> PlatformResult<()> {
        let (previous, child_is_container, has_owner, owns_windows, handle) =
            self.with_form_read(child, |form| {
                Ok((
                    form.mdi_parent,
                    form.is_mdi_container(),
                    form.owner.is_some(),
                    !form.owned.is_empty(),
                    form.handle,
                ))
            })?;
        if let Some(parent) = parent {
            if parent == child {
                return Err(PlatformError::InvalidArgument(format!(
                    "{child:?} cannot be its own MDI parent"
                )));
            }
            let parent_form = self.windows.get(&parent).ok_or_else(|| {
                PlatformError::InvalidHandle(format!("MDI parent {parent:?} not found"))
            })?;
            if !parent_form.is_mdi_container() {
                return Err(PlatformError::InvalidArgument(format!(
                    "{parent:?} is not an MDI container"
                )));
            }
            if child_is_container {
                return Err(PlatformError::InvalidArgument(format!(
                    "MDI container {child:?} cannot be an MDI child"
                )));
            }
            if has_owner || owns_windows {
                return Err(PlatformError::InvalidArgument(format!(
                    "{child:?} takes part in an owner relationship and cannot be an MDI child"
                )));
            }
        }
        if previous == parent {
            return Ok(());
        }

        if let Some(previous) = previous {
            self.detach_mdi_child(previous, child)?;
        }
        self.invalidate_merged_menu(child);
        self.form_mut(child)?.mdi_parent = parent;
        if let Some(parent) = parent
            && let Some(mdi) = self.form_mut(parent)?.mdi.as_mut()
            && !mdi.children.contains(&child)
        {
            mdi.children.push(child);
        }
        log::debug!("Mdi: MDI parent of {child:?} is now {parent:?}");

        if handle.is_some() {
            self.recreate_handle(child)?;
        }
        if let Some(previous) = previous {
            self.update_menu_handles(previous, true)?;
        }
        Ok(())
    }

    fn detach_mdi_child(&mut self, container: WindowId, child: WindowId) -> PlatformResult<()> {
        let was_active = match self.windows.get_mut(&container).and_then(|form| form.mdi.as_mut()) {
            Some(mdi) => {
                mdi.children.retain(|existing| *existing != child);
                mdi.active_child == Some(child)
            }
            None => false,
        };
        if was_active {
            self.activate_next_mdi_child(container, child)?;
        }
        Ok(())
    }

    /// Activates `child`, which must belong to `container`.
    pub fn activate_mdi_child(
        &mut self,
        container: WindowId,
        child: WindowId,
    ) -> PlatformResult<()> {
        let client = self.with_form_read(container, |form| {
            match form.mdi.as_ref() {
                Some(mdi) if mdi.children.contains(&child) => Ok(mdi.client_handle),
                _ => Err(PlatformError::InvalidArgument(format!(
                    "{child:?} is not an MDI child of {container:?}"
                ))),
            }
        })?;
        if let (Some(client), Some(handle)) = (client, self.handle(child)?) {
            self.host.mdi_activate(client, handle)?;
        }
        self.set_active_mdi_child(container, Some(child))
    }

    /*
     * Records the new active child and raises the activation notifications.
     * Setting the child that is already active does nothing.
     */
    pub(crate) fn set_active_mdi_child(
        &mut self,
        container: WindowId,
        child: Option<WindowId>,
    ) -> PlatformResult<()> {
        let (previous, container_active, container_handle) = self.with_form_read(container, |form| {
            Ok((
                form.mdi.as_ref().and_then(|mdi| mdi.active_child),
                form.active,
                form.handle,
            ))
        })?;
        // A child whose handle was recreated is still named but no longer active.
        let child_active = child
            .and_then(|child| self.windows.get(&child))
            .is_none_or(|form| form.active);
        if previous == child && child_active {
            return Ok(());
        }
        log::debug!("Mdi: {container:?} active child {previous:?} -> {child:?}");

        if let Some(previous) = previous {
            self.deactivate_mdi_child(previous);
        }
        if let Some(mdi) = self.form_mut(container)?.mdi.as_mut() {
            mdi.active_child = child;
        }

        match child {
            Some(child) => {
                let (newly_active, handle) = self.with_form_write(child, |form| {
                    form.mdi_focusable = true;
                    Ok((!std::mem::replace(&mut form.active, true), form.handle))
                })?;
                if let Some(handle) = handle {
                    self.host.set_focus(handle)?;
                }
                if newly_active {
                    self.raise(child, |observers| &observers.activated);
                }
            }
            None => {
                if let (true, Some(handle)) = (container_active, container_handle) {
                    self.host.set_focus(handle)?;
                }
            }
        }

        let mut args = MdiChildActivateArgs { active: child };
        self.raise_with(container, &mut args, |observers| &observers.mdi_child_activate);
        self.update_menu_handles(container, true)?;
        if let Some(previous) = previous {
            self.invalidate_merged_menu(previous);
        }
        Ok(())
    }

    fn deactivate_mdi_child(&mut self, child: WindowId) {
        let Some(form) = self.windows.get_mut(&child) else {
            return;
        };
        form.mdi_focusable = false;
        let was_active = std::mem::replace(&mut form.active, false);
        if was_active && !form.transient.closing {
            self.raise(child, |observers| &observers.deactivate);
        }
    }

    /// Activates the first other visible child, or none.
    pub(crate) fn activate_next_mdi_child(
        &mut self,
        container: WindowId,
        excluding: WindowId,
    ) -> PlatformResult<()> {
        let next = self
            .mdi_children(container)?
            .into_iter()
            .find(|candidate| {
                *candidate != excluding
                    && self.windows.get(candidate).is_some_and(|form| form.visible)
            });
        match next {
            Some(next) => self.activate_mdi_child(container, next),
            None => self.set_active_mdi_child(container, None),
        }
    }

    /*
     * Native activation notification received by an MDI child. The platform
     * sends it to both the child losing and the child gaining activation.
     */
    pub(crate) fn handle_mdi_activate(
        &mut self,
        child: WindowId,
        handle: NativeHandle,
        deactivated: Option<NativeHandle>,
        activated: Option<NativeHandle>,
    ) -> Reply {
        let Some(container) = self.windows.get(&child).and_then(|form| form.mdi_parent) else {
            return Reply::Default;
        };
        let result = if activated == Some(handle) {
            self.set_active_mdi_child(container, Some(child))
        } else if deactivated == Some(handle) {
            if activated.is_none() {
                self.set_active_mdi_child(container, None)
            } else {
                self.deactivate_mdi_child(child);
                Ok(())
            }
        } else {
            Ok(())
        };
        if let Err(e) = result {
            log::warn!("Mdi: Activation change for {child:?} failed: {e}");
        }
        Reply::Default
    }
}
