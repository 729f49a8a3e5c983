/*
 * Owner / owned relationships between top-level windows.
 *
 * The relation is kept symmetric: `owner` on one side, the `owned` list on the
 * other. It is acyclic and never involves MDI children. When both windows have
 * handles the native owner link follows the logical one.
 */

use crate::app::FormManager;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::types::WindowId;

impl FormManager {
    pub fn owner(&self, window_id: WindowId) -> PlatformResult<Option<WindowId>> {
        self.with_form_read(window_id, |form| Ok(form.owner))
    }

    pub fn owned_forms(&self, window_id: WindowId) -> PlatformResult<Vec<WindowId>> {
        self.with_form_read(window_id, |form| Ok(form.owned.clone()))
    }

    pub(crate) fn validate_owner(
        &self,
        window_id: WindowId,
        owner: WindowId,
    ) -> PlatformResult<()> {
        if owner == window_id {
            return Err(PlatformError::InvalidArgument(format!(
                "{window_id:?} cannot own itself"
            )));
        }
        let owner_form = self.windows.get(&owner).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("Owner {owner:?} not found"))
        })?;
        if owner_form.is_mdi_child() {
            return Err(PlatformError::InvalidArgument(format!(
                "MDI child {owner:?} cannot own other windows"
            )));
        }
        if self.form(window_id)?.is_mdi_child() {
            return Err(PlatformError::InvalidArgument(format!(
                "MDI child {window_id:?} cannot have an owner"
            )));
        }
        let mut current = Some(owner);
        while let Some(ancestor) = current {
            if ancestor == window_id {
                return Err(PlatformError::InvalidArgument(format!(
                    "Owning {window_id:?} by {owner:?} would create a cycle"
                )));
            }
            current = self.windows.get(&ancestor).and_then(|form| form.owner);
        }
        Ok(())
    }

    /*
     * Sets or clears the owner. Validation happens before anything changes, so a
     * rejected request leaves every relationship as it was.
     */
    pub fn set_owner(
        &mut self,
        window_id: WindowId,
        owner: Option<WindowId>,
    ) -> PlatformResult<()> {
        let previous = self.owner(window_id)?;
        if let Some(owner) = owner {
            self.validate_owner(window_id, owner)?;
        }
        if previous == owner {
            return Ok(());
        }

        if let Some(previous) = previous
            && let Some(previous) = self.windows.get_mut(&previous)
        {
            previous.owned.retain(|owned| *owned != window_id);
        }
        self.form_mut(window_id)?.owner = owner;
        if let Some(owner) = owner {
            let owner_form = self.form_mut(owner)?;
            if !owner_form.owned.contains(&window_id) {
                owner_form.owned.push(window_id);
            }
        }
        log::debug!("FormManager: Owner of {window_id:?} is now {owner:?}");
        self.relink_native_owner(window_id)
    }

    /*
     * Points the native owner of `window_id` at its logical owner's handle, or at
     * the owner proxy when the window is kept out of the taskbar.
     */
    pub(crate) fn relink_native_owner(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (handle, owner, proxy) = self.with_form_read(window_id, |form| {
            Ok((form.handle, form.owner, form.owner_proxy))
        })?;
        let Some(handle) = handle else {
            return Ok(());
        };
        let native_owner = match owner {
            Some(owner) => self.handle(owner)?,
            None => proxy,
        };
        if self.host.owner(handle) != native_owner {
            self.host.set_owner(handle, native_owner)?;
        }
        Ok(())
    }
}
