/*
 * Window icon handling.
 *
 * Each manager caches the default icon of its own native host. It is loaded on
 * first use; `release_default_icon` drops the cached handle so the next use
 * reloads it. The small icon shown in the caption is derived lazily per window;
 * failures to derive it are cosmetic and fall back to no small icon.
 */

use crate::app::FormManager;
use crate::error::Result as PlatformResult;
use crate::types::{IconHandle, WindowId};

impl FormManager {
    /// Returns the host's default icon, loading it on first use.
    pub(crate) fn default_icon(&mut self) -> PlatformResult<IconHandle> {
        if let Some(icon) = self.default_icon {
            return Ok(icon);
        }
        let icon = self.host.load_default_icon()?;
        log::debug!("Icon: Loaded default icon {icon:?}");
        self.default_icon = Some(icon);
        Ok(icon)
    }

    /*
     * Forgets the cached default icon and returns it so the embedder can free the
     * native resource. Windows already showing it keep their handle until their
     * icons are next applied.
     */
    pub fn release_default_icon(&mut self) -> Option<IconHandle> {
        self.default_icon.take()
    }

    pub fn icon(&self, window_id: WindowId) -> PlatformResult<Option<IconHandle>> {
        self.with_form_read(window_id, |form| Ok(form.icon))
    }

    /// Sets an explicit icon; `None` returns to the shared default.
    pub fn set_icon(
        &mut self,
        window_id: WindowId,
        icon: Option<IconHandle>,
    ) -> PlatformResult<()> {
        self.with_form_write(window_id, |form| {
            form.icon = icon;
            form.small_icon = None;
            Ok(())
        })?;
        self.apply_icons(window_id)
    }

    pub fn set_show_icon(&mut self, window_id: WindowId, show: bool) -> PlatformResult<()> {
        let changed = self.with_form_write(window_id, |form| Ok(form.flags.set_show_icon(show)))?;
        if changed {
            self.apply_icons(window_id)?;
        }
        Ok(())
    }

    /*
     * Pushes the big and small icon to the native window. Called after every handle
     * creation and whenever the icon or its visibility changes.
     */
    pub(crate) fn apply_icons(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (handle, show_icon, explicit, cached_small) = self.with_form_read(window_id, |form| {
            Ok((form.handle, form.flags.show_icon(), form.icon, form.small_icon))
        })?;
        let Some(handle) = handle else {
            return Ok(());
        };
        if !show_icon {
            return self.host.set_icons(handle, None, None);
        }

        let big = match explicit {
            Some(icon) => Some(icon),
            None => match self.default_icon() {
                Ok(icon) => Some(icon),
                Err(e) => {
                    log::warn!("Icon: No default icon available for {window_id:?}: {e}");
                    None
                }
            },
        };

        let small = match (cached_small, big) {
            (Some(small), _) => Some(small),
            (None, Some(big)) => match self.host.derive_small_icon(big) {
                Ok(small) => {
                    self.with_form_write(window_id, |form| {
                        form.small_icon = Some(small);
                        Ok(())
                    })?;
                    Some(small)
                }
                Err(e) => {
                    log::warn!("Icon: Small icon unavailable for {window_id:?}, using none: {e}");
                    None
                }
            },
            (None, None) => None,
        };

        self.host.set_icons(handle, big, small)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessHost, HostCall};
    use crate::types::{FormConfig, HostEnvironment};

    fn manager_with_probe() -> (FormManager, HeadlessHost) {
        let host = HeadlessHost::new();
        let manager = FormManager::new(Box::new(host.clone()), HostEnvironment::default());
        (manager, host)
    }

    #[test]
    fn default_icon_is_cached_until_released() {
        let (mut manager, probe) = manager_with_probe();
        probe.set_default_icon(IconHandle(3));
        let icon = manager.default_icon().expect("default icon");
        assert_eq!(icon, IconHandle(3));

        probe.set_default_icon(IconHandle(4));
        assert_eq!(manager.default_icon().unwrap(), icon);
        assert_eq!(manager.release_default_icon(), Some(icon));
        assert_eq!(manager.default_icon().unwrap(), IconHandle(4));
    }

    #[test]
    fn each_manager_uses_its_own_hosts_default_icon() {
        let (mut first, first_probe) = manager_with_probe();
        let (mut second, second_probe) = manager_with_probe();
        first_probe.set_default_icon(IconHandle(10));
        second_probe.set_default_icon(IconHandle(20));
        let first_form = first.create_form(FormConfig::default());
        let second_form = second.create_form(FormConfig::default());

        first.create_control(first_form).unwrap();
        second.create_control(second_form).unwrap();

        let first_handle = first.handle(first_form).unwrap().unwrap();
        let second_handle = second.handle(second_form).unwrap().unwrap();
        assert_eq!(first_probe.window(first_handle).unwrap().icons.0, Some(IconHandle(10)));
        assert_eq!(second_probe.window(second_handle).unwrap().icons.0, Some(IconHandle(20)));
    }

    #[test]
    fn small_icon_failure_falls_back_to_none() {
        let (mut manager, probe) = manager_with_probe();
        probe.set_fail_small_icons(true);
        let form = manager.create_form(FormConfig::default());
        let explicit = IconHandle(42);
        manager.set_icon(form, Some(explicit)).unwrap();

        manager.create_control(form).expect("handle created despite icon failure");
        let handle = manager.handle(form).unwrap().unwrap();

        assert_eq!(probe.window(handle).unwrap().icons, (Some(explicit), None));
    }

    #[test]
    fn small_icon_is_derived_once_per_icon() {
        let (mut manager, probe) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        manager.set_icon(form, Some(IconHandle(7))).unwrap();
        manager.create_control(form).unwrap();
        let handle = manager.handle(form).unwrap().unwrap();

        manager.set_show_icon(form, false).unwrap();
        assert_eq!(probe.window(handle).unwrap().icons, (None, None));

        manager.set_show_icon(form, true).unwrap();
        assert_eq!(
            probe.window(handle).unwrap().icons,
            (Some(IconHandle(7)), Some(IconHandle(7 + 0x1000)))
        );
        assert!(probe.count_calls(|call| matches!(call, HostCall::SetIcons { .. })) >= 3);
    }
}
