/*
 * Menu bars: assignment, MDI merging, native application and the menu-loop
 * notifications.
 *
 * A container with an active child displays the child's merged menu (parent
 * items followed by child items, subject to merge order and merge type). The
 * merged menu is built lazily, cached on the child and thrown away whenever
 * either source menu changes. Applying menus natively can be suspended; while
 * suspended, requests only mark the window as needing an update and the last
 * resume performs a single one.
 */

use crate::app::FormManager;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::{MenuCommandArgs, MenuLoopArgs};
use crate::menu::{self, Menu, MenuHandler, MenuItem};
use crate::native::{NativeEvent, NativeMessage, Reply};
use crate::types::{MenuActionId, MenuHandle, MenuId, WindowId};

/// Menu-char reply asking the platform to execute the item at the given index.
const MENU_CHAR_EXECUTE: isize = 2;

impl FormManager {
    pub fn create_menu(&mut self, items: Vec<MenuItem>) -> MenuId {
        let menu_id = self.allocate_menu_id();
        self.menus.insert(menu_id, Menu::new(items, false));
        log::debug!("MenuMerge: Created {menu_id:?}");
        menu_id
    }

    fn menu_entry(&self, menu_id: MenuId) -> PlatformResult<&Menu> {
        self.menus
            .get(&menu_id)
            .ok_or_else(|| PlatformError::InvalidHandle(format!("Menu {menu_id:?} not found")))
    }

    pub fn menu_items(&self, menu_id: MenuId) -> PlatformResult<Vec<MenuItem>> {
        Ok(self.menu_entry(menu_id)?.items.clone())
    }

    /*
     * Replaces the items of a menu. Its native handle and every merged menu built
     * from it are discarded, and windows showing it are refreshed.
     */
    pub fn set_menu_items(&mut self, menu_id: MenuId, items: Vec<MenuItem>) -> PlatformResult<()> {
        let stale = {
            let entry = self.menus.get_mut(&menu_id).ok_or_else(|| {
                PlatformError::InvalidHandle(format!("Menu {menu_id:?} not found"))
            })?;
            entry.items = items;
            entry.handle.take()
        };
        if let Some(stale) = stale {
            self.host.destroy_menu(stale);
        }
        let users: Vec<WindowId> = self
            .windows
            .values()
            .filter(|form| form.menu == Some(menu_id))
            .map(|form| form.id)
            .collect();
        for window_id in users {
            self.menu_source_changed(window_id)?;
        }
        Ok(())
    }

    pub fn menu(&self, window_id: WindowId) -> PlatformResult<Option<MenuId>> {
        self.with_form_read(window_id, |form| Ok(form.menu))
    }

    pub fn set_menu(&mut self, window_id: WindowId, menu_id: Option<MenuId>) -> PlatformResult<()> {
        if let Some(menu_id) = menu_id
            && self.menu_entry(menu_id)?.merged
        {
            return Err(PlatformError::InvalidArgument(format!(
                "Merged menu {menu_id:?} cannot be assigned to a window"
            )));
        }
        let changed = self.with_form_write(window_id, |form| {
            Ok(std::mem::replace(&mut form.menu, menu_id) != menu_id)
        })?;
        if changed {
            log::debug!("MenuMerge: {window_id:?} menu is now {menu_id:?}");
            self.menu_source_changed(window_id)?;
        }
        Ok(())
    }

    /// Drops merged menus that depend on `window_id`'s menu and refreshes the
    /// menu bar that shows it.
    fn menu_source_changed(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let (mdi_parent, children) = self.with_form_read(window_id, |form| {
            Ok((
                form.mdi_parent,
                form.mdi.as_ref().map(|mdi| mdi.children.clone()).unwrap_or_default(),
            ))
        })?;
        match mdi_parent {
            Some(_) => self.invalidate_merged_menu(window_id),
            None => {
                for child in children {
                    self.invalidate_merged_menu(child);
                }
            }
        }
        self.update_menu_handles(window_id, true)
    }

    /*
     * The menu the window's menu bar shows: the active child's merged menu for a
     * container, nothing for an MDI child, the window's own menu otherwise.
     */
    pub fn display_menu(&mut self, window_id: WindowId) -> PlatformResult<Option<MenuId>> {
        let (own, is_child, active_child) = self.with_form_read(window_id, |form| {
            Ok((
                form.menu,
                form.is_mdi_child(),
                form.mdi.as_ref().and_then(|mdi| mdi.active_child),
            ))
        })?;
        if is_child {
            return Ok(None);
        }
        match active_child {
            Some(child) => self.merged_menu_for(child),
            None => Ok(own),
        }
    }

    pub(crate) fn merged_menu_for(&mut self, child: WindowId) -> PlatformResult<Option<MenuId>> {
        let (parent, child_menu, cached) = self.with_form_read(child, |form| {
            Ok((form.mdi_parent, form.menu, form.merged_menu))
        })?;
        let parent_menu = match parent {
            Some(parent) => self.menu(parent)?,
            None => None,
        };
        let (parent_menu, child_menu) = match (parent_menu, child_menu) {
            (None, None) => return Ok(None),
            (Some(only), None) | (None, Some(only)) => return Ok(Some(only)),
            (Some(parent_menu), Some(child_menu)) => (parent_menu, child_menu),
        };
        if let Some(cached) = cached
            && self.menus.contains_key(&cached)
        {
            return Ok(Some(cached));
        }

        let items = menu::merge_items(
            &self.menu_entry(parent_menu)?.items,
            &self.menu_entry(child_menu)?.items,
        );
        let merged_id = self.allocate_menu_id();
        self.menus.insert(merged_id, Menu::new(items, true));
        self.form_mut(child)?.merged_menu = Some(merged_id);
        log::debug!(
            "MenuMerge: Built {merged_id:?} from {parent_menu:?} and {child_menu:?} for {child:?}"
        );
        Ok(Some(merged_id))
    }

    pub(crate) fn invalidate_merged_menu(&mut self, child: WindowId) {
        let Some(merged) = self
            .windows
            .get_mut(&child)
            .and_then(|form| form.merged_menu.take())
        else {
            return;
        };
        if let Some(entry) = self.menus.remove(&merged)
            && let Some(handle) = entry.handle
        {
            self.host.destroy_menu(handle);
        }
        log::trace!("MenuMerge: Dropped merged {merged:?} of {child:?}");
    }

    fn ensure_menu_handle(&mut self, menu_id: MenuId) -> PlatformResult<MenuHandle> {
        let entry = self.menu_entry(menu_id)?;
        if let Some(handle) = entry.handle {
            return Ok(handle);
        }
        let native = menu::to_native(&entry.items);
        let handle = self.host.create_menu(&native)?;
        if let Some(entry) = self.menus.get_mut(&menu_id) {
            entry.handle = Some(handle);
        }
        Ok(handle)
    }

    /*
     * Pushes the displayed menu to the native window. MDI children delegate to
     * their container; a container without any menu gets an empty placeholder so
     * the client area keeps a frame menu.
     */
    pub(crate) fn update_menu_handles(
        &mut self,
        window_id: WindowId,
        force: bool,
    ) -> PlatformResult<()> {
        let (mdi_parent, handle, suspended, client) = self.with_form_write(window_id, |form| {
            let suspended = form.transient.menu_update_suspend_count > 0;
            if suspended && form.mdi_parent.is_none() {
                form.transient.menu_update_pending = true;
                form.transient.menu_update_force_redraw |= force;
            }
            Ok((
                form.mdi_parent,
                form.handle,
                suspended,
                form.mdi.as_ref().and_then(|mdi| mdi.client_handle),
            ))
        })?;
        if let Some(parent) = mdi_parent {
            return self.update_menu_handles(parent, force);
        }
        if suspended {
            log::trace!("MenuMerge: Update of {window_id:?} deferred");
            return Ok(());
        }
        let Some(handle) = handle else {
            return Ok(());
        };

        let native = match self.display_menu(window_id)? {
            Some(menu_id) => Some(self.ensure_menu_handle(menu_id)?),
            None => None,
        };
        let stale_dummy = match (client, native) {
            (Some(client), Some(menu)) => {
                self.host.mdi_set_menu(client, menu, None)?;
                self.form_mut(window_id)?.dummy_menu.take()
            }
            (Some(client), None) => {
                let existing = self.form(window_id)?.dummy_menu;
                let dummy = match existing {
                    Some(dummy) => dummy,
                    None => {
                        let dummy = self.host.create_menu(&[])?;
                        self.form_mut(window_id)?.dummy_menu = Some(dummy);
                        dummy
                    }
                };
                self.host.mdi_set_menu(client, dummy, None)?;
                None
            }
            (None, native) => {
                self.host.set_menu(handle, native)?;
                self.form_mut(window_id)?.dummy_menu.take()
            }
        };
        if let Some(stale) = stale_dummy {
            self.host.destroy_menu(stale);
        }
        self.form_mut(window_id)?.applied_menu = native;
        if force {
            self.host.draw_menu_bar(handle)?;
        }
        log::debug!("MenuMerge: {window_id:?} shows native menu {native:?}");
        Ok(())
    }

    fn menu_update_target(&self, window_id: WindowId) -> PlatformResult<WindowId> {
        Ok(self.form(window_id)?.mdi_parent.unwrap_or(window_id))
    }

    /// Defers native menu updates until the matching `resume_menu_updates`.
    pub fn suspend_menu_updates(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let target = self.menu_update_target(window_id)?;
        self.form_mut(target)?.transient.menu_update_suspend_count += 1;
        Ok(())
    }

    pub fn resume_menu_updates(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let target = self.menu_update_target(window_id)?;
        let flush = self.with_form_write(target, |form| {
            let transient = &mut form.transient;
            if transient.menu_update_suspend_count == 0 {
                return Err(PlatformError::InvalidOperation(format!(
                    "Menu updates of {target:?} are not suspended"
                )));
            }
            transient.menu_update_suspend_count -= 1;
            if transient.menu_update_suspend_count == 0
                && std::mem::take(&mut transient.menu_update_pending)
            {
                Ok(Some(std::mem::take(&mut transient.menu_update_force_redraw)))
            } else {
                Ok(None)
            }
        })?;
        match flush {
            Some(force) => self.update_menu_handles(target, force),
            None => Ok(()),
        }
    }

    pub fn on_menu_popup(
        &mut self,
        menu_id: MenuId,
        handler: impl Fn(&mut FormManager, MenuId) + 'static,
    ) -> PlatformResult<()> {
        let entry = self.menus.get_mut(&menu_id).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("Menu {menu_id:?} not found"))
        })?;
        entry.on_popup.push(std::rc::Rc::new(handler));
        Ok(())
    }

    pub fn on_menu_collapse(
        &mut self,
        menu_id: MenuId,
        handler: impl Fn(&mut FormManager, MenuId) + 'static,
    ) -> PlatformResult<()> {
        let entry = self.menus.get_mut(&menu_id).ok_or_else(|| {
            PlatformError::InvalidHandle(format!("Menu {menu_id:?} not found"))
        })?;
        entry.on_collapse.push(std::rc::Rc::new(handler));
        Ok(())
    }

    fn menu_for_handle(&self, handle: MenuHandle) -> Option<MenuId> {
        self.menus
            .iter()
            .find(|(_, entry)| entry.handle == Some(handle))
            .map(|(menu_id, _)| *menu_id)
    }

    fn raise_menu(&mut self, menu_id: MenuId, select: fn(&Menu) -> &Vec<MenuHandler>) {
        let handlers = match self.menus.get(&menu_id) {
            Some(entry) => select(entry).clone(),
            None => return,
        };
        for handler in handlers {
            handler(self, menu_id);
        }
    }

    pub(crate) fn handle_init_menu_popup(
        &mut self,
        window_id: WindowId,
        handle: MenuHandle,
    ) -> Reply {
        let menu_id = self.menu_for_handle(handle);
        let mut args = MenuLoopArgs { menu: menu_id };
        self.raise_with(window_id, &mut args, |observers| &observers.menu_start);
        if let Some(menu_id) = menu_id {
            self.raise_menu(menu_id, |entry| &entry.on_popup);
        }
        Reply::Default
    }

    pub(crate) fn handle_uninit_menu_popup(
        &mut self,
        window_id: WindowId,
        handle: MenuHandle,
    ) -> Reply {
        let menu_id = self.menu_for_handle(handle);
        if let Some(menu_id) = menu_id {
            self.raise_menu(menu_id, |entry| &entry.on_collapse);
        }
        let mut args = MenuLoopArgs { menu: menu_id };
        self.raise_with(window_id, &mut args, |observers| &observers.menu_complete);
        Reply::Default
    }

    /*
     * Resolves a mnemonic typed while a menu is open. An MDI child without a menu
     * of its own lets its container answer.
     */
    pub(crate) fn handle_menu_char(&mut self, window_id: WindowId, ch: char) -> Reply {
        let Ok((own, mdi_parent)) =
            self.with_form_read(window_id, |form| Ok((form.menu, form.mdi_parent)))
        else {
            return Reply::Default;
        };
        let searched = match (mdi_parent, own) {
            (Some(parent), None) => {
                return match self.handle(parent).ok().flatten() {
                    Some(parent_handle) => self.dispatch(&mut NativeEvent::new(
                        parent_handle,
                        NativeMessage::MenuChar { ch },
                    )),
                    None => Reply::Default,
                };
            }
            (Some(_), Some(own)) => Some(own),
            (None, _) => self.display_menu(window_id).ok().flatten(),
        };
        let index = searched
            .and_then(|menu_id| self.menus.get(&menu_id))
            .and_then(|entry| menu::find_mnemonic(&entry.items, ch));
        match index {
            Some(index) => Reply::Value((MENU_CHAR_EXECUTE << 16) | index as isize),
            None => Reply::Default,
        }
    }

    pub(crate) fn handle_menu_command(
        &mut self,
        window_id: WindowId,
        action: MenuActionId,
    ) -> Reply {
        let mut args = MenuCommandArgs { action };
        self.raise_with(window_id, &mut args, |observers| &observers.menu_command);
        Reply::Value(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessHost, HostCall};
    use crate::types::{FormConfig, HostEnvironment};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager_with_probe() -> (FormManager, HeadlessHost) {
        let host = HeadlessHost::new();
        let manager = FormManager::new(Box::new(host.clone()), HostEnvironment::default());
        (manager, host)
    }

    fn texts(items: &[MenuItem]) -> Vec<String> {
        items.iter().map(|item| item.text.clone()).collect()
    }

    fn container_with_child(manager: &mut FormManager) -> (WindowId, WindowId, MenuId, MenuId) {
        let container = manager.create_form(FormConfig::default());
        manager.set_is_mdi_container(container, true).unwrap();
        let parent_menu =
            manager.create_menu(vec![MenuItem::new("&File"), MenuItem::new("&Window")]);
        manager.set_menu(container, Some(parent_menu)).unwrap();
        let child = manager.create_form(FormConfig::default());
        manager.set_mdi_parent(child, Some(container)).unwrap();
        let child_menu = manager.create_menu(vec![MenuItem::new("&Edit")]);
        manager.set_menu(child, Some(child_menu)).unwrap();
        manager.show(container).unwrap();
        (container, child, parent_menu, child_menu)
    }

    #[test]
    fn active_child_menu_is_merged_into_container() {
        let (mut manager, probe) = manager_with_probe();
        let (container, child, parent_menu, _) = container_with_child(&mut manager);
        assert_eq!(manager.display_menu(container).unwrap(), Some(parent_menu));

        manager.show(child).unwrap();
        let merged = manager.display_menu(container).unwrap().unwrap();
        assert_ne!(merged, parent_menu);
        assert_eq!(texts(&manager.menu_items(merged).unwrap()), vec!["&File", "&Window", "&Edit"]);
        let frame = manager.handle(container).unwrap().unwrap();
        let shown = probe.window(frame).unwrap().menu.unwrap();
        let native: Vec<String> = probe
            .menu_items(shown)
            .unwrap()
            .into_iter()
            .map(|item| item.text)
            .collect();
        assert_eq!(native, vec!["&File", "&Window", "&Edit"]);

        manager.hide(child).unwrap();
        assert_eq!(manager.display_menu(container).unwrap(), Some(parent_menu));
    }

    #[test]
    fn changing_child_items_rebuilds_the_merge() {
        let (mut manager, _) = manager_with_probe();
        let (container, child, _, child_menu) = container_with_child(&mut manager);
        manager.show(child).unwrap();
        let first = manager.display_menu(container).unwrap().unwrap();

        manager
            .set_menu_items(child_menu, vec![MenuItem::new("&Format")])
            .unwrap();

        let second = manager.display_menu(container).unwrap().unwrap();
        assert_ne!(first, second);
        assert!(manager.menu_items(first).is_err());
        assert_eq!(
            texts(&manager.menu_items(second).unwrap()),
            vec!["&File", "&Window", "&Format"]
        );
    }

    #[test]
    fn container_without_menu_gets_placeholder() {
        let (mut manager, probe) = manager_with_probe();
        let container = manager.create_form(FormConfig::default());
        manager.set_is_mdi_container(container, true).unwrap();
        manager.show(container).unwrap();

        let placeholder = manager.form(container).unwrap().dummy_menu.unwrap();
        assert_eq!(probe.menu_items(placeholder), Some(Vec::new()));

        let menu = manager.create_menu(vec![MenuItem::new("&File")]);
        manager.set_menu(container, Some(menu)).unwrap();
        assert!(manager.form(container).unwrap().dummy_menu.is_none());
        assert!(probe.calls().contains(&HostCall::DestroyMenu(placeholder)));
    }

    #[test]
    fn nested_suspension_flushes_once() {
        let (mut manager, probe) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        manager.show(form).unwrap();
        let first = manager.create_menu(vec![MenuItem::new("&File")]);
        let second = manager.create_menu(vec![MenuItem::new("&View")]);
        probe.clear_calls();

        manager.suspend_menu_updates(form).unwrap();
        manager.suspend_menu_updates(form).unwrap();
        manager.set_menu(form, Some(first)).unwrap();
        manager.set_menu(form, Some(second)).unwrap();
        manager.resume_menu_updates(form).unwrap();
        assert_eq!(probe.count_calls(|call| matches!(call, HostCall::SetMenu { .. })), 0);
        manager.resume_menu_updates(form).unwrap();

        assert_eq!(probe.count_calls(|call| matches!(call, HostCall::SetMenu { .. })), 1);
        assert_eq!(probe.count_calls(|call| matches!(call, HostCall::DrawMenuBar(_))), 1);
        assert!(matches!(
            manager.resume_menu_updates(form),
            Err(PlatformError::InvalidOperation(_))
        ));
    }

    #[test]
    fn mnemonics_resolve_through_container() {
        let (mut manager, _) = manager_with_probe();
        let (container, child, _, _) = container_with_child(&mut manager);
        let plain_child = manager.create_form(FormConfig::default());
        manager.set_mdi_parent(plain_child, Some(container)).unwrap();
        manager.show(plain_child).unwrap();
        let container_handle = manager.handle(container).unwrap().unwrap();
        let plain_handle = manager.handle(plain_child).unwrap().unwrap();

        let reply = manager.dispatch(&mut NativeEvent::new(
            container_handle,
            NativeMessage::MenuChar { ch: 'W' },
        ));
        assert_eq!(reply, Reply::Value((2 << 16) | 1));

        let forwarded = manager.dispatch(&mut NativeEvent::new(
            plain_handle,
            NativeMessage::MenuChar { ch: 'f' },
        ));
        assert_eq!(forwarded, Reply::Value(2 << 16));
        assert!(manager.menu(child).unwrap().is_some());
    }

    #[test]
    fn popup_notifications_reach_form_and_menu() {
        let (mut manager, _) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        let menu_id = manager.create_menu(vec![MenuItem::new("&File")]);
        manager.set_menu(form, Some(menu_id)).unwrap();
        manager.show(form).unwrap();
        let handle = manager.handle(form).unwrap().unwrap();
        let native_menu = manager.menus[&menu_id].handle.unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        let (a, b, c, d) = (log.clone(), log.clone(), log.clone(), log.clone());
        manager
            .on_menu_start(form, move |_, _, args| {
                a.borrow_mut().push(format!("start {:?}", args.menu))
            })
            .unwrap();
        manager
            .on_menu_complete(form, move |_, _, _| b.borrow_mut().push("complete".to_string()))
            .unwrap();
        manager
            .on_menu_popup(menu_id, move |_, _| c.borrow_mut().push("popup".to_string()))
            .unwrap();
        manager
            .on_menu_collapse(menu_id, move |_, _| d.borrow_mut().push("collapse".to_string()))
            .unwrap();

        manager.dispatch(&mut NativeEvent::new(
            handle,
            NativeMessage::InitMenuPopup { menu: native_menu },
        ));
        manager.dispatch(&mut NativeEvent::new(
            handle,
            NativeMessage::UninitMenuPopup { menu: native_menu },
        ));

        assert_eq!(
            *log.borrow(),
            vec![
                format!("start {:?}", Some(menu_id)),
                "popup".to_string(),
                "collapse".to_string(),
                "complete".to_string()
            ]
        );
    }
}
