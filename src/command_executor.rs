/*
 * Declarative command surface. A `FormCommand` names one mutating operation on
 * a window; `FormManager::execute_command` routes it to the matching operation.
 * Embedders that queue UI work as data (for example from a view model) can
 * hand the queue over here instead of calling each operation directly.
 */

use crate::app::FormManager;
use crate::error::Result as PlatformResult;
use crate::types::{BorderStyle, DialogResult, MenuId, Rect, WindowId, WindowState};

#[derive(Debug, Clone, PartialEq)]
pub enum FormCommand {
    Show { window_id: WindowId },
    Hide { window_id: WindowId },
    Close { window_id: WindowId },
    SetWindowState { window_id: WindowId, state: WindowState },
    SetBounds { window_id: WindowId, bounds: Rect },
    SetOwner { window_id: WindowId, owner: Option<WindowId> },
    SetMdiParent { window_id: WindowId, parent: Option<WindowId> },
    SetMdiContainer { window_id: WindowId, value: bool },
    ActivateMdiChild { container: WindowId, child: WindowId },
    SetMenu { window_id: WindowId, menu: Option<MenuId> },
    SetDialogResult { window_id: WindowId, result: DialogResult },
    SetTopMost { window_id: WindowId, value: bool },
    SetShowInTaskbar { window_id: WindowId, value: bool },
    SetBorderStyle { window_id: WindowId, style: BorderStyle },
    RecreateHandle { window_id: WindowId },
}

impl FormManager {
    pub fn execute_command(&mut self, command: FormCommand) -> PlatformResult<()> {
        log::trace!("CommandExecutor: Executing {command:?}");
        match command {
            FormCommand::Show { window_id } => execute_show(self, window_id),
            FormCommand::Hide { window_id } => self.hide(window_id),
            FormCommand::Close { window_id } => execute_close(self, window_id),
            FormCommand::SetWindowState { window_id, state } => {
                self.set_window_state(window_id, state)
            }
            FormCommand::SetBounds { window_id, bounds } => self.set_bounds(window_id, bounds),
            FormCommand::SetOwner { window_id, owner } => self.set_owner(window_id, owner),
            FormCommand::SetMdiParent { window_id, parent } => {
                execute_set_mdi_parent(self, window_id, parent)
            }
            FormCommand::SetMdiContainer { window_id, value } => {
                self.set_is_mdi_container(window_id, value)
            }
            FormCommand::ActivateMdiChild { container, child } => {
                self.activate_mdi_child(container, child)
            }
            FormCommand::SetMenu { window_id, menu } => self.set_menu(window_id, menu),
            FormCommand::SetDialogResult { window_id, result } => {
                self.set_dialog_result(window_id, result)
            }
            FormCommand::SetTopMost { window_id, value } => self.set_top_most(window_id, value),
            FormCommand::SetShowInTaskbar { window_id, value } => {
                self.set_show_in_taskbar(window_id, value)
            }
            FormCommand::SetBorderStyle { window_id, style } => {
                self.set_border_style(window_id, style)
            }
            FormCommand::RecreateHandle { window_id } => execute_recreate_handle(self, window_id),
        }
    }

    /// Executes the commands in order and stops at the first failure.
    pub fn execute_commands(
        &mut self,
        commands: impl IntoIterator<Item = FormCommand>,
    ) -> PlatformResult<()> {
        for command in commands {
            self.execute_command(command)?;
        }
        Ok(())
    }
}

pub(crate) fn execute_show(manager: &mut FormManager, window_id: WindowId) -> PlatformResult<()> {
    log::debug!("CommandExecutor: execute_show for {window_id:?}");
    manager.show(window_id)
}

/*
 * Closing an id that is already gone is accepted: a queued close may race with
 * a user close of the same window.
 */
pub(crate) fn execute_close(manager: &mut FormManager, window_id: WindowId) -> PlatformResult<()> {
    if !manager.exists(window_id) {
        log::warn!("CommandExecutor: Close of unknown {window_id:?} ignored");
        return Ok(());
    }
    manager.close(window_id)
}

pub(crate) fn execute_set_mdi_parent(
    manager: &mut FormManager,
    window_id: WindowId,
    parent: Option<WindowId>,
) -> PlatformResult<()> {
    log::debug!("CommandExecutor: Moving {window_id:?} under MDI parent {parent:?}");
    manager.set_mdi_parent(window_id, parent)
}

pub(crate) fn execute_recreate_handle(
    manager: &mut FormManager,
    window_id: WindowId,
) -> PlatformResult<()> {
    if manager.handle(window_id)?.is_none() {
        log::debug!("CommandExecutor: {window_id:?} has no handle to recreate");
        return Ok(());
    }
    manager.recreate_handle(window_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlatformError;
    use crate::headless::{HeadlessHost, HostCall};
    use crate::types::{FormConfig, HostEnvironment};

    fn manager_with_probe() -> (FormManager, HeadlessHost) {
        let host = HeadlessHost::new();
        let manager = FormManager::new(Box::new(host.clone()), HostEnvironment::default());
        (manager, host)
    }

    #[test]
    fn commands_route_to_their_operations() {
        let (mut manager, probe) = manager_with_probe();
        let main = manager.create_form(FormConfig::default());
        let tool = manager.create_form(FormConfig::default());

        manager
            .execute_commands([
                FormCommand::Show { window_id: main },
                FormCommand::SetOwner {
                    window_id: tool,
                    owner: Some(main),
                },
                FormCommand::Show { window_id: tool },
                FormCommand::SetWindowState {
                    window_id: main,
                    state: WindowState::Maximized,
                },
            ])
            .unwrap();

        assert!(manager.is_visible(tool).unwrap());
        assert_eq!(manager.owned_forms(main).unwrap(), vec![tool]);
        assert_eq!(manager.window_state(main).unwrap(), WindowState::Maximized);
        let tool_handle = manager.handle(tool).unwrap().unwrap();
        assert_eq!(probe.window(tool_handle).unwrap().owner, manager.handle(main).unwrap());
    }

    #[test]
    fn close_of_unknown_window_is_accepted() {
        let (mut manager, _) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        manager.execute_command(FormCommand::Show { window_id: form }).unwrap();
        manager.execute_command(FormCommand::Close { window_id: form }).unwrap();
        assert!(!manager.exists(form));
        assert!(manager.execute_command(FormCommand::Close { window_id: form }).is_ok());
    }

    #[test]
    fn recreate_without_handle_does_nothing() {
        let (mut manager, probe) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        manager
            .execute_command(FormCommand::RecreateHandle { window_id: form })
            .unwrap();
        assert_eq!(probe.count_calls(|call| matches!(call, HostCall::CreateWindow { .. })), 0);
    }

    #[test]
    fn first_failure_stops_the_batch() {
        let (mut manager, _) = manager_with_probe();
        let form = manager.create_form(FormConfig::default());
        let result = manager.execute_commands([
            FormCommand::SetOwner {
                window_id: form,
                owner: Some(form),
            },
            FormCommand::Show { window_id: form },
        ]);
        assert!(matches!(result, Err(PlatformError::InvalidArgument(_))));
        assert!(!manager.is_visible(form).unwrap());
    }
}
