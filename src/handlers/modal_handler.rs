/*
 * Modal display.
 *
 * `show_modal` realizes the window, shows it and pumps native events through
 * `dispatch` until a dialog result is set or the window is hidden. The loop is
 * re-entrant: handlers dispatched from inside it may open further modal windows.
 * Whatever happens inside the loop, the window leaves modal display hidden,
 * without a handle, not modal and with its original owner.
 */

use crate::app::FormManager;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::{FormClosedArgs, FormClosingArgs};
use crate::types::{CloseReason, DialogResult, NativeHandle, WindowId};

impl FormManager {
    pub fn is_modal(&self, window_id: WindowId) -> PlatformResult<bool> {
        self.with_form_read(window_id, |form| Ok(form.modal))
    }

    fn validate_modal(&self, window_id: WindowId, owner: Option<WindowId>) -> PlatformResult<()> {
        if owner == Some(window_id) {
            return Err(PlatformError::InvalidArgument(format!(
                "{window_id:?} cannot be shown modally over itself"
            )));
        }
        let form = self.form(window_id)?;
        let refusal = if form.visible {
            Some("is already visible")
        } else if !form.enabled {
            Some("is disabled")
        } else if form.is_mdi_child() {
            Some("is not a top-level window")
        } else if form.modal {
            Some("is already modal")
        } else if !self.environment.user_interactive {
            Some("cannot be shown in a non-interactive session")
        } else {
            None
        };
        if let Some(refusal) = refusal {
            return Err(PlatformError::InvalidOperation(format!(
                "{window_id:?} {refusal}"
            )));
        }
        // The whole owner chain is checked here; nothing may change before a
        // rejected owner is reported.
        if let Some(owner) = owner {
            self.validate_owner(window_id, owner)?;
        }
        Ok(())
    }

    /*
     * Shows the window modally and returns its dialog result. A result set while
     * loading returns immediately without showing the window.
     */
    pub fn show_modal(
        &mut self,
        window_id: WindowId,
        owner: Option<WindowId>,
    ) -> PlatformResult<DialogResult> {
        self.validate_modal(window_id, owner)?;

        self.host.release_capture();
        let previous_active = self.host.active_window();
        let original_owner = self.owner(window_id)?;
        if owner.is_some() && owner != original_owner {
            self.set_owner(window_id, owner)?;
        }
        self.with_form_write(window_id, |form| {
            form.modal = true;
            form.dialog_result = DialogResult::None;
            form.transient.called_on_load = false;
            form.transient.called_closing = false;
            Ok(())
        })?;
        log::debug!("Modal: Showing {window_id:?} modally (owner {owner:?})");

        let outcome = self.run_modal_loop(window_id);
        let cleanup = self.end_modal(window_id, previous_active, original_owner);
        outcome?;
        cleanup?;

        let result = self
            .windows
            .get(&window_id)
            .map_or(DialogResult::Cancel, |form| form.dialog_result);
        log::debug!("Modal: {window_id:?} returned {result:?}");
        Ok(result)
    }

    fn run_modal_loop(&mut self, window_id: WindowId) -> PlatformResult<()> {
        self.create_control(window_id)?;
        if !self.exists(window_id) {
            return Ok(());
        }
        self.relink_native_owner(window_id)?;
        if self.dialog_result(window_id)? != DialogResult::None {
            log::debug!("Modal: {window_id:?} got its result while loading");
            return Ok(());
        }

        self.form_mut(window_id)?.visible = true;
        self.show_native(window_id)?;
        loop {
            if self.check_close_dialog(window_id, false) {
                break;
            }
            match self.host.next_event() {
                Some(mut event) => {
                    self.dispatch(&mut event);
                }
                None => {
                    log::warn!("Modal: Event source ended while {window_id:?} was open");
                    break;
                }
            }
        }
        Ok(())
    }

    /*
     * Hands activation back, hides and unrealizes the window and restores its
     * owner. Runs after the loop regardless of how the loop ended.
     */
    fn end_modal(
        &mut self,
        window_id: WindowId,
        previous_active: Option<NativeHandle>,
        original_owner: Option<WindowId>,
    ) -> PlatformResult<()> {
        if !self.exists(window_id) {
            return Ok(());
        }
        let own_handle = self.handle(window_id)?;
        let fallback = match self.owner(window_id)? {
            Some(owner) => self.handle(owner)?,
            None => None,
        };
        let reactivate = previous_active
            .filter(|handle| Some(*handle) != own_handle && self.host.is_window(*handle))
            .or(fallback);
        if let Some(target) = reactivate
            && let Err(e) = self.host.activate(target)
        {
            log::warn!("Modal: Could not reactivate {target:?}: {e}");
        }

        let hidden = self.hide(window_id);
        let destroyed = self.destroy_handle(window_id);
        self.with_form_write(window_id, |form| {
            if form.dialog_result == DialogResult::None {
                form.dialog_result = DialogResult::Cancel;
            }
            form.modal = false;
            form.transient.called_closing = false;
            form.transient.close_reason = CloseReason::None;
            Ok(())
        })?;
        let restored = if self.owner(window_id)? != original_owner {
            self.set_owner(window_id, original_owner)
        } else {
            Ok(())
        };
        hidden?;
        destroyed?;
        restored
    }

    /*
     * Decides whether the modal loop may end. Raises `closing` once per close
     * attempt (a cancel clears the result) and, unless only the closing phase was
     * asked for, `closed` once a result stands. Handler failures clear the result
     * and go to the error sink.
     */
    pub(crate) fn check_close_dialog(&mut self, window_id: WindowId, closing_only: bool) -> bool {
        let Some(form) = self.windows.get(&window_id) else {
            return true;
        };
        if form.dialog_result == DialogResult::None && form.visible {
            return false;
        }
        let reason = form.transient.close_reason;

        if !form.transient.called_closing {
            let mut args = FormClosingArgs {
                reason,
                cancel: false,
            };
            match self.raise_fallible(window_id, &mut args, |observers| &observers.closing) {
                Ok(()) => {
                    if let Some(form) = self.windows.get_mut(&window_id) {
                        if args.cancel {
                            form.dialog_result = DialogResult::None;
                        } else {
                            form.transient.called_closing = true;
                        }
                    }
                }
                Err(e) => self.report_handler_failure(window_id, &*e),
            }
        }

        let result = self
            .windows
            .get(&window_id)
            .map(|form| form.dialog_result);
        if !closing_only && result.is_some_and(|result| result != DialogResult::None) {
            let mut args = FormClosedArgs { reason };
            if let Err(e) =
                self.raise_fallible(window_id, &mut args, |observers| &observers.closed)
            {
                self.report_handler_failure(window_id, &*e);
            }
            if let Some(form) = self.windows.get_mut(&window_id) {
                form.transient.called_closing = false;
            }
        }

        match self.windows.get(&window_id) {
            Some(form) => form.dialog_result != DialogResult::None || !form.visible,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessHost, HostCall};
    use crate::native::{DialogKey, NativeEvent, NativeHost, NativeMessage};
    use crate::types::{FormConfig, HostEnvironment};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn manager_with_probe() -> (FormManager, HeadlessHost) {
        let host = HeadlessHost::new();
        let manager = FormManager::new(Box::new(host.clone()), HostEnvironment::default());
        (manager, host)
    }

    /// Queues `messages` for the dialog once it is on screen.
    fn script_on_shown(
        manager: &mut FormManager,
        probe: &HeadlessHost,
        dialog: WindowId,
        messages: Vec<NativeMessage>,
    ) {
        let probe = probe.clone();
        manager
            .on_shown(dialog, move |manager, window_id| {
                let Ok(Some(handle)) = manager.handle(window_id) else {
                    return;
                };
                for message in &messages {
                    probe.push_event(NativeEvent::new(handle, message.clone()));
                }
            })
            .unwrap();
    }

    #[test]
    fn result_set_while_loading_skips_the_loop() {
        let (mut manager, probe) = manager_with_probe();
        let dialog = manager.create_form(FormConfig::default());
        manager
            .on_load(dialog, |manager, window_id| {
                manager.set_dialog_result(window_id, DialogResult::Ok).unwrap();
            })
            .unwrap();
        probe.push_event(NativeEvent::new(NativeHandle(1), NativeMessage::Move));

        let result = manager.show_modal(dialog, None).unwrap();

        assert_eq!(result, DialogResult::Ok);
        assert_eq!(probe.pending_events(), 1);
        assert!(!manager.is_modal(dialog).unwrap());
        assert!(manager.handle(dialog).unwrap().is_none());
    }

    #[test]
    fn accept_key_ends_the_loop_with_its_result() {
        let (mut manager, probe) = manager_with_probe();
        let dialog = manager.create_form(FormConfig::default());
        manager.set_accept_result(dialog, Some(DialogResult::Ok)).unwrap();
        script_on_shown(
            &mut manager,
            &probe,
            dialog,
            vec![NativeMessage::DialogKey(DialogKey::Enter)],
        );

        assert_eq!(manager.show_modal(dialog, None).unwrap(), DialogResult::Ok);
        assert!(!manager.is_visible(dialog).unwrap());
    }

    #[test]
    fn close_request_runs_both_phases_once() {
        let (mut manager, probe) = manager_with_probe();
        let dialog = manager.create_form(FormConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        let (closing, closed) = (log.clone(), log.clone());
        manager
            .on_closing(dialog, move |_, _, _| {
                closing.borrow_mut().push("closing");
                Ok(())
            })
            .unwrap();
        manager
            .on_closed(dialog, move |_, _, _| {
                closed.borrow_mut().push("closed");
                Ok(())
            })
            .unwrap();
        script_on_shown(&mut manager, &probe, dialog, vec![NativeMessage::Close]);

        let result = manager.show_modal(dialog, None).unwrap();

        assert_eq!(result, DialogResult::Cancel);
        assert_eq!(*log.borrow(), vec!["closing", "closed"]);
        assert!(manager.exists(dialog));
    }

    #[test]
    fn cancelled_close_keeps_the_dialog_running() {
        let (mut manager, probe) = manager_with_probe();
        let dialog = manager.create_form(FormConfig::default());
        manager.set_accept_result(dialog, Some(DialogResult::Yes)).unwrap();
        let attempts = Rc::new(RefCell::new(0));
        let counter = attempts.clone();
        manager
            .on_closing(dialog, move |_, _, args| {
                *counter.borrow_mut() += 1;
                args.cancel = *counter.borrow() == 1;
                Ok(())
            })
            .unwrap();
        script_on_shown(
            &mut manager,
            &probe,
            dialog,
            vec![NativeMessage::Close, NativeMessage::DialogKey(DialogKey::Enter)],
        );

        assert_eq!(manager.show_modal(dialog, None).unwrap(), DialogResult::Yes);
        assert_eq!(*attempts.borrow(), 2);
    }

    #[test]
    fn owner_is_temporary_and_reactivated() {
        let (mut manager, probe) = manager_with_probe();
        let main = manager.create_form(FormConfig::default());
        manager.show(main).unwrap();
        let main_handle = manager.handle(main).unwrap().unwrap();
        let dialog = manager.create_form(FormConfig::default());
        let seen_owner = Rc::new(RefCell::new(None));
        let sink = seen_owner.clone();
        manager
            .on_load(dialog, move |manager, window_id| {
                *sink.borrow_mut() = manager.owner(window_id).unwrap();
                manager.set_dialog_result(window_id, DialogResult::No).unwrap();
            })
            .unwrap();

        assert_eq!(manager.show_modal(dialog, Some(main)).unwrap(), DialogResult::No);

        assert_eq!(*seen_owner.borrow(), Some(main));
        assert_eq!(manager.owner(dialog).unwrap(), None);
        assert!(manager.owned_forms(main).unwrap().is_empty());
        assert_eq!(probe.active_window(), Some(main_handle));
    }

    #[test]
    fn exhausted_event_source_cancels() {
        let (mut manager, _) = manager_with_probe();
        let dialog = manager.create_form(FormConfig::default());
        assert_eq!(manager.show_modal(dialog, None).unwrap(), DialogResult::Cancel);
        assert!(!manager.is_modal(dialog).unwrap());
    }

    #[test]
    fn invalid_requests_are_rejected() {
        let (mut manager, _) = manager_with_probe();
        let visible = manager.create_form(FormConfig::default());
        manager.show(visible).unwrap();
        let dialog = manager.create_form(FormConfig::default());
        let owned_by_dialog = manager.create_form(FormConfig::default());
        manager.set_owner(owned_by_dialog, Some(dialog)).unwrap();

        assert!(matches!(
            manager.show_modal(visible, None),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert!(matches!(
            manager.show_modal(dialog, Some(dialog)),
            Err(PlatformError::InvalidArgument(_))
        ));
        assert!(matches!(
            manager.show_modal(dialog, Some(owned_by_dialog)),
            Err(PlatformError::InvalidArgument(_))
        ));
        manager.set_enabled(dialog, false).unwrap();
        assert!(matches!(
            manager.show_modal(dialog, None),
            Err(PlatformError::InvalidOperation(_))
        ));
        assert!(!manager.is_modal(dialog).unwrap());
    }

    #[test]
    fn indirect_owner_cycle_is_rejected_before_capture_is_released() {
        let (mut manager, probe) = manager_with_probe();
        let dialog = manager.create_form(FormConfig::default());
        let middle = manager.create_form(FormConfig::default());
        let outer = manager.create_form(FormConfig::default());
        manager.set_owner(middle, Some(dialog)).unwrap();
        manager.set_owner(outer, Some(middle)).unwrap();
        let main = manager.create_form(FormConfig::default());
        manager.show(main).unwrap();
        probe.set_capture(manager.handle(main).unwrap());

        assert!(matches!(
            manager.show_modal(dialog, Some(outer)),
            Err(PlatformError::InvalidArgument(_))
        ));
        assert_eq!(probe.count_calls(|call| matches!(call, HostCall::ReleaseCapture(_))), 0);
        assert_eq!(manager.owner(dialog).unwrap(), None);
        assert!(!manager.is_modal(dialog).unwrap());
    }

    #[test]
    fn non_interactive_session_refuses_modal_display() {
        let environment = HostEnvironment {
            user_interactive: false,
            ..HostEnvironment::default()
        };
        let mut manager = FormManager::new(Box::new(HeadlessHost::new()), environment);
        let dialog = manager.create_form(FormConfig::default());
        assert!(matches!(
            manager.show_modal(dialog, None),
            Err(PlatformError::InvalidOperation(_))
        ));
    }
}
