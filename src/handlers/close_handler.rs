/*
 * Two-phase close protocol.
 *
 * Phase one raises the cancellable `closing` notification on the MDI children,
 * on owned windows that are not registered as open, and finally on the window
 * itself, accumulating a single cancel flag. Phase two (only when nobody
 * cancelled) marks the window as closing, raises `closed` in the same order and
 * disposes it. Handler failures are forwarded to the error sink and never stop
 * the protocol.
 *
 * Modal windows only run phase one here; the modal loop completes the close once
 * it observes the dialog result.
 */

use crate::app::FormManager;
use crate::error::{PlatformError, Result as PlatformResult};
use crate::events::{FormClosedArgs, FormClosingArgs};
use crate::types::{CloseReason, DialogResult, WindowId};

/// What started a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CloseRequest {
    Close,
    /// The session asks whether it may end; nothing is closed.
    QueryEndSession,
    /// The session is ending (or the end was called off when `ending` is false).
    EndSession { ending: bool },
}

impl FormManager {
    /*
     * Requests that the window close. A realized window runs the close protocol;
     * a window without a handle is disposed directly. Closing a disposed window
     * does nothing.
     */
    pub fn close(&mut self, window_id: WindowId) -> PlatformResult<()> {
        let Some(form) = self.windows.get_mut(&window_id) else {
            log::debug!("Close: {window_id:?} is already disposed");
            return Ok(());
        };
        if form.transient.creating_handle {
            return Err(PlatformError::InvalidOperation(format!(
                "Cannot close {window_id:?} while its handle is being created"
            )));
        }
        if form.transient.closing {
            return Ok(());
        }
        if form.handle.is_none() {
            return self.dispose(window_id);
        }
        if form.transient.close_reason == CloseReason::None {
            form.transient.close_reason = CloseReason::UserClosing;
        }
        self.handle_close_request(window_id, CloseRequest::Close);
        Ok(())
    }

    /// Runs the close protocol and returns `true` when the close was cancelled.
    pub(crate) fn handle_close_request(
        &mut self,
        window_id: WindowId,
        request: CloseRequest,
    ) -> bool {
        let Some(form) = self.windows.get_mut(&window_id) else {
            return false;
        };
        if form.transient.closing {
            return false;
        }
        let is_session = !matches!(request, CloseRequest::Close);

        if form.modal && !matches!(request, CloseRequest::EndSession { .. }) {
            if form.dialog_result == DialogResult::None {
                form.dialog_result = DialogResult::Cancel;
            }
            if is_session {
                form.transient.close_reason = CloseReason::WindowsShutDown;
            }
            form.transient.called_closing = false;
            log::debug!("Close: Modal {window_id:?} asked to close");
            return !self.check_close_dialog(window_id, true);
        }

        let reason = if is_session {
            CloseReason::WindowsShutDown
        } else {
            form.transient.close_reason
        };
        let cancelled = match request {
            CloseRequest::EndSession { ending } => !ending,
            _ => self.raise_closing_phase(window_id, reason),
        };
        log::debug!("Close: {window_id:?} {request:?} reason {reason:?}, cancelled: {cancelled}");

        if request == CloseRequest::QueryEndSession || cancelled {
            if let Some(form) = self.windows.get_mut(&window_id) {
                form.transient.close_reason = CloseReason::None;
            }
            return cancelled;
        }

        match self.windows.get_mut(&window_id) {
            Some(form) => form.transient.closing = true,
            None => return false,
        }
        self.raise_closed_phase(window_id, reason);
        if let Err(e) = self.dispose(window_id) {
            log::warn!("Close: Disposing {window_id:?} failed: {e}");
        }
        false
    }

    /// Windows that hear about a close of `window_id` before it does, with the
    /// reason they are given.
    fn close_dependents(&self, window_id: WindowId) -> Vec<(WindowId, CloseReason)> {
        let Some(form) = self.windows.get(&window_id) else {
            return Vec::new();
        };
        let children = form
            .mdi
            .as_ref()
            .map(|mdi| mdi.children.clone())
            .unwrap_or_default()
            .into_iter()
            .map(|child| (child, CloseReason::MdiFormClosing));
        let owned = form
            .owned
            .iter()
            .filter(|owned| !self.open_forms.contains(owned))
            .map(|owned| (*owned, CloseReason::FormOwnerClosing));
        children.chain(owned).collect()
    }

    fn raise_closing_phase(&mut self, window_id: WindowId, reason: CloseReason) -> bool {
        let mut cancel = false;
        let mut targets = self.close_dependents(window_id);
        targets.push((window_id, reason));
        for (target, target_reason) in targets {
            let mut args = FormClosingArgs {
                reason: target_reason,
                cancel,
            };
            if let Err(e) = self.raise_fallible(target, &mut args, |observers| &observers.closing) {
                self.report_handler_failure(target, &*e);
            }
            cancel = args.cancel;
        }
        cancel
    }

    fn raise_closed_phase(&mut self, window_id: WindowId, reason: CloseReason) {
        let mut targets = self.close_dependents(window_id);
        targets.push((window_id, reason));
        for (target, target_reason) in targets {
            let mut args = FormClosedArgs {
                reason: target_reason,
            };
            if let Err(e) = self.raise_fallible(target, &mut args, |observers| &observers.closed) {
                self.report_handler_failure(target, &*e);
            }
        }
    }

    pub(crate) fn report_handler_failure(
        &mut self,
        window_id: WindowId,
        error: &(dyn std::error::Error + 'static),
    ) {
        if let Some(form) = self.windows.get_mut(&window_id) {
            form.dialog_result = DialogResult::None;
        }
        self.report_error(window_id, error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::UnhandledErrorSink;
    use crate::headless::HeadlessHost;
    use crate::native::{NativeEvent, NativeMessage, Reply};
    use crate::types::{FormConfig, HostEnvironment};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingSink(RefCell<Vec<String>>);

    impl UnhandledErrorSink for RecordingSink {
        fn report(&self, window_id: WindowId, error: &(dyn std::error::Error + 'static)) {
            self.0.borrow_mut().push(format!("{window_id:?}: {error}"));
        }
    }

    fn manager() -> FormManager {
        FormManager::new(Box::new(HeadlessHost::new()), HostEnvironment::default())
    }

    fn record_close(
        manager: &mut FormManager,
        window_id: WindowId,
        log: &Rc<RefCell<Vec<String>>>,
        name: &'static str,
    ) {
        let closing = log.clone();
        let closed = log.clone();
        manager
            .on_closing(window_id, move |_, _, args| {
                closing.borrow_mut().push(format!("closing {name} {:?}", args.reason));
                Ok(())
            })
            .unwrap();
        manager
            .on_closed(window_id, move |_, _, args| {
                closed.borrow_mut().push(format!("closed {name} {:?}", args.reason));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn closing_twice_raises_closed_once() {
        let mut manager = manager();
        let form = manager.create_form(FormConfig::default());
        manager.show(form).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        record_close(&mut manager, form, &log, "form");

        manager.close(form).unwrap();
        manager.close(form).unwrap();

        assert_eq!(
            *log.borrow(),
            vec!["closing form UserClosing", "closed form UserClosing"]
        );
        assert!(!manager.exists(form));
    }

    #[test]
    fn cancelled_close_keeps_window() {
        let mut manager = manager();
        let form = manager.create_form(FormConfig::default());
        manager.show(form).unwrap();
        manager
            .on_closing(form, |_, _, args| {
                args.cancel = true;
                Ok(())
            })
            .unwrap();

        manager.close(form).unwrap();

        assert!(manager.exists(form));
        assert!(manager.handle(form).unwrap().is_some());
        assert!(!manager.transient_flags(form).unwrap().is_closing());
    }

    #[test]
    fn container_close_cascades_to_children_first() {
        let mut manager = manager();
        let container = manager.create_form(FormConfig::default());
        manager.set_is_mdi_container(container, true).unwrap();
        let child = manager.create_form(FormConfig::default());
        manager.set_mdi_parent(child, Some(container)).unwrap();
        manager.show(container).unwrap();
        manager.show(child).unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        record_close(&mut manager, container, &log, "container");
        record_close(&mut manager, child, &log, "child");

        manager.close(container).unwrap();

        assert_eq!(
            *log.borrow(),
            vec![
                "closing child MdiFormClosing",
                "closing container UserClosing",
                "closed child MdiFormClosing",
                "closed container UserClosing",
            ]
        );
        assert!(!manager.exists(child));
        assert!(!manager.exists(container));
    }

    #[test]
    fn child_cancel_is_seen_by_container() {
        let mut manager = manager();
        let container = manager.create_form(FormConfig::default());
        manager.set_is_mdi_container(container, true).unwrap();
        let child = manager.create_form(FormConfig::default());
        manager.set_mdi_parent(child, Some(container)).unwrap();
        manager.show(container).unwrap();
        manager
            .on_closing(child, |_, _, args| {
                args.cancel = true;
                Ok(())
            })
            .unwrap();
        let seen = Rc::new(RefCell::new(None));
        let sink = seen.clone();
        manager
            .on_closing(container, move |_, _, args| {
                *sink.borrow_mut() = Some(args.cancel);
                Ok(())
            })
            .unwrap();

        manager.close(container).unwrap();

        assert_eq!(*seen.borrow(), Some(true));
        assert!(manager.exists(container));
        assert!(manager.exists(child));
    }

    #[test]
    fn handler_failure_is_reported_and_close_completes() {
        let mut manager = manager();
        let sink = Rc::new(RecordingSink::default());
        manager.set_error_sink(sink.clone());
        let form = manager.create_form(FormConfig::default());
        manager.show(form).unwrap();
        manager
            .on_closing(form, |_, _, _| Err("boom".into()))
            .unwrap();

        manager.close(form).unwrap();

        assert!(!manager.exists(form));
        assert_eq!(sink.0.borrow().len(), 1);
        assert!(sink.0.borrow()[0].ends_with("boom"));
    }

    #[test]
    fn session_end_query_reports_cancel_without_closing() {
        let mut manager = manager();
        let form = manager.create_form(FormConfig::default());
        manager.show(form).unwrap();
        let handle = manager.handle(form).unwrap().unwrap();
        let veto = Rc::new(RefCell::new(true));
        let decision = veto.clone();
        manager
            .on_closing(form, move |_, _, args| {
                assert_eq!(args.reason, CloseReason::WindowsShutDown);
                args.cancel = *decision.borrow();
                Ok(())
            })
            .unwrap();

        let reply = manager.dispatch(&mut NativeEvent::new(handle, NativeMessage::QueryEndSession));
        assert_eq!(reply, Reply::Value(0));
        *veto.borrow_mut() = false;
        let reply = manager.dispatch(&mut NativeEvent::new(handle, NativeMessage::QueryEndSession));
        assert_eq!(reply, Reply::Value(1));
        assert!(manager.exists(form));
    }

    #[test]
    fn session_end_skips_closing_and_disposes() {
        let mut manager = manager();
        let form = manager.create_form(FormConfig::default());
        manager.show(form).unwrap();
        let handle = manager.handle(form).unwrap().unwrap();
        let log = Rc::new(RefCell::new(Vec::new()));
        record_close(&mut manager, form, &log, "form");

        manager.dispatch(&mut NativeEvent::new(
            handle,
            NativeMessage::EndSession { ending: false },
        ));
        assert!(manager.exists(form));
        manager.dispatch(&mut NativeEvent::new(handle, NativeMessage::EndSession { ending: true }));

        assert_eq!(*log.borrow(), vec!["closed form WindowsShutDown"]);
        assert!(!manager.exists(form));
    }

    #[test]
    fn unrealized_window_is_disposed_silently() {
        let mut manager = manager();
        let form = manager.create_form(FormConfig::default());
        let log = Rc::new(RefCell::new(Vec::new()));
        record_close(&mut manager, form, &log, "form");

        manager.close(form).unwrap();

        assert!(log.borrow().is_empty());
        assert!(!manager.exists(form));
    }

    #[test]
    fn closing_during_creation_is_rejected() {
        let mut manager = manager();
        let form = manager.create_form(FormConfig::default());
        manager.form_mut(form).unwrap().transient.creating_handle = true;
        assert!(matches!(
            manager.close(form),
            Err(PlatformError::InvalidOperation(_))
        ));
    }
}
