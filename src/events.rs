/*
 * Notification arguments and per-window observer lists.
 *
 * Each notification has its own list of handlers stored on the window. Handlers
 * receive `&mut FormManager`, so they may show, close or reconfigure windows while
 * the notification is being raised. The list is cloned before invocation, which
 * lets a handler register further handlers (or dispose its own window) without
 * invalidating the iteration.
 */

use std::rc::Rc;

use crate::app::FormManager;
use crate::error::{HandlerResult, PlatformError, Result as PlatformResult};
use crate::types::{CloseReason, MenuActionId, MenuId, WindowId, WindowState};

pub type FormHandler = Rc<dyn Fn(&mut FormManager, WindowId)>;
pub type FormArgsHandler<A> = Rc<dyn Fn(&mut FormManager, WindowId, &mut A)>;
pub type FallibleFormHandler<A> = Rc<dyn Fn(&mut FormManager, WindowId, &mut A) -> HandlerResult>;

/// Cancellable first phase of the close protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormClosingArgs {
    pub reason: CloseReason,
    pub cancel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormClosedArgs {
    pub reason: CloseReason,
}

/// Raised on an MDI container whenever its active child changes; `active` is
/// `None` when the last visible child went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MdiChildActivateArgs {
    pub active: Option<WindowId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HelpRequestedArgs {
    pub handled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuLoopArgs {
    pub menu: Option<MenuId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuCommandArgs {
    pub action: MenuActionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowStateChangedArgs {
    pub old: WindowState,
    pub new: WindowState,
}

#[derive(Default, Clone)]
pub(crate) struct FormObservers {
    pub(crate) load: Vec<FormHandler>,
    pub(crate) shown: Vec<FormHandler>,
    pub(crate) activated: Vec<FormHandler>,
    pub(crate) deactivate: Vec<FormHandler>,
    pub(crate) resize_begin: Vec<FormHandler>,
    pub(crate) resize_end: Vec<FormHandler>,
    pub(crate) closing: Vec<FallibleFormHandler<FormClosingArgs>>,
    pub(crate) closed: Vec<FallibleFormHandler<FormClosedArgs>>,
    pub(crate) mdi_child_activate: Vec<FormArgsHandler<MdiChildActivateArgs>>,
    pub(crate) help_requested: Vec<FormArgsHandler<HelpRequestedArgs>>,
    pub(crate) menu_start: Vec<FormArgsHandler<MenuLoopArgs>>,
    pub(crate) menu_complete: Vec<FormArgsHandler<MenuLoopArgs>>,
    pub(crate) menu_command: Vec<FormArgsHandler<MenuCommandArgs>>,
    pub(crate) window_state_changed: Vec<FormArgsHandler<WindowStateChangedArgs>>,
}

/*
 * Receives failures raised by user handlers inside the close protocol. The
 * protocol never propagates them to its caller.
 */
pub trait UnhandledErrorSink {
    fn report(&self, window_id: WindowId, error: &(dyn std::error::Error + 'static));
}

/// Default sink: logs at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl UnhandledErrorSink for LogErrorSink {
    fn report(&self, window_id: WindowId, error: &(dyn std::error::Error + 'static)) {
        log::error!("FormManager: Unhandled handler error for {window_id:?}: {error}");
    }
}

impl FormManager {
    fn observers_mut(&mut self, window_id: WindowId) -> PlatformResult<&mut FormObservers> {
        self.windows
            .get_mut(&window_id)
            .map(|form| &mut form.observers)
            .ok_or_else(|| {
                PlatformError::InvalidHandle(format!("WindowId {window_id:?} not found"))
            })
    }

    pub fn on_load(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?.load.push(Rc::new(handler));
        Ok(())
    }

    pub fn on_shown(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?.shown.push(Rc::new(handler));
        Ok(())
    }

    pub fn on_activated(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?.activated.push(Rc::new(handler));
        Ok(())
    }

    pub fn on_deactivate(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?.deactivate.push(Rc::new(handler));
        Ok(())
    }

    pub fn on_resize_begin(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?
            .resize_begin
            .push(Rc::new(handler));
        Ok(())
    }

    pub fn on_resize_end(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?.resize_end.push(Rc::new(handler));
        Ok(())
    }

    pub fn on_closing(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId, &mut FormClosingArgs) -> HandlerResult
            + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?.closing.push(Rc::new(handler));
        Ok(())
    }

    pub fn on_closed(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId, &mut FormClosedArgs) -> HandlerResult
            + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?.closed.push(Rc::new(handler));
        Ok(())
    }

    pub fn on_mdi_child_activate(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId, &mut MdiChildActivateArgs) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?
            .mdi_child_activate
            .push(Rc::new(handler));
        Ok(())
    }

    pub fn on_help_requested(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId, &mut HelpRequestedArgs) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?
            .help_requested
            .push(Rc::new(handler));
        Ok(())
    }

    pub fn on_menu_start(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId, &mut MenuLoopArgs) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?.menu_start.push(Rc::new(handler));
        Ok(())
    }

    pub fn on_menu_complete(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId, &mut MenuLoopArgs) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?
            .menu_complete
            .push(Rc::new(handler));
        Ok(())
    }

    pub fn on_menu_command(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId, &mut MenuCommandArgs) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?
            .menu_command
            .push(Rc::new(handler));
        Ok(())
    }

    pub fn on_window_state_changed(
        &mut self,
        window_id: WindowId,
        handler: impl Fn(&mut FormManager, WindowId, &mut WindowStateChangedArgs) + 'static,
    ) -> PlatformResult<()> {
        self.observers_mut(window_id)?
            .window_state_changed
            .push(Rc::new(handler));
        Ok(())
    }

    pub(crate) fn raise(
        &mut self,
        window_id: WindowId,
        select: fn(&FormObservers) -> &Vec<FormHandler>,
    ) {
        let handlers = match self.windows.get(&window_id) {
            Some(form) => select(&form.observers).clone(),
            None => return,
        };
        for handler in handlers {
            handler(self, window_id);
        }
    }

    pub(crate) fn raise_with<A>(
        &mut self,
        window_id: WindowId,
        args: &mut A,
        select: fn(&FormObservers) -> &Vec<FormArgsHandler<A>>,
    ) {
        let handlers = match self.windows.get(&window_id) {
            Some(form) => select(&form.observers).clone(),
            None => return,
        };
        for handler in handlers {
            handler(self, window_id, args);
        }
    }

    /// Stops at the first failing handler and returns its error.
    pub(crate) fn raise_fallible<A>(
        &mut self,
        window_id: WindowId,
        args: &mut A,
        select: fn(&FormObservers) -> &Vec<FallibleFormHandler<A>>,
    ) -> HandlerResult {
        let handlers = match self.windows.get(&window_id) {
            Some(form) => select(&form.observers).clone(),
            None => return Ok(()),
        };
        for handler in handlers {
            handler(self, window_id, args)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessHost;
    use crate::types::{FormConfig, HostEnvironment};
    use std::cell::RefCell;

    #[test]
    fn handlers_registered_during_a_raise_run_next_time() {
        let mut manager = FormManager::new(
            Box::new(HeadlessHost::new()),
            HostEnvironment::default(),
        );
        let form = manager.create_form(FormConfig::default());
        let calls = Rc::new(RefCell::new(Vec::new()));

        let outer = calls.clone();
        manager
            .on_activated(form, move |manager, id| {
                outer.borrow_mut().push("first");
                let inner = outer.clone();
                manager
                    .on_activated(id, move |_, _| inner.borrow_mut().push("late"))
                    .unwrap();
            })
            .unwrap();

        manager.raise(form, |observers| &observers.activated);
        assert_eq!(*calls.borrow(), vec!["first"]);

        manager.raise(form, |observers| &observers.activated);
        assert_eq!(*calls.borrow(), vec!["first", "first", "late"]);
    }

    #[test]
    fn fallible_raise_stops_at_first_error() {
        let mut manager = FormManager::new(
            Box::new(HeadlessHost::new()),
            HostEnvironment::default(),
        );
        let form = manager.create_form(FormConfig::default());
        let reached = Rc::new(RefCell::new(false));
        let flag = reached.clone();

        manager
            .on_closed(form, |_, _, _| Err("handler failed".into()))
            .unwrap();
        manager
            .on_closed(form, move |_, _, _| {
                *flag.borrow_mut() = true;
                Ok(())
            })
            .unwrap();

        let mut args = FormClosedArgs {
            reason: CloseReason::UserClosing,
        };
        let result = manager.raise_fallible(form, &mut args, |observers| &observers.closed);

        assert!(result.is_err());
        assert!(!*reached.borrow());
    }
}
