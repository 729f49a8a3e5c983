/*
 * One module per window protocol. Each adds an `impl FormManager` block with
 * the public operations of its protocol and the crate-internal hooks the
 * message router in `window_common` calls.
 */

pub(crate) mod close_handler;
pub(crate) mod lifecycle_handler;
pub(crate) mod mdi_handler;
pub(crate) mod menu_merge_handler;
pub(crate) mod modal_handler;
pub(crate) mod ownership_handler;
pub(crate) mod window_state_handler;
