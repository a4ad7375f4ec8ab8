//! Idle-connection sweep trigger.
//!
//! The pool is owned by the event pump. This task never touches a slot; it
//! only raises [`AppContext::sweep`] once per period and the pump expires
//! idle connections on its own thread, so sweep and socket callbacks can
//! never race on the same slot.

use crate::state::AppContext;

/// Task body for [`super::SWEEP`].
pub fn cycle(ctx: &AppContext) {
    ctx.sweep.signal(());
}
