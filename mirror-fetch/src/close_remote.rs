//! `CloseRemoteImageRequest`: the unconditional best-effort unwind step.
//! Called on every exit path once `open_remote` has run, regardless of
//! whether the bootstrap otherwise succeeded. Its own failure is logged
//! and dropped — it must never overwrite a result the rest of the
//! pipeline already decided.

use crate::io::IoContext;
use crate::state_builder::StateBuilder;

pub fn close_remote_image(remote_ctx: &dyn IoContext, builder: &mut StateBuilder) {
    let Some(handle) = builder.take_remote_image_ctx() else {
        return;
    };
    if let Err(e) = remote_ctx.image_close(handle) {
        log::warn!(target: "bootstrap::close-remote", "failed to close remote image: {e}");
    }
}
