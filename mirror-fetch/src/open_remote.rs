//! `OpenRemoteImageRequest`: acquires the read handle the rest of the
//! pipeline (GetRemoteMirrorInfo, CreateLocal's copy source, ImageSync)
//! depends on. Paired with `close_remote::close_remote_image` on every
//! exit path once opened.

use crate::error::Error;
use crate::io::IoContext;
use crate::state_builder::StateBuilder;

pub fn open_remote_image(remote_ctx: &dyn IoContext, builder: &mut StateBuilder) -> Result<(), Error> {
    let remote_image_id = builder
        .remote_image_id()
        .cloned()
        .ok_or_else(|| Error::NotFound("remote image id not resolved".into()))?;

    let handle = remote_ctx.image_open(&remote_image_id)?;
    builder.set_remote_image_ctx(handle);
    Ok(())
}
