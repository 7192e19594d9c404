//! `SetImageState`: the snapshot-mode sibling named only at the
//! interface level. Given an open image and a snapshot id, pages
//! through every user metadata entry and writes the accumulated state
//! as a single attribute. No partial state is ever written — the page
//! loop runs to completion (or fails outright) before the one write.

use serde::Serialize;

use mirror_types::ImageId;

use crate::error::Error;
use crate::io::IoContext;

#[derive(Debug, Serialize)]
struct ImageStatePayload {
    snapshot_limit: u64,
    user_metadata: Vec<(String, Vec<u8>)>,
}

pub fn set_image_state(
    io_ctx: &dyn IoContext,
    image_id: &ImageId,
    snapshot_id: u64,
) -> Result<(), Error> {
    let snapshot_limit = io_ctx.snapshot_limit(image_id)?;

    let mut user_metadata = Vec::new();
    let mut start_after = None;
    loop {
        let page = io_ctx.list_user_metadata(image_id, start_after.as_deref())?;
        user_metadata.extend(page.entries);
        match page.next_start_after {
            Some(next) => start_after = Some(next),
            None => break,
        }
    }

    let payload = ImageStatePayload { snapshot_limit, user_metadata };
    let data = serde_json::to_vec(&payload).map_err(|_| Error::BadMessage)?;
    io_ctx.write_image_state(image_id, snapshot_id, &data)?;
    Ok(())
}
