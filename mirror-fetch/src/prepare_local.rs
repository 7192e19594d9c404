//! `PrepareLocalImageRequest`: resolve local image identity and
//! allocate a mode-matching `StateBuilder`. Absence of the local
//! image is not a bootstrap failure — the coordinator simply carries
//! forward `None` and lets `PrepareRemoteImageRequest` decide whether
//! the mode is learned from the remote side instead.

use mirror_types::{GlobalImageId, MirrorMode};

use crate::error::Error;
use crate::io::IoError;
use crate::state_builder::StateBuilder;
use crate::IoContext;

/// Runs the local-image sub-pipeline against `local_ctx`, writing the
/// result into `slot`. Leaves `slot` untouched (`None`) if the image
/// simply doesn't exist locally yet.
pub fn prepare_local_image(
    local_ctx: &dyn IoContext,
    global_id: &GlobalImageId,
    slot: &mut Option<StateBuilder>,
) -> Result<(), Error> {
    let local_image_id = match local_ctx.mirror_image_get_image_id(global_id) {
        Ok(id) => id,
        Err(IoError::NotFound(_)) => {
            log::debug!(target: "bootstrap::prepare-local", "no local image for {global_id}");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let name = local_ctx.dir_get_name(&local_image_id)?;
    log::debug!(target: "bootstrap::prepare-local", "local image {local_image_id} is named {name}");

    let mirror_image = local_ctx.mirror_image_get(&local_image_id)?;

    let mut builder = StateBuilder::new(mirror_image.mode);
    builder.set_local_image_id(local_image_id.clone());

    if mirror_image.mode == MirrorMode::Journal {
        let owner = local_ctx.get_tag_owner(&local_image_id)?;
        builder.set_local_tag_owner(owner);
    }

    *slot = Some(builder);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeIoContext;
    use mirror_types::{ImageId, MirrorImageState};

    #[test]
    fn absent_local_image_leaves_slot_empty() {
        let ctx = FakeIoContext::default();
        let mut slot = None;
        prepare_local_image(&ctx, &GlobalImageId::new("g1"), &mut slot).unwrap();
        assert!(slot.is_none());
    }

    #[test]
    fn present_journal_image_populates_builder() {
        let mut ctx = FakeIoContext::default();
        ctx.add_local_image(
            GlobalImageId::new("g1"),
            ImageId::new("local-1"),
            "my-image",
            MirrorMode::Journal,
            MirrorImageState::Enabled,
        );
        ctx.set_tag_owner(ImageId::new("local-1"), "local-mirror-uuid");

        let mut slot = None;
        prepare_local_image(&ctx, &GlobalImageId::new("g1"), &mut slot).unwrap();

        let builder = slot.expect("builder allocated");
        assert_eq!(builder.mode(), MirrorMode::Journal);
        assert_eq!(builder.local_image_id().unwrap().as_str(), "local-1");
        assert!(builder.is_local_primary("local-mirror-uuid"));
    }
}
