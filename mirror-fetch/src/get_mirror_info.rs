//! `GetRemoteMirrorInfoRequest`: the primary-ness gate. Runs after the
//! remote image identity is known and before the remote image is
//! opened — there is no point opening an image bootstrap must refuse
//! to mirror from.

use crate::error::Error;
use crate::io::IoContext;
use crate::state_builder::StateBuilder;

/// Confirms the remote image is currently primary. Fails the whole
/// bootstrap with `Error::RemoteNotPrimary` otherwise; a non-primary
/// remote is not a retryable condition from this stage's point of
/// view, it's a configuration fact the operator has to resolve.
pub fn get_remote_mirror_info(
    remote_ctx: &dyn IoContext,
    builder: &StateBuilder,
) -> Result<(), Error> {
    let remote_image_id = builder
        .remote_image_id()
        .ok_or_else(|| Error::NotFound("remote image id not resolved".into()))?;

    let promotion = remote_ctx.promotion_state(remote_image_id)?;
    if !promotion.is_primary() {
        return Err(Error::RemoteNotPrimary);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeIoContext;
    use mirror_types::{GlobalImageId, ImageId, MirrorMode, PromotionState};

    fn builder_with_remote(id: &str) -> StateBuilder {
        let mut builder = StateBuilder::new(MirrorMode::Journal);
        builder.set_remote_image_id(ImageId::new(id));
        builder
    }

    #[test]
    fn primary_remote_passes() {
        let mut ctx = FakeIoContext::default();
        ctx.add_remote_image(GlobalImageId::new("g1"), ImageId::new("remote-1"), MirrorMode::Journal);
        let builder = builder_with_remote("remote-1");
        get_remote_mirror_info(&ctx, &builder).unwrap();
    }

    #[test]
    fn non_primary_remote_is_rejected() {
        let mut ctx = FakeIoContext::default();
        ctx.add_remote_image(GlobalImageId::new("g1"), ImageId::new("remote-1"), MirrorMode::Journal);
        ctx.set_promotion(ImageId::new("remote-1"), PromotionState::NonPrimary);
        let builder = builder_with_remote("remote-1");

        let err = get_remote_mirror_info(&ctx, &builder).unwrap_err();
        assert!(matches!(err, Error::RemoteNotPrimary));
    }
}
