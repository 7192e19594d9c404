//! `OpenLocalImageRequest`: opens the local replica, creating it via
//! `create_local::create_local_image` on the first `NotFound` and
//! retrying exactly once. A second failure (of any kind) propagates
//! without a further create attempt — a repeatedly-missing image after
//! creation is a transport or consistency bug, not a retryable gap.

use mirror_types::GlobalImageId;

use crate::create_local::create_local_image;
use crate::error::Error;
use crate::io::{IoContext, IoError};
use crate::state_builder::StateBuilder;

pub fn open_local_image(
    local_ctx: &dyn IoContext,
    global_id: &GlobalImageId,
    builder: &mut StateBuilder,
) -> Result<(), Error> {
    let handle = match builder.local_image_id().cloned() {
        Some(id) => match local_ctx.image_open(&id) {
            Ok(handle) => handle,
            Err(IoError::NotFound(_)) => {
                create_local_image(local_ctx, global_id, builder)?;
                reopen(local_ctx, builder)?
            }
            Err(e) => return Err(e.into()),
        },
        None => {
            create_local_image(local_ctx, global_id, builder)?;
            reopen(local_ctx, builder)?
        }
    };

    builder.set_local_image_ctx(handle);
    Ok(())
}

fn reopen(
    local_ctx: &dyn IoContext,
    builder: &StateBuilder,
) -> Result<crate::io::ImageHandle, Error> {
    let created_id = builder
        .local_image_id()
        .cloned()
        .expect("create_local_image always sets local_image_id on success");
    local_ctx.image_open(&created_id).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeIoContext;
    use mirror_types::{ImageId, MirrorImageState, MirrorMode};

    #[test]
    fn opens_an_existing_local_image() {
        let mut ctx = FakeIoContext::default();
        ctx.add_local_image(
            GlobalImageId::new("g1"),
            ImageId::new("local-1"),
            "img",
            MirrorMode::Journal,
            MirrorImageState::Enabled,
        );
        let mut builder = StateBuilder::new(MirrorMode::Journal);
        builder.set_local_image_id(ImageId::new("local-1"));

        open_local_image(&ctx, &GlobalImageId::new("g1"), &mut builder).unwrap();
        assert!(builder.local_image_ctx().is_some());
    }

    #[test]
    fn creates_and_reopens_when_missing() {
        let ctx = FakeIoContext::default();
        let mut builder = StateBuilder::new(MirrorMode::Journal);

        open_local_image(&ctx, &GlobalImageId::new("g1"), &mut builder).unwrap();

        assert_eq!(builder.local_image_id().unwrap().as_str(), "created-g1");
        assert!(builder.local_image_ctx().is_some());
    }

    #[test]
    fn local_primary_sentinel_becomes_local_is_primary() {
        let mut ctx = FakeIoContext::default();
        ctx.add_local_image(
            GlobalImageId::new("g1"),
            ImageId::new("local-1"),
            "img",
            MirrorMode::Journal,
            MirrorImageState::Enabled,
        );
        ctx.mark_primary_on_open(ImageId::new("local-1"));
        let mut builder = StateBuilder::new(MirrorMode::Journal);
        builder.set_local_image_id(ImageId::new("local-1"));

        let err = open_local_image(&ctx, &GlobalImageId::new("g1"), &mut builder).unwrap_err();
        assert!(matches!(err, Error::LocalIsPrimary));
    }
}
