//! `CreateLocalImageRequest`: materializes a new local replica from the
//! already-open remote handle. Delegated to by `open_local` exactly
//! once, on the first `-ENOENT` from `OpenLocalImage`.

use mirror_types::GlobalImageId;

use crate::error::Error;
use crate::io::IoContext;
use crate::state_builder::StateBuilder;

pub fn create_local_image(
    local_ctx: &dyn IoContext,
    global_id: &GlobalImageId,
    builder: &mut StateBuilder,
) -> Result<(), Error> {
    let remote_handle = builder
        .remote_image_ctx()
        .cloned()
        .ok_or_else(|| Error::NotFound("remote image not open".into()))?;

    let local_image_id = local_ctx.image_create(global_id, &remote_handle)?;
    builder.set_local_image_id(local_image_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ImageHandle;
    use crate::testutil::FakeIoContext;
    use mirror_types::MirrorMode;

    #[test]
    fn records_the_created_image_id() {
        let ctx = FakeIoContext::default();
        let mut builder = StateBuilder::new(MirrorMode::Journal);
        builder.set_remote_image_ctx(ImageHandle(7));

        create_local_image(&ctx, &GlobalImageId::new("g1"), &mut builder).unwrap();

        assert_eq!(builder.local_image_id().unwrap().as_str(), "created-g1");
    }

    #[test]
    fn refuses_without_an_open_remote_handle() {
        let ctx = FakeIoContext::default();
        let mut builder = StateBuilder::new(MirrorMode::Journal);

        let err = create_local_image(&ctx, &GlobalImageId::new("g1"), &mut builder).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
