//! `PrepareRemoteImageRequest`: resolve remote identity, construct a
//! Journaler when the mode calls for one, and fetch or register this
//! cluster's peer-client record. Mirrors the stepwise `exchange`
//! style the teacher uses to drive a multi-round protocol over a
//! single connection, except every step here is one RPC instead of a
//! git-protocol round trip.

use mirror_types::{GlobalImageId, LocalMirrorUuid, MirrorMode, MirrorPeerClientMeta, ReplayState};

use crate::error::Error;
use crate::io::{IoError, IoContext, JournalError, Journaler, JournalerFactory};
use crate::state_builder::{ClientState, StateBuilder};

pub fn prepare_remote_image(
    remote_ctx: &dyn IoContext,
    journaler_factory: &dyn JournalerFactory,
    global_id: &GlobalImageId,
    local_mirror_uuid: &LocalMirrorUuid,
    commit_interval: f64,
    slot: &mut Option<StateBuilder>,
) -> Result<(), Error> {
    let remote_uuid = remote_ctx.mirror_uuid_get()?;

    if remote_uuid.is_empty() {
        if let Some(builder) = slot.as_mut() {
            builder.set_remote_mirror_uuid(remote_uuid);
        }
        return Err(Error::NotFound("remote mirror uuid not initialized".into()));
    }

    let remote_image_id = match remote_ctx.mirror_image_get_image_id(global_id) {
        Ok(id) => id,
        Err(IoError::NotFound(_)) => {
            if let Some(builder) = slot.as_mut() {
                builder.set_remote_mirror_uuid(remote_uuid);
            }
            return Err(Error::NotFound("remote image id not found".into()));
        }
        Err(e) => return Err(e.into()),
    };

    let remote_mirror_image = match remote_ctx.mirror_image_get(&remote_image_id) {
        Ok(image) => image,
        Err(e) => {
            if let Some(builder) = slot.as_mut() {
                builder.set_remote_mirror_uuid(remote_uuid);
            }
            return Err(e.into());
        }
    };

    if let Some(existing) = slot.as_ref() {
        if existing.mode() != remote_mirror_image.mode {
            if let Some(builder) = slot.as_mut() {
                builder.set_remote_mirror_uuid(remote_uuid);
            }
            return Err(Error::SplitBrain);
        }
    }

    let mut builder = slot.take().unwrap_or_else(|| StateBuilder::new(remote_mirror_image.mode));
    builder.set_remote_mirror_uuid(remote_uuid);
    builder.set_remote_image_id(remote_image_id.clone());

    let result = match remote_mirror_image.mode {
        MirrorMode::Journal => link_journal_client(
            remote_ctx,
            journaler_factory,
            &remote_image_id,
            local_mirror_uuid,
            commit_interval,
            &mut builder,
        ),
        MirrorMode::Snapshot => Err(Error::Unsupported("remote snapshot mode".into())),
    };

    *slot = Some(builder);
    result
}

fn link_journal_client(
    _remote_ctx: &dyn IoContext,
    journaler_factory: &dyn JournalerFactory,
    remote_image_id: &mirror_types::ImageId,
    local_mirror_uuid: &LocalMirrorUuid,
    commit_interval: f64,
    builder: &mut StateBuilder,
) -> Result<(), Error> {
    let journaler = journaler_factory.construct(remote_image_id, commit_interval)?;

    match fetch_or_register_client(journaler.as_ref(), local_mirror_uuid, builder) {
        Ok((state, meta)) => {
            builder.set_remote_journaler(journaler, state, meta);
            Ok(())
        }
        Err(e) => {
            // I3: a journaler allocated but not handed off must be
            // destroyed before the failure propagates.
            drop(journaler);
            Err(e)
        }
    }
}

fn fetch_or_register_client(
    journaler: &dyn Journaler,
    local_mirror_uuid: &LocalMirrorUuid,
    builder: &StateBuilder,
) -> Result<(ClientState, MirrorPeerClientMeta), Error> {
    match journaler.get_client(local_mirror_uuid) {
        Ok(record) => {
            let meta = MirrorPeerClientMeta::decode(&record.data).map_err(|_| Error::BadMessage)?;
            let state = match meta.state {
                ReplayState::Disconnected => ClientState::Disconnected,
                ReplayState::Replaying | ReplayState::Syncing => ClientState::Connected,
            };
            Ok((state, meta))
        }
        Err(JournalError::NotFound) => {
            let image_id = builder.local_image_id().cloned().unwrap_or_default();
            let meta = MirrorPeerClientMeta::new(image_id, ReplayState::Replaying);
            let data = meta.encode().map_err(|_| Error::BadMessage)?;
            journaler.register_client(local_mirror_uuid, &data)?;
            Ok((ClientState::Connected, meta))
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeIoContext, FakeJournalerFactory};
    use mirror_types::ImageId;

    #[test]
    fn empty_uuid_is_not_found_but_still_recorded() {
        let ctx = FakeIoContext::default();
        let factory = FakeJournalerFactory::default();
        let mut slot = Some(StateBuilder::new(MirrorMode::Journal));

        let err = prepare_remote_image(
            &ctx,
            &factory,
            &GlobalImageId::new("g1"),
            &LocalMirrorUuid::new("local"),
            30.0,
            &mut slot,
        )
        .unwrap_err();

        assert!(matches!(err, Error::NotFound(_)));
        assert!(slot.unwrap().remote_mirror_uuid().unwrap().is_empty());
    }

    #[test]
    fn new_client_is_registered_when_absent() {
        let mut ctx = FakeIoContext::default();
        ctx.set_remote_uuid("remote-uuid");
        ctx.add_remote_image(
            GlobalImageId::new("g1"),
            ImageId::new("remote-1"),
            MirrorMode::Journal,
        );
        let factory = FakeJournalerFactory::default();
        let mut slot = None;

        prepare_remote_image(
            &ctx,
            &factory,
            &GlobalImageId::new("g1"),
            &LocalMirrorUuid::new("local-uuid"),
            30.0,
            &mut slot,
        )
        .unwrap();

        let builder = slot.unwrap();
        assert_eq!(builder.remote_image_id().unwrap().as_str(), "remote-1");
        assert!(!builder.is_disconnected());
    }

    #[test]
    fn mode_mismatch_is_split_brain() {
        let mut ctx = FakeIoContext::default();
        ctx.set_remote_uuid("remote-uuid");
        ctx.add_remote_image(
            GlobalImageId::new("g1"),
            ImageId::new("remote-1"),
            MirrorMode::Journal,
        );
        let factory = FakeJournalerFactory::default();
        let mut slot = Some(StateBuilder::new(MirrorMode::Snapshot));

        let err = prepare_remote_image(
            &ctx,
            &factory,
            &GlobalImageId::new("g1"),
            &LocalMirrorUuid::new("local-uuid"),
            30.0,
            &mut slot,
        )
        .unwrap_err();

        assert!(matches!(err, Error::SplitBrain));
    }

    #[test]
    fn snapshot_mode_is_unsupported() {
        let mut ctx = FakeIoContext::default();
        ctx.set_remote_uuid("remote-uuid");
        ctx.add_remote_image(
            GlobalImageId::new("g1"),
            ImageId::new("remote-1"),
            MirrorMode::Snapshot,
        );
        let factory = FakeJournalerFactory::default();
        let mut slot = None;

        let err = prepare_remote_image(
            &ctx,
            &factory,
            &GlobalImageId::new("g1"),
            &LocalMirrorUuid::new("local-uuid"),
            30.0,
            &mut slot,
        )
        .unwrap_err();

        assert!(matches!(err, Error::Unsupported(_)));
    }
}
