//! `PrepareReplayRequest`: the mode-specific handshake that decides
//! whether replay can resume as-is, needs a full resync, or needs a
//! full image-sync before it can. Runs after both images are open and
//! before the coordinator decides whether to call `ImageSync`.

use mirror_types::ReplayState;

use crate::error::Error;
use crate::state_builder::StateBuilder;

/// Outcome of a `PrepareReplay` run: whether an operator-requested
/// resync should be surfaced to the caller, and whether a full
/// `ImageSync` must run before replay can begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareReplayOutcome {
    pub resync: bool,
    pub syncing: bool,
}

pub fn prepare_replay(builder: &StateBuilder) -> Result<PrepareReplayOutcome, Error> {
    match builder.mode() {
        mirror_types::MirrorMode::Journal => {
            // A disconnected peer-client record means the remote journal
            // no longer has the history this replica needs; nothing short
            // of a full resync gets it caught up.
            if builder.is_disconnected() {
                return Ok(PrepareReplayOutcome {
                    resync: true,
                    syncing: false,
                });
            }
            let syncing = builder.remote_replay_state() == Some(ReplayState::Syncing);
            Ok(PrepareReplayOutcome {
                resync: false,
                syncing,
            })
        }
        mirror_types::MirrorMode::Snapshot => Err(Error::Unsupported("snapshot prepare-replay".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirror_types::{ImageId, MirrorMode, MirrorPeerClientMeta};

    fn journal_builder_with_state(state: ReplayState) -> StateBuilder {
        let mut builder = StateBuilder::new(MirrorMode::Journal);
        let meta = MirrorPeerClientMeta::new(ImageId::new("local-1"), state);
        builder.set_remote_journaler(
            Box::new(NoopJournaler),
            crate::state_builder::ClientState::Connected,
            meta,
        );
        builder
    }

    struct NoopJournaler;
    impl crate::io::Journaler for NoopJournaler {
        fn get_client(
            &self,
            _client_id: &mirror_types::LocalMirrorUuid,
        ) -> Result<crate::io::ClientRecord, crate::io::JournalError> {
            unimplemented!("not exercised by these tests")
        }
        fn register_client(
            &self,
            _client_id: &mirror_types::LocalMirrorUuid,
            _data: &[u8],
        ) -> Result<(), crate::io::JournalError> {
            unimplemented!("not exercised by these tests")
        }
    }

    #[test]
    fn replaying_needs_neither_resync_nor_sync() {
        let builder = journal_builder_with_state(ReplayState::Replaying);
        let outcome = prepare_replay(&builder).unwrap();
        assert_eq!(outcome, PrepareReplayOutcome { resync: false, syncing: false });
    }

    #[test]
    fn syncing_state_requests_image_sync() {
        let builder = journal_builder_with_state(ReplayState::Syncing);
        let outcome = prepare_replay(&builder).unwrap();
        assert!(outcome.syncing);
        assert!(!outcome.resync);
    }

    #[test]
    fn disconnected_builder_requests_resync() {
        let mut builder = StateBuilder::new(MirrorMode::Journal);
        let meta = MirrorPeerClientMeta::new(ImageId::new("local-1"), ReplayState::Replaying);
        builder.set_remote_journaler(Box::new(NoopJournaler), crate::state_builder::ClientState::Disconnected, meta);

        let outcome = prepare_replay(&builder).unwrap();
        assert!(outcome.resync);
        assert!(!outcome.syncing);
    }

    #[test]
    fn snapshot_mode_is_unsupported() {
        let builder = StateBuilder::new(MirrorMode::Snapshot);
        let err = prepare_replay(&builder).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }
}
