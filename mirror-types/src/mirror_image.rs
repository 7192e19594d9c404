use crate::ids::GlobalImageId;

/// Journal: every write is journaled and replayed. Snapshot: periodic
/// snapshot diffs are replicated. Fixed for the lifetime of a
/// `StateBuilder` — see invariant I1 on the bootstrap state builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorMode {
    Journal,
    Snapshot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MirrorImageState {
    Enabled,
    Disabled,
    Creating,
    Disabling,
}

/// Per-cluster mirroring record fetched via `mirror_image_get`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MirrorImage {
    pub mode: MirrorMode,
    pub state: MirrorImageState,
    pub global_image_id: GlobalImageId,
}
