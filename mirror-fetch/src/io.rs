//! Narrow interfaces to the two external collaborators named in the
//! spec: the object-store RPC client ("IoContext") and the journal
//! client library ("Journaler"). Both are invoked synchronously from
//! worker threads; the bootstrap coordinator never blocks its caller
//! because it never runs on the caller's thread in the first place.

use std::fmt;

use thiserror::Error;

use mirror_types::{
    GlobalImageId, ImageId, LocalMirrorUuid, MirrorImage, PromotionState, RemoteMirrorUuid,
};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("image is primary")]
    IsPrimary,
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("client record not found")]
    NotFound,
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// Opaque handle to an open image. Carries no behavior of its own;
/// `IoContext::image_close` is the only thing that should ever
/// consume one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle(pub u64);

impl fmt::Display for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image-handle({})", self.0)
    }
}

/// A page of user metadata entries, as returned while paging through
/// an image's metadata for `SetImageState`.
#[derive(Debug, Clone, Default)]
pub struct MetadataPage {
    pub entries: Vec<(String, Vec<u8>)>,
    /// Key to resume from on the next call, `None` once drained.
    pub next_start_after: Option<String>,
}

/// The object-store RPC client. One instance is held per cluster
/// (local and remote); every method is a single named-class-method
/// call against a named object, per the spec's external-interfaces
/// section.
pub trait IoContext: Send + Sync {
    fn dir_get_name(&self, image_id: &ImageId) -> Result<String, IoError>;
    fn mirror_image_get(&self, image_id: &ImageId) -> Result<MirrorImage, IoError>;
    fn mirror_uuid_get(&self) -> Result<RemoteMirrorUuid, IoError>;
    fn mirror_image_get_image_id(&self, global_id: &GlobalImageId) -> Result<ImageId, IoError>;

    /// Promotion state backing `GetRemoteMirrorInfo`'s primary check.
    fn promotion_state(&self, image_id: &ImageId) -> Result<PromotionState, IoError>;

    /// Journal-mode only: who currently owns the local journal's tag.
    fn get_tag_owner(&self, image_id: &ImageId) -> Result<String, IoError>;

    fn image_open(&self, image_id: &ImageId) -> Result<ImageHandle, IoError>;
    fn image_close(&self, handle: ImageHandle) -> Result<(), IoError>;

    /// Materializes a new local image. Returns the id of the created
    /// image; callers must record it on the `StateBuilder` before
    /// treating creation as successful.
    fn image_create(
        &self,
        global_id: &GlobalImageId,
        remote_image: &ImageHandle,
    ) -> Result<ImageId, IoError>;

    /// `SetImageState`'s external surface: snapshot limit, paged user
    /// metadata, and a single attribute write keyed by snapshot id.
    fn snapshot_limit(&self, image_id: &ImageId) -> Result<u64, IoError>;
    fn list_user_metadata(
        &self,
        image_id: &ImageId,
        start_after: Option<&str>,
    ) -> Result<MetadataPage, IoError>;
    fn write_image_state(
        &self,
        image_id: &ImageId,
        snapshot_id: u64,
        data: &[u8],
    ) -> Result<(), IoError>;
}

/// A fetched (or freshly registered) peer-client record.
#[derive(Debug, Clone)]
pub struct ClientRecord {
    pub data: Vec<u8>,
}

/// The remote journal client capability. Exclusively owned by the
/// `StateBuilder` on success; destroyed exactly once, either by the
/// `StateBuilder` or by whichever stage fails after allocating it.
pub trait Journaler: Send + Sync {
    fn get_client(&self, client_id: &LocalMirrorUuid) -> Result<ClientRecord, JournalError>;
    fn register_client(
        &self,
        client_id: &LocalMirrorUuid,
        data: &[u8],
    ) -> Result<(), JournalError>;
}

/// Factory for constructing a `Journaler` against a specific remote
/// image, configured with the commit interval read from
/// `rbd_mirror_journal_commit_age`.
pub trait JournalerFactory: Send + Sync {
    fn construct(
        &self,
        image_id: &ImageId,
        commit_interval: f64,
    ) -> Result<Box<dyn Journaler>, IoError>;
}
