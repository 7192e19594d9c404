//! Data model shared by the bootstrap pipeline.
//!
//! These types carry no behavior beyond parsing, encoding, and the
//! small invariants the bootstrap core relies on to correlate a local
//! replica with its remote primary.

pub mod codec;
pub mod ids;
pub mod mirror_image;
pub mod peer_client;
pub mod promotion;

pub use ids::{GlobalImageId, ImageId, LocalMirrorUuid, RemoteMirrorUuid};
pub use mirror_image::{MirrorImage, MirrorImageState, MirrorMode};
pub use peer_client::{MirrorPeerClientMeta, ReplayState};
pub use promotion::PromotionState;
