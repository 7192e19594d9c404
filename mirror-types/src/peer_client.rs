use serde::{Deserialize, Serialize};

use crate::codec;
use crate::ids::ImageId;

/// The three states a remote journal's client record can be in. Only
/// `Disconnected` is a legitimate non-error state the bootstrap has to
/// observe and carry forward — see `PrepareReplay`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayState {
    Replaying,
    Syncing,
    Disconnected,
}

/// Durable registration stored on the remote journal under the local
/// mirror uuid. Required before any replay may consume the remote
/// journal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorPeerClientMeta {
    pub image_id: ImageId,
    pub state: ReplayState,
}

impl MirrorPeerClientMeta {
    pub fn new(image_id: ImageId, state: ReplayState) -> Self {
        Self { image_id, state }
    }

    pub fn encode(&self) -> Result<Vec<u8>, codec::Error> {
        codec::encode(self)
    }

    pub fn decode(framed: &[u8]) -> Result<Self, codec::Error> {
        codec::decode(framed)
    }
}

// `ImageId` wraps a plain `String`, so deriving `Serialize`/`Deserialize`
// on it directly would require it to already implement those traits.
// We encode it as a string instead of leaking the newtype's internals.
impl Serialize for ImageId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImageId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(ImageId::new)
    }
}
