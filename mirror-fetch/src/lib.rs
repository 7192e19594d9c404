//! The bootstrap request pipeline: the stages that establish a
//! cross-cluster mirror relationship for a single image, from resolving
//! identity on both clusters through to a prepared [`StateBuilder`]
//! ready for incremental replay.
//!
//! Each stage here is a plain function rather than a self-owning
//! callback object — `mirror-node`'s `BootstrapRequest` coordinator owns
//! the sequencing, cancellation, and worker-queue dispatch; this crate
//! only has to get each individual stage's semantics right against the
//! `IoContext`/`Journaler` interfaces.

pub mod close_remote;
pub mod create_local;
pub mod error;
pub mod get_mirror_info;
pub mod image_sync;
pub mod io;
pub mod open_local;
pub mod open_remote;
pub mod prepare_local;
pub mod prepare_remote;
pub mod prepare_replay;
pub mod set_image_state;
pub mod state_builder;

#[cfg(any(test, feature = "test-util"))]
pub mod testutil;

pub use error::Error;
pub use image_sync::{ImageSyncFactory, ImageSyncRequest};
pub use io::{
    ClientRecord, ImageHandle, IoContext, IoError, JournalError, Journaler, JournalerFactory,
    MetadataPage,
};
pub use prepare_replay::PrepareReplayOutcome;
pub use state_builder::{ClientState, StateBuilder, SyncPointHandler};
