//! Drives the `mirror-fetch` pipeline to completion: a worker pool,
//! cancellation tokens, and the `BootstrapRequest` coordinator that
//! sequences the nine bootstrap stages over it.

pub mod bootstrap;
pub mod cancel;
pub mod config;
pub mod worker;

pub use bootstrap::{BootstrapOutcome, BootstrapRequest};
pub use cancel::CancelToken;
pub use config::{BootstrapConfig, WorkerConfig};
pub use worker::{Pool, Queue};
