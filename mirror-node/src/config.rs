//! Plain configuration structs. No file or environment parsing lives in
//! this crate — a host binary is responsible for building one of these
//! and handing it to the worker pool and coordinator.

/// Per-bootstrap configuration, built by the host process before
/// constructing a `BootstrapRequest`.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapConfig {
    /// Seconds between journal commits, passed to the `Journaler` as
    /// `commit_interval`. Mirrors `rbd_mirror_journal_commit_age`.
    pub journal_commit_age: f64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { journal_commit_age: 5.0 }
    }
}

/// Worker pool sizing, kept separate from `BootstrapConfig` since it is
/// process-wide rather than per-bootstrap.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { capacity: 4 }
    }
}
