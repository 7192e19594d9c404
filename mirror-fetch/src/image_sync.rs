//! The opaque `ImageSync` collaborator. The block-level sync algorithm
//! itself is out of scope for this core; what the coordinator needs is
//! the reference-counted get/put lifetime discipline and a cancellation
//! token that survives a cancel racing the completion callback.
//!
//! `Arc::clone` on a `dyn ImageSyncRequest` plays the role of the
//! source's `get()`; dropping the clone plays `put()` — there is
//! nothing more to implement on this side than ordinary `Arc` lifetime
//! rules give for free.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::Error;
use crate::state_builder::StateBuilder;

/// A full image-sync run, handed the builder's sync-point bookkeeping
/// and a shared cancellation flag. `cancel` must be safe to call
/// concurrently with `send` and idempotent.
pub trait ImageSyncRequest: Send + Sync {
    fn send(self: Arc<Self>, cancelled: Arc<AtomicBool>, on_finish: Box<dyn FnOnce(Result<(), Error>) + Send>);
    fn cancel(&self);
}

/// Constructs the opaque sync collaborator for a linked builder. Kept
/// separate from `StateBuilder` itself since the sync algorithm is a
/// sibling system, not bootstrap state.
pub trait ImageSyncFactory: Send + Sync {
    fn construct(&self, builder: &StateBuilder) -> Arc<dyn ImageSyncRequest>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    struct ScriptedSync {
        result: Mutex<Option<Result<(), Error>>>,
        cancelled: AtomicBool,
    }

    impl ImageSyncRequest for ScriptedSync {
        fn send(
            self: Arc<Self>,
            cancel_token: Arc<AtomicBool>,
            on_finish: Box<dyn FnOnce(Result<(), Error>) + Send>,
        ) {
            let result = if cancel_token.load(Ordering::SeqCst) || self.cancelled.load(Ordering::SeqCst) {
                Err(Error::Cancelled)
            } else {
                self.result.lock().unwrap().take().unwrap_or(Ok(()))
            };
            on_finish(result);
        }

        fn cancel(&self) {
            self.cancelled.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn cancel_before_send_yields_cancelled() {
        let sync = Arc::new(ScriptedSync {
            result: Mutex::new(Some(Ok(()))),
            cancelled: AtomicBool::new(false),
        });
        sync.cancel();

        let cancelled = Arc::new(AtomicBool::new(false));
        let observed = Arc::new(Mutex::new(None));
        let observed_handle = Arc::clone(&observed);
        Arc::clone(&sync).send(cancelled, Box::new(move |r| *observed_handle.lock().unwrap() = Some(r)));

        assert!(matches!(*observed.lock().unwrap(), Some(Err(Error::Cancelled))));
    }

    #[test]
    fn uncancelled_send_surfaces_the_scripted_result() {
        let sync = Arc::new(ScriptedSync {
            result: Mutex::new(Some(Err(Error::Transport("disk full".into())))),
            cancelled: AtomicBool::new(false),
        });

        let cancelled = Arc::new(AtomicBool::new(false));
        let observed = Arc::new(Mutex::new(None));
        let observed_handle = Arc::clone(&observed);
        Arc::clone(&sync).send(cancelled, Box::new(move |r| *observed_handle.lock().unwrap() = Some(r)));

        assert!(matches!(*observed.lock().unwrap(), Some(Err(Error::Transport(_)))));
    }
}
